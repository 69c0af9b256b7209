//! Integer-valued durations and superdense logical instants.
//!
//! Durations are represented as non-negative `(seconds, nanoseconds)` pairs
//! rather than a floating-point seconds count, so that arithmetic over runs
//! spanning years never drifts. See `TimeValue`/`Tag`.

use std::fmt;

use thiserror::Error;

const NANOS_PER_SEC: u32 = 1_000_000_000;

/// A safe upper bound on the number of seconds representable by a `TimeValue`.
/// Chosen well below `u64::MAX` so that two arbitrary in-range values can
/// always be added without wrapping the addition itself.
pub const MAX_SECONDS: u64 = u64::MAX / 2;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TimeError {
    #[error("time arithmetic overflowed past {MAX_SECONDS} seconds")]
    Overflow,
    #[error("subtraction would produce a negative duration")]
    NegativeDuration,
}

/// A non-negative integer-valued duration, `0 <= nanoseconds < 1_000_000_000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeValue {
    pub seconds: u64,
    pub nanoseconds: u32,
}

impl TimeValue {
    pub const ZERO: TimeValue = TimeValue {
        seconds: 0,
        nanoseconds: 0,
    };

    pub const MAX: TimeValue = TimeValue {
        seconds: MAX_SECONDS,
        nanoseconds: NANOS_PER_SEC - 1,
    };

    /// Constructs a `TimeValue`, normalizing a nanoseconds component `>= 1s`.
    pub fn new(seconds: u64, nanoseconds: u32) -> Self {
        Self {
            seconds: seconds + (nanoseconds / NANOS_PER_SEC) as u64,
            nanoseconds: nanoseconds % NANOS_PER_SEC,
        }
    }

    pub const fn from_seconds(seconds: u64) -> Self {
        Self {
            seconds,
            nanoseconds: 0,
        }
    }

    pub const fn from_millis(millis: u64) -> Self {
        Self {
            seconds: millis / 1_000,
            nanoseconds: ((millis % 1_000) * 1_000_000) as u32,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.seconds == 0 && self.nanoseconds == 0
    }

    pub fn add(self, other: TimeValue) -> Result<TimeValue, TimeError> {
        let mut nanoseconds = self.nanoseconds + other.nanoseconds;
        let mut carry = 0u64;
        if nanoseconds >= NANOS_PER_SEC {
            nanoseconds -= NANOS_PER_SEC;
            carry = 1;
        }
        let seconds = self
            .seconds
            .checked_add(other.seconds)
            .and_then(|s| s.checked_add(carry))
            .ok_or(TimeError::Overflow)?;
        if seconds > MAX_SECONDS {
            return Err(TimeError::Overflow);
        }
        Ok(TimeValue {
            seconds,
            nanoseconds,
        })
    }

    pub fn subtract(self, other: TimeValue) -> Result<TimeValue, TimeError> {
        if other > self {
            return Err(TimeError::NegativeDuration);
        }
        let (seconds, nanoseconds) = if self.nanoseconds >= other.nanoseconds {
            (self.seconds - other.seconds, self.nanoseconds - other.nanoseconds)
        } else {
            (
                self.seconds - other.seconds - 1,
                self.nanoseconds + NANOS_PER_SEC - other.nanoseconds,
            )
        };
        Ok(TimeValue {
            seconds,
            nanoseconds,
        })
    }
}

impl Default for TimeValue {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}s", self.seconds, self.nanoseconds)
    }
}

/// A superdense logical instant `(time, microstep)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tag {
    pub time: TimeValue,
    pub microstep: u32,
}

impl Tag {
    pub const ZERO: Tag = Tag {
        time: TimeValue::ZERO,
        microstep: 0,
    };

    /// A tag that never occurs within any finite run; used as a sentinel for
    /// "no pending shutdown requested".
    pub const NEVER: Tag = Tag {
        time: TimeValue::MAX,
        microstep: u32::MAX,
    };

    pub fn new(time: TimeValue, microstep: u32) -> Self {
        Self { time, microstep }
    }

    /// `tag.advance(d)`: `(t+d, 0)` for `d > 0`, else `(t, m+1)`.
    pub fn advance(self, delay: TimeValue) -> Result<Tag, TimeError> {
        if delay.is_zero() {
            Ok(Tag {
                time: self.time,
                microstep: self
                    .microstep
                    .checked_add(1)
                    .ok_or(TimeError::Overflow)?,
            })
        } else {
            Ok(Tag {
                time: self.time.add(delay)?,
                microstep: 0,
            })
        }
    }

    pub fn is_earlier(&self, other: &Tag) -> bool {
        self < other
    }

    pub fn is_simultaneous(&self, other: &Tag) -> bool {
        self == other
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.time, self.microstep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_carries_nanoseconds() {
        let a = TimeValue::new(1, 600_000_000);
        let b = TimeValue::new(1, 500_000_000);
        let sum = a.add(b).unwrap();
        assert_eq!(sum, TimeValue::new(3, 100_000_000));
    }

    #[test]
    fn test_add_overflow() {
        let a = TimeValue::from_seconds(MAX_SECONDS);
        let b = TimeValue::from_seconds(1);
        assert_eq!(a.add(b), Err(TimeError::Overflow));
    }

    #[test]
    fn test_subtract_borrows_seconds() {
        let a = TimeValue::new(3, 100_000_000);
        let b = TimeValue::new(1, 600_000_000);
        assert_eq!(a.subtract(b).unwrap(), TimeValue::new(1, 500_000_000));
    }

    #[test]
    fn test_subtract_negative_errors() {
        let a = TimeValue::from_seconds(1);
        let b = TimeValue::from_seconds(2);
        assert_eq!(a.subtract(b), Err(TimeError::NegativeDuration));
    }

    #[test]
    fn test_add_then_subtract_roundtrip() {
        let a = TimeValue::new(5, 250_000_000);
        let b = TimeValue::new(2, 900_000_000);
        assert_eq!(a.add(b).unwrap().subtract(b).unwrap(), a);
    }

    #[test]
    fn test_is_zero() {
        assert!(TimeValue::ZERO.is_zero());
        assert!(!TimeValue::from_seconds(1).is_zero());
    }

    #[test]
    fn test_tag_advance_zero_bumps_microstep() {
        let tag = Tag::new(TimeValue::from_seconds(5), 2);
        assert_eq!(tag.advance(TimeValue::ZERO).unwrap(), Tag::new(TimeValue::from_seconds(5), 3));
    }

    #[test]
    fn test_tag_advance_positive_zeros_microstep() {
        let tag = Tag::new(TimeValue::from_seconds(5), 2);
        let advanced = tag.advance(TimeValue::from_seconds(1)).unwrap();
        assert_eq!(advanced, Tag::new(TimeValue::from_seconds(6), 0));
    }

    #[test]
    fn test_tag_total_order_is_lexicographic() {
        let a = Tag::new(TimeValue::from_seconds(1), 5);
        let b = Tag::new(TimeValue::from_seconds(2), 0);
        assert!(a.is_earlier(&b));

        let c = Tag::new(TimeValue::from_seconds(1), 4);
        assert!(c.is_earlier(&a));
        assert!(a.is_simultaneous(&a));
    }
}
