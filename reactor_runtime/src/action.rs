//! Logical and physical actions: the runtime's mechanism for scheduling
//! future events, and timers, which are actions the scheduler re-arms itself.

use std::any::Any;
use std::fmt::{self, Debug, Display};

use downcast_rs::{impl_downcast, Downcast};

use reactor_core::{ActionKey, Tag, TimeValue};

use crate::error::RuntimeError;
use crate::port::PortData;

/// Whether an action's tag is computed from logical time (deterministic,
/// reproducible) or sampled from the wall clock at the moment it is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Logical,
    Physical,
}

pub trait BaseAction: Debug + Display + Downcast + Send + Sync {
    fn name(&self) -> &str;
    fn key(&self) -> ActionKey;
    fn min_delay(&self) -> TimeValue;
    fn origin(&self) -> Origin;
    fn type_name(&self) -> &'static str;

    /// Whether this action holds a value scheduled for exactly `tag`.
    fn is_present(&self, tag: Tag) -> bool;

    /// Drops any pending value. Called by the scheduler once a tag's
    /// reactions have all finished running.
    fn clear(&mut self);

    /// Downcasts `value` to this action's concrete type and stamps it for
    /// `tag`. Used to inject a physical action scheduled from outside the
    /// scheduler's own thread, where no `ReactionCtx` is available.
    fn set_boxed_value(&mut self, tag: Tag, value: Box<dyn Any + Send>) -> Result<(), RuntimeError>;
}
impl_downcast!(BaseAction);

pub struct Action<T: PortData = ()> {
    name: String,
    key: ActionKey,
    min_delay: TimeValue,
    origin: Origin,
    value: Option<(Tag, T)>,
}

impl<T: PortData> Action<T> {
    pub fn new(name: impl Into<String>, key: ActionKey, min_delay: TimeValue, origin: Origin) -> Self {
        Self {
            name: name.into(),
            key,
            min_delay,
            origin,
            value: None,
        }
    }

    pub fn get(&self, tag: Tag) -> Option<&T> {
        self.value.as_ref().filter(|(t, _)| *t == tag).map(|(_, v)| v)
    }

    pub(crate) fn set(&mut self, tag: Tag, value: T) {
        self.value = Some((tag, value));
    }

    pub fn boxed(self) -> Box<dyn BaseAction> {
        Box::new(self)
    }
}

impl<T: PortData> Debug for Action<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("origin", &self.origin)
            .field("min_delay", &self.min_delay)
            .finish()
    }
}

impl<T: PortData> Display for Action<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl<T: PortData> BaseAction for Action<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn key(&self) -> ActionKey {
        self.key
    }

    fn min_delay(&self) -> TimeValue {
        self.min_delay
    }

    fn origin(&self) -> Origin {
        self.origin
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn is_present(&self, tag: Tag) -> bool {
        self.value.as_ref().is_some_and(|(t, _)| *t == tag)
    }

    fn clear(&mut self) {
        self.value = None;
    }

    fn set_boxed_value(&mut self, tag: Tag, value: Box<dyn Any + Send>) -> Result<(), RuntimeError> {
        let value = value.downcast::<T>().map_err(|_| RuntimeError::TypeMismatch {
            what: format!("action {}", self.name),
            expected: self.type_name(),
            found: "<erased>",
        })?;
        self.value = Some((tag, *value));
        Ok(())
    }
}

/// A cyclic or one-shot action driven by wall-clock offsets rather than an
/// explicit `schedule` call. Rearmed by the scheduler after each firing.
#[derive(Debug, Clone, Copy)]
pub struct TimerSpec {
    pub offset: TimeValue,
    pub period: TimeValue,
}

impl TimerSpec {
    /// `period == 0` means the timer fires exactly once, at `offset`.
    pub fn is_periodic(&self) -> bool {
        !self.period.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_only_at_scheduled_tag() {
        let mut action = Action::<i32>::new("a", ActionKey::from(0), TimeValue::ZERO, Origin::Logical);
        let tag = Tag::new(TimeValue::from_seconds(1), 0);
        action.set(tag, 42);
        assert!(action.is_present(tag));
        assert!(!action.is_present(Tag::new(TimeValue::from_seconds(2), 0)));
        assert_eq!(action.get(tag), Some(&42));
    }

    #[test]
    fn test_clear_removes_value() {
        let mut action = Action::<i32>::new("a", ActionKey::from(0), TimeValue::ZERO, Origin::Logical);
        let tag = Tag::ZERO;
        action.set(tag, 1);
        action.clear();
        assert!(!action.is_present(tag));
    }

    #[test]
    fn test_boxed_value_roundtrip() {
        let mut action = Action::<i32>::new("a", ActionKey::from(0), TimeValue::ZERO, Origin::Physical);
        let tag = Tag::new(TimeValue::from_seconds(3), 0);
        action.set_boxed_value(tag, Box::new(9)).unwrap();
        assert_eq!(action.get(tag), Some(&9));
    }

    #[test]
    fn test_boxed_value_type_mismatch() {
        let mut action = Action::<i32>::new("a", ActionKey::from(0), TimeValue::ZERO, Origin::Physical);
        let tag = Tag::new(TimeValue::from_seconds(3), 0);
        assert!(action.set_boxed_value(tag, Box::new("wrong type")).is_err());
    }

    #[test]
    fn test_timer_spec_periodic() {
        let single = TimerSpec { offset: TimeValue::ZERO, period: TimeValue::ZERO };
        assert!(!single.is_periodic());
        let repeating = TimerSpec { offset: TimeValue::ZERO, period: TimeValue::from_seconds(1) };
        assert!(repeating.is_periodic());
    }
}
