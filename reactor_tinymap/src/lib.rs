//! Slot-map style containers keyed by small, typed integer keys.
//!
//! Keys are never chosen by the caller; they are handed out by the map
//! itself at insertion time and carry no generation/version tag, so callers
//! must not keep a key alive past the removal of its slot in a `TinyMap`
//! (the containers here never shrink). This trade-off keeps indexing O(1)
//! and the keys `Copy`, which is what the scheduler hot path wants.

#![doc = document_features::document_features!()]

mod map;
mod secondary_map;
mod secondary_set;

pub use map::{Iter, TinyMap};
pub use secondary_map::{IntoIter as SecondaryIntoIter, Iter as SecondaryIter, TinySecondaryMap};
pub use secondary_set::{Iter as SecondarySetIter, TinySecondarySet};

/// A key into a [`TinyMap`] or [`TinySecondaryMap`].
pub trait Key: From<usize> + Copy + Eq + Ord {
    fn index(&self) -> usize;
}

/// Declares a new zero-cost key type backed by a `usize`.
///
/// # Examples
/// ```
/// reactor_tinymap::key_type!(pub MyKey);
/// let k = MyKey::from(3);
/// assert_eq!(k.index(), 3);
/// ```
#[macro_export]
macro_rules! key_type {
    ($vis:vis $name:ident) => {
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        $vis struct $name(pub usize);

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::std::convert::From<usize> for $name {
            fn from(idx: usize) -> Self {
                $name(idx)
            }
        }

        impl $crate::Key for $name {
            fn index(&self) -> usize {
                self.0
            }
        }
    };
}

key_type!(pub DefaultKey);
