//! Time and key types shared by the reactor runtime and its builder facade.

pub mod keys;
pub mod time;

pub use keys::{ActionKey, PortKey, ReactionKey, ReactorKey};
pub use time::{Tag, TimeError, TimeValue};
