//! Error types surfaced by the runtime's construction and execution APIs.

use reactor_core::{ActionKey, PortKey, ReactionKey, ReactorKey, TimeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("illegal connection: {0}")]
    IllegalConnection(String),

    #[error("port {port:?} already has a writer reaction ({existing:?})")]
    MultipleWriters { port: PortKey, existing: ReactionKey },

    #[error("connection would introduce a cycle in the precedence graph")]
    CycleIntroduced,

    #[error("reaction touched undeclared {kind} {key}")]
    UndeclaredAccess { kind: &'static str, key: String },

    #[error("type mismatch accessing {what}: expected {expected}, found {found}")]
    TypeMismatch {
        what: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("port key not found: {0:?}")]
    PortKeyNotFound(PortKey),

    #[error("action key not found: {0:?}")]
    ActionKeyNotFound(ActionKey),

    #[error("reactor key not found: {0:?}")]
    ReactorKeyNotFound(ReactorKey),

    #[error("reaction key not found: {0:?}")]
    ReactionKeyNotFound(ReactionKey),

    #[error("reaction {0:?} failed: {1}")]
    ReactionFailure(ReactionKey, String),

    #[error(transparent)]
    Time(#[from] TimeError),
}
