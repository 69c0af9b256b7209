//! A reactor instance: a name, a position in the containment hierarchy, an
//! opaque bundle of private state, and the ports/actions/reactions it owns.

use downcast_rs::{impl_downcast, Downcast};

use reactor_core::{ActionKey, PortKey, ReactionKey, ReactorKey};

/// Marker trait for a reactor's private state struct. Reactions receive
/// `&mut dyn ReactorState` and downcast it back to the concrete type they
/// were declared against.
pub trait ReactorState: Downcast + Send {}
impl_downcast!(ReactorState);
impl<T: Downcast + Send> ReactorState for T {}

/// The empty state used by reactors that carry no fields of their own.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyState;

#[derive(Debug)]
pub(crate) struct ReactorMeta {
    pub name: String,
    pub parent: Option<ReactorKey>,
    pub state: Box<dyn ReactorState>,
    pub ports: Vec<PortKey>,
    pub actions: Vec<ActionKey>,
    pub children: Vec<ReactorKey>,
    pub reactions: Vec<ReactionKey>,
}

impl std::fmt::Debug for dyn ReactorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<reactor state>")
    }
}

impl ReactorMeta {
    pub fn new(name: impl Into<String>, parent: Option<ReactorKey>, state: Box<dyn ReactorState>) -> Self {
        Self {
            name: name.into(),
            parent,
            state,
            ports: Vec::new(),
            actions: Vec::new(),
            children: Vec::new(),
            reactions: Vec::new(),
        }
    }
}
