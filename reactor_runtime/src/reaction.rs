//! A reaction: a body closure plus the declared set of ports/actions it may
//! touch, used both to build the precedence graph and to police access at
//! run time.

use std::fmt;

use reactor_core::{ActionKey, PortKey, ReactorKey, TimeValue};

use crate::context::ReactionCtx;

pub trait ReactionFn: for<'a> Fn(&mut ReactionCtx<'a>) + Send + Sync {}
impl<F: for<'a> Fn(&mut ReactionCtx<'a>) + Send + Sync> ReactionFn for F {}

/// A deadline attached to a reaction: if more than `duration` of physical
/// time has elapsed since the reaction's tag became current, `handler` runs
/// in place of the reaction's own body.
pub struct Deadline {
    pub duration: TimeValue,
    pub handler: Box<dyn ReactionFn>,
}

impl fmt::Debug for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deadline").field("duration", &self.duration).finish()
    }
}

pub struct Reaction {
    pub(crate) name: String,
    pub(crate) reactor_key: ReactorKey,
    pub(crate) priority: i64,
    pub(crate) trigger_ports: Vec<PortKey>,
    pub(crate) trigger_actions: Vec<ActionKey>,
    pub(crate) triggers_startup: bool,
    pub(crate) triggers_shutdown: bool,
    pub(crate) source_ports: Vec<PortKey>,
    pub(crate) effect_ports: Vec<PortKey>,
    pub(crate) effect_actions: Vec<ActionKey>,
    pub(crate) deadline: Option<Deadline>,
    pub(crate) is_mutation: bool,
    pub(crate) body: Box<dyn ReactionFn>,
}

impl fmt::Debug for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reaction")
            .field("name", &self.name)
            .field("reactor_key", &self.reactor_key)
            .field("priority", &self.priority)
            .field("is_mutation", &self.is_mutation)
            .finish()
    }
}

impl Reaction {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reactor_key(&self) -> ReactorKey {
        self.reactor_key
    }

    pub fn priority(&self) -> i64 {
        self.priority
    }

    /// All ports read, whether as a declared trigger or a plain source.
    pub fn all_read_ports(&self) -> impl Iterator<Item = PortKey> + '_ {
        self.trigger_ports.iter().copied().chain(self.source_ports.iter().copied())
    }

    pub fn effect_ports(&self) -> &[PortKey] {
        &self.effect_ports
    }

    pub fn trigger_actions(&self) -> &[ActionKey] {
        &self.trigger_actions
    }

    pub fn effect_actions(&self) -> &[ActionKey] {
        &self.effect_actions
    }

    pub fn triggers_startup(&self) -> bool {
        self.triggers_startup
    }

    pub fn triggers_shutdown(&self) -> bool {
        self.triggers_shutdown
    }

    pub fn is_mutation(&self) -> bool {
        self.is_mutation
    }

    pub fn deadline(&self) -> Option<&Deadline> {
        self.deadline.as_ref()
    }
}

/// Builder-facing constructor, kept separate from the internal fields above
/// so the facade crate never has to name private types.
pub struct ReactionSpec {
    pub name: String,
    pub reactor_key: ReactorKey,
    pub trigger_ports: Vec<PortKey>,
    pub trigger_actions: Vec<ActionKey>,
    pub triggers_startup: bool,
    pub triggers_shutdown: bool,
    pub source_ports: Vec<PortKey>,
    pub effect_ports: Vec<PortKey>,
    pub effect_actions: Vec<ActionKey>,
    pub deadline: Option<Deadline>,
    pub is_mutation: bool,
    pub body: Box<dyn ReactionFn>,
}

impl ReactionSpec {
    pub(crate) fn into_reaction(self) -> Reaction {
        Reaction {
            name: self.name,
            reactor_key: self.reactor_key,
            priority: 0,
            trigger_ports: self.trigger_ports,
            trigger_actions: self.trigger_actions,
            triggers_startup: self.triggers_startup,
            triggers_shutdown: self.triggers_shutdown,
            source_ports: self.source_ports,
            effect_ports: self.effect_ports,
            effect_actions: self.effect_actions,
            deadline: self.deadline,
            is_mutation: self.is_mutation,
            body: self.body,
        }
    }
}
