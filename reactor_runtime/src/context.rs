//! The handle a reaction body sees: declared ports and actions, the current
//! tag, and the small set of side effects a reaction is allowed to request
//! (write a port, schedule an action, request a shutdown).

use reactor_core::{ActionKey, PortKey, Tag, TimeValue};

use crate::action::{Action, BaseAction, Origin};
use crate::error::RuntimeError;
use crate::port::{BasePort, Port, PortData};
use crate::reactor::ReactorState;

/// A topology edit requested by a mutation reaction. Applied by the
/// environment once the reaction's borrows are released, the same way a
/// written port or scheduled action is.
#[derive(Debug, Clone, Copy)]
pub(crate) enum MutationRequest {
    Connect(PortKey, PortKey),
    Disconnect(PortKey, PortKey),
}

fn undeclared(kind: &'static str, key: impl std::fmt::Debug) -> RuntimeError {
    RuntimeError::UndeclaredAccess {
        kind,
        key: format!("{key:?}"),
    }
}

/// Passed to a reaction body. Only ports/actions the reaction declared as
/// triggers, sources, or effects are reachable through it; the scheduler
/// assembles this set with a single disjoint borrow of the shared arenas
/// before invoking the reaction and discards it afterward.
pub struct ReactionCtx<'a> {
    pub(crate) start_time: TimeValue,
    pub(crate) tag: Tag,
    pub(crate) physical_now: TimeValue,
    pub(crate) declared_read_ports: &'a [PortKey],
    pub(crate) declared_effect_ports: &'a [PortKey],
    pub(crate) declared_trigger_actions: &'a [ActionKey],
    pub(crate) declared_effect_actions: &'a [ActionKey],
    pub(crate) ports: Vec<(PortKey, &'a mut dyn BasePort)>,
    pub(crate) actions: Vec<(ActionKey, &'a mut dyn BaseAction)>,
    pub(crate) state: &'a mut dyn ReactorState,
    pub(crate) is_mutation: bool,
    pub(crate) written_ports: Vec<PortKey>,
    pub(crate) scheduled: Vec<(ActionKey, Tag)>,
    pub(crate) stop_requested: Option<Tag>,
    pub(crate) failed: Option<String>,
    pub(crate) mutation_requests: Vec<MutationRequest>,
}

impl<'a> ReactionCtx<'a> {
    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn get_logical_time(&self) -> TimeValue {
        self.tag.time
    }

    pub fn get_physical_time(&self) -> TimeValue {
        self.physical_now.max(self.tag.time)
    }

    pub fn get_elapsed_logical_time(&self) -> Result<TimeValue, RuntimeError> {
        Ok(self.tag.time.subtract(self.start_time)?)
    }

    pub fn state<T: ReactorState + 'static>(&self) -> Option<&T> {
        self.state.downcast_ref::<T>()
    }

    pub fn state_mut<T: ReactorState + 'static>(&mut self) -> Option<&mut T> {
        self.state.downcast_mut::<T>()
    }

    pub fn get<T: PortData>(&self, key: PortKey) -> Result<Option<T>, RuntimeError> {
        if !self.declared_read_ports.contains(&key) && !self.declared_effect_ports.contains(&key) {
            return Err(undeclared("port", key));
        }
        let (_, port) = self
            .ports
            .iter()
            .find(|(k, _)| *k == key)
            .ok_or_else(|| undeclared("port", key))?;
        let port = port
            .downcast_ref::<Port<T>>()
            .ok_or_else(|| RuntimeError::TypeMismatch {
                what: format!("port {key:?}"),
                expected: std::any::type_name::<T>(),
                found: port.type_name(),
            })?;
        Ok(port.get().clone())
    }

    pub fn is_present(&self, key: PortKey) -> Result<bool, RuntimeError> {
        if !self.declared_read_ports.contains(&key) && !self.declared_effect_ports.contains(&key) {
            return Err(undeclared("port", key));
        }
        let (_, port) = self
            .ports
            .iter()
            .find(|(k, _)| *k == key)
            .ok_or_else(|| undeclared("port", key))?;
        Ok(port.is_set())
    }

    pub fn set<T: PortData>(&mut self, key: PortKey, value: T) -> Result<(), RuntimeError> {
        if !self.declared_effect_ports.contains(&key) {
            return Err(undeclared("port", key));
        }
        let (_, port) = self
            .ports
            .iter_mut()
            .find(|(k, _)| *k == key)
            .ok_or_else(|| undeclared("port", key))?;
        let type_name = port.type_name();
        let port = port
            .downcast_mut::<Port<T>>()
            .ok_or_else(|| RuntimeError::TypeMismatch {
                what: format!("port {key:?}"),
                expected: std::any::type_name::<T>(),
                found: type_name,
            })?;
        *port.get_mut() = Some(value);
        self.written_ports.push(key);
        Ok(())
    }

    pub fn get_action<T: PortData>(&self, key: ActionKey) -> Result<Option<T>, RuntimeError> {
        if !self.declared_trigger_actions.contains(&key) && !self.declared_effect_actions.contains(&key) {
            return Err(undeclared("action", key));
        }
        let (_, action) = self
            .actions
            .iter()
            .find(|(k, _)| *k == key)
            .ok_or_else(|| undeclared("action", key))?;
        let action = action
            .downcast_ref::<Action<T>>()
            .ok_or_else(|| RuntimeError::TypeMismatch {
                what: format!("action {key:?}"),
                expected: std::any::type_name::<T>(),
                found: action.type_name(),
            })?;
        Ok(action.get(self.tag).cloned())
    }

    /// Schedules `value` to arrive on action `key` after `additional_delay`
    /// on top of the action's own minimum delay. Logical actions compute a
    /// deterministic future tag from the current one; physical actions
    /// stamp the tag from the wall clock instead.
    pub fn schedule<T: PortData>(
        &mut self,
        key: ActionKey,
        additional_delay: TimeValue,
        value: T,
    ) -> Result<Tag, RuntimeError> {
        if !self.declared_effect_actions.contains(&key) {
            return Err(undeclared("action", key));
        }
        let (_, action) = self
            .actions
            .iter_mut()
            .find(|(k, _)| *k == key)
            .ok_or_else(|| undeclared("action", key))?;
        let type_name = action.type_name();
        let origin = action.origin();
        let min_delay = action.min_delay();
        let action = action
            .downcast_mut::<Action<T>>()
            .ok_or_else(|| RuntimeError::TypeMismatch {
                what: format!("action {key:?}"),
                expected: std::any::type_name::<T>(),
                found: type_name,
            })?;

        let new_tag = match origin {
            Origin::Logical => self.tag.advance(min_delay.add(additional_delay)?)?,
            Origin::Physical => {
                let base = self.physical_now.max(self.tag.time);
                Tag::new(base.add(min_delay)?.add(additional_delay)?, 0)
            }
        };
        action.set(new_tag, value);
        self.scheduled.push((key, new_tag));
        Ok(new_tag)
    }

    /// Requests a new connection from `source` to `sink`, applied by the
    /// environment after this reaction returns. Only reactions declared as
    /// mutations may call this; the request is validated and may still be
    /// rejected (type mismatch, disallowed pattern, or an introduced cycle)
    /// once the environment actually applies it.
    pub fn connect(&mut self, source: PortKey, sink: PortKey) -> Result<(), RuntimeError> {
        if !self.is_mutation {
            return Err(RuntimeError::UndeclaredAccess {
                kind: "mutation",
                key: "connect requires a mutation reaction".to_string(),
            });
        }
        self.mutation_requests.push(MutationRequest::Connect(source, sink));
        Ok(())
    }

    /// Requests that the connection from `source` to `sink` be removed,
    /// applied by the environment after this reaction returns.
    pub fn disconnect(&mut self, source: PortKey, sink: PortKey) -> Result<(), RuntimeError> {
        if !self.is_mutation {
            return Err(RuntimeError::UndeclaredAccess {
                kind: "mutation",
                key: "disconnect requires a mutation reaction".to_string(),
            });
        }
        self.mutation_requests.push(MutationRequest::Disconnect(source, sink));
        Ok(())
    }

    pub fn request_stop(&mut self) {
        if self.stop_requested.is_none() {
            self.stop_requested = Some(self.tag);
        }
    }

    pub fn request_error_stop(&mut self, message: impl Into<String>) {
        self.failed = Some(message.into());
        self.request_stop();
    }

    pub(crate) fn into_outcome(self) -> ReactionOutcome {
        ReactionOutcome {
            written_ports: self.written_ports,
            scheduled: self.scheduled,
            stop_requested: self.stop_requested,
            failed: self.failed,
            mutation_requests: self.mutation_requests,
        }
    }
}

/// What a reaction invocation produced, extracted after its borrowed ports
/// and actions have been released.
pub struct ReactionOutcome {
    pub written_ports: Vec<PortKey>,
    pub scheduled: Vec<(ActionKey, Tag)>,
    pub stop_requested: Option<Tag>,
    pub failed: Option<String>,
    pub(crate) mutation_requests: Vec<MutationRequest>,
}
