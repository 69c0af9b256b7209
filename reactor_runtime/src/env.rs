//! The environment: every reactor, port, action, and reaction in a program,
//! plus the dependency bookkeeping (`PrecedenceGraph`, writer/reader tables,
//! connections) needed to keep priorities correct as the program is built
//! and, later, mutated.

use std::any::Any;

use reactor_core::{ActionKey, PortKey, ReactionKey, ReactorKey, Tag, TimeValue};
use reactor_tinymap::{Key, TinyMap, TinySecondaryMap};

use crate::action::{Action, BaseAction, Origin, TimerSpec};
use crate::error::RuntimeError;
use crate::graph::PrecedenceGraph;
use crate::port::{BasePort, Port, PortData};
use crate::reaction::{Reaction, ReactionSpec};
use crate::reactor::{ReactorMeta, ReactorState};

/// Priority spacing passed to `PrecedenceGraph::update_priorities`. Leaves
/// room for a mutation to splice reactions between existing priorities
/// without needing to renumber the whole graph first.
pub const DEFAULT_SPACING: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

#[derive(Debug, Clone, Copy)]
struct PortMeta {
    owner: ReactorKey,
    direction: Direction,
}

pub struct Env {
    reactors: TinyMap<ReactorKey, ReactorMeta>,
    ports: TinyMap<PortKey, Box<dyn BasePort>>,
    port_meta: TinySecondaryMap<PortKey, PortMeta>,
    actions: TinyMap<ActionKey, Box<dyn BaseAction>>,
    timers: TinySecondaryMap<ActionKey, TimerSpec>,
    reactions: TinyMap<ReactionKey, Reaction>,

    port_writers: TinySecondaryMap<PortKey, Vec<ReactionKey>>,
    port_trigger_readers: TinySecondaryMap<PortKey, Vec<ReactionKey>>,
    port_source_readers: TinySecondaryMap<PortKey, Vec<ReactionKey>>,
    action_triggers: TinySecondaryMap<ActionKey, Vec<ReactionKey>>,
    connections: TinySecondaryMap<PortKey, Vec<PortKey>>,

    declaration_edges: Vec<(ReactionKey, ReactionKey)>,
    last_reaction_in_reactor: TinySecondaryMap<ReactorKey, ReactionKey>,

    startup_reactions: Vec<ReactionKey>,
    shutdown_reactions: Vec<ReactionKey>,

    graph: PrecedenceGraph<ReactionKey>,
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

impl Env {
    pub fn new() -> Self {
        Self {
            reactors: TinyMap::new(),
            ports: TinyMap::new(),
            port_meta: TinySecondaryMap::new(),
            actions: TinyMap::new(),
            timers: TinySecondaryMap::new(),
            reactions: TinyMap::new(),
            port_writers: TinySecondaryMap::new(),
            port_trigger_readers: TinySecondaryMap::new(),
            port_source_readers: TinySecondaryMap::new(),
            action_triggers: TinySecondaryMap::new(),
            connections: TinySecondaryMap::new(),
            declaration_edges: Vec::new(),
            last_reaction_in_reactor: TinySecondaryMap::new(),
            startup_reactions: Vec::new(),
            shutdown_reactions: Vec::new(),
            graph: PrecedenceGraph::new(),
        }
    }

    // --- construction -----------------------------------------------------

    pub fn new_reactor(
        &mut self,
        name: impl Into<String>,
        parent: Option<ReactorKey>,
        state: Box<dyn ReactorState>,
    ) -> ReactorKey {
        let key = self.reactors.insert(ReactorMeta::new(name, parent, state));
        if let Some(parent) = parent {
            self.reactors[parent].children.push(key);
        }
        key
    }

    pub fn new_port<T: PortData>(
        &mut self,
        reactor: ReactorKey,
        name: impl Into<String>,
        direction: Direction,
    ) -> PortKey {
        let key = self
            .ports
            .insert_with_key(|key| Port::<T>::new(name, key).boxed());
        self.port_meta.insert(key, PortMeta { owner: reactor, direction });
        self.reactors[reactor].ports.push(key);
        key
    }

    pub fn new_action<T: PortData>(
        &mut self,
        reactor: ReactorKey,
        name: impl Into<String>,
        min_delay: TimeValue,
        origin: Origin,
    ) -> ActionKey {
        let key = self
            .actions
            .insert_with_key(|key| Action::<T>::new(name, key, min_delay, origin).boxed());
        self.reactors[reactor].actions.push(key);
        key
    }

    pub fn new_timer(
        &mut self,
        reactor: ReactorKey,
        name: impl Into<String>,
        offset: TimeValue,
        period: TimeValue,
    ) -> ActionKey {
        let key = self.new_action::<()>(reactor, name, TimeValue::ZERO, Origin::Logical);
        self.timers.insert(key, TimerSpec { offset, period });
        key
    }

    /// Registers a reaction and links it into the precedence graph: a
    /// declaration-order edge from the reactor's previous reaction, and
    /// writer/reader edges for every port it touches (through its own slot
    /// and through any existing connection).
    ///
    /// Fails with [`RuntimeError::MultipleWriters`] if `spec` declares an
    /// effect port that some other reaction already writes: at most one
    /// reaction may write a given port.
    pub fn add_reaction(&mut self, spec: ReactionSpec) -> Result<ReactionKey, RuntimeError> {
        let reactor_key = spec.reactor_key;
        let effect_ports = spec.effect_ports.clone();
        let triggers_startup = spec.triggers_startup;
        let triggers_shutdown = spec.triggers_shutdown;
        let trigger_actions = spec.trigger_actions.clone();

        for &port in &effect_ports {
            if let Some(&existing) = self.port_writers.get(port).and_then(|w| w.first()) {
                return Err(RuntimeError::MultipleWriters { port, existing });
            }
        }

        let key = self.reactions.insert(spec.into_reaction());
        self.reactors[reactor_key].reactions.push(key);
        self.graph.add_node(key);

        if let Some(&prev) = self.last_reaction_in_reactor.get(reactor_key) {
            // `key` (declared later) depends on `prev` having already run.
            self.graph.add_edge(key, prev);
            self.declaration_edges.push((prev, key));
        }
        self.last_reaction_in_reactor.insert(reactor_key, key);

        if triggers_startup {
            self.startup_reactions.push(key);
        }
        if triggers_shutdown {
            self.shutdown_reactions.push(key);
        }
        for &action in &trigger_actions {
            self.action_triggers.entry_or_insert_with(action, Vec::new).push(key);
        }

        for &port in &self.reactions[key].trigger_ports.clone() {
            self.link_reader(port, key, true);
        }
        for &port in &self.reactions[key].source_ports.clone() {
            self.link_reader(port, key, false);
        }
        for &port in &effect_ports {
            self.link_writer(port, key);
        }

        Ok(key)
    }

    fn link_reader(&mut self, port: PortKey, reader: ReactionKey, is_trigger: bool) {
        if is_trigger {
            self.port_trigger_readers.entry_or_insert_with(port, Vec::new).push(reader);
        } else {
            self.port_source_readers.entry_or_insert_with(port, Vec::new).push(reader);
        }
        // `reader` depends on every reaction that writes a value it reads.
        if let Some(writers) = self.port_writers.get(port).cloned() {
            for w in writers {
                self.graph.add_edge(reader, w);
            }
        }
        for source in self.sources_connected_to(port) {
            if let Some(writers) = self.port_writers.get(source).cloned() {
                for w in writers {
                    self.graph.add_edge(reader, w);
                }
            }
        }
    }

    fn link_writer(&mut self, port: PortKey, writer: ReactionKey) {
        self.port_writers.entry_or_insert_with(port, Vec::new).push(writer);
        for reader in self.all_readers(port) {
            self.graph.add_edge(reader, writer);
        }
        if let Some(sinks) = self.connections.get(port).cloned() {
            for sink in sinks {
                for reader in self.all_readers(sink) {
                    self.graph.add_edge(reader, writer);
                }
            }
        }
    }

    fn all_readers(&self, port: PortKey) -> Vec<ReactionKey> {
        let mut readers = self.port_trigger_readers.get(port).cloned().unwrap_or_default();
        readers.extend(self.port_source_readers.get(port).cloned().unwrap_or_default());
        readers
    }

    /// Every source port with a connection into `sink`.
    fn sources_connected_to(&self, sink: PortKey) -> Vec<PortKey> {
        self.connections
            .iter()
            .filter(|(_, sinks)| sinks.contains(&sink))
            .map(|(source, _)| source)
            .collect()
    }

    /// Assigns initial priorities. Must be called once after the last
    /// `add_reaction`, before the scheduler runs.
    pub fn build(&mut self, spacing: i64) -> Result<(), RuntimeError> {
        if self.graph.update_priorities(spacing) {
            Ok(())
        } else {
            Err(RuntimeError::CycleIntroduced)
        }
    }

    // --- connections --------------------------------------------------

    fn validate_connection(&self, source: PortKey, sink: PortKey) -> Result<(), RuntimeError> {
        let source_meta = *self
            .port_meta
            .get(source)
            .ok_or(RuntimeError::PortKeyNotFound(source))?;
        let sink_meta = *self.port_meta.get(sink).ok_or(RuntimeError::PortKeyNotFound(sink))?;

        let source_type = self.ports[source].type_name();
        let sink_type = self.ports[sink].type_name();
        if source_type != sink_type {
            return Err(RuntimeError::IllegalConnection(format!(
                "type mismatch: {source_type} vs {sink_type}"
            )));
        }

        let siblings = source_meta.owner != sink_meta.owner
            && self.reactors[source_meta.owner].parent == self.reactors[sink_meta.owner].parent
            && source_meta.direction == Direction::Output
            && sink_meta.direction == Direction::Input;

        let hierarchical_down = self.reactors[sink_meta.owner].parent == Some(source_meta.owner)
            && source_meta.direction == Direction::Input
            && sink_meta.direction == Direction::Input;

        let hierarchical_up = self.reactors[source_meta.owner].parent == Some(sink_meta.owner)
            && source_meta.direction == Direction::Output
            && sink_meta.direction == Direction::Output;

        if siblings || hierarchical_down || hierarchical_up {
            Ok(())
        } else {
            Err(RuntimeError::IllegalConnection(format!(
                "{source:?} -> {sink:?} does not satisfy any allowed connection pattern"
            )))
        }
    }

    pub fn can_connect(&self, source: PortKey, sink: PortKey) -> bool {
        if self.validate_connection(source, sink).is_err() {
            return false;
        }
        let mut g = self.graph.clone();
        if let Some(writers) = self.port_writers.get(source) {
            for reader in self.all_readers(sink) {
                for &w in writers {
                    if w != reader {
                        g.add_edge(reader, w);
                    }
                }
            }
        }
        g.update_priorities(DEFAULT_SPACING)
    }

    pub fn connect(&mut self, source: PortKey, sink: PortKey) -> Result<(), RuntimeError> {
        self.validate_connection(source, sink)?;
        let snapshot = self.graph.clone();

        self.connections.entry_or_insert_with(source, Vec::new).push(sink);
        if let Some(writers) = self.port_writers.get(source).cloned() {
            for reader in self.all_readers(sink) {
                for &w in &writers {
                    if w != reader {
                        self.graph.add_edge(reader, w);
                    }
                }
            }
        }

        if self.graph.update_priorities(DEFAULT_SPACING) {
            Ok(())
        } else {
            self.graph = snapshot;
            if let Some(v) = self.connections.get_mut(source) {
                v.retain(|&s| s != sink);
            }
            Err(RuntimeError::CycleIntroduced)
        }
    }

    pub fn disconnect(&mut self, source: PortKey, sink: PortKey) {
        if let Some(v) = self.connections.get_mut(source) {
            v.retain(|&s| s != sink);
        }
        self.rebuild_graph_from_scratch();
        // Removing a connection only removes constraints, so this cannot
        // introduce a cycle that wasn't already resolved.
        self.graph.update_priorities(DEFAULT_SPACING);
    }

    /// Discards all port-induced edges and replays them from the current
    /// writer/reader/connection tables. Used by `disconnect`, where
    /// precisely identifying which edges a single removed connection
    /// justified (versus some other still-live reason) isn't worth the
    /// bookkeeping given how rarely topology shrinks at run time.
    fn rebuild_graph_from_scratch(&mut self) {
        let mut g = PrecedenceGraph::new();
        for key in self.reactions.keys() {
            g.add_node(key);
        }
        for &(prev, key) in &self.declaration_edges {
            g.add_edge(key, prev);
        }
        for (port, writers) in self.port_writers.iter() {
            for reader in self.all_readers(port) {
                for &w in writers {
                    if w != reader {
                        g.add_edge(reader, w);
                    }
                }
            }
        }
        for (source, sinks) in self.connections.iter() {
            if let Some(writers) = self.port_writers.get(source) {
                for &sink in sinks {
                    for reader in self.all_readers(sink) {
                        for &w in writers {
                            if w != reader {
                                g.add_edge(reader, w);
                            }
                        }
                    }
                }
            }
        }
        self.graph = g;
    }

    // --- accessors used by the scheduler -----------------------------

    pub(crate) fn reaction(&self, key: ReactionKey) -> &Reaction {
        &self.reactions[key]
    }

    pub(crate) fn reaction_priority(&self, key: ReactionKey) -> i64 {
        self.graph.priority(key).unwrap_or(0)
    }

    pub(crate) fn reactions_len(&self) -> usize {
        self.reactions.len()
    }

    pub(crate) fn startup_reactions(&self) -> &[ReactionKey] {
        &self.startup_reactions
    }

    pub(crate) fn shutdown_reactions(&self) -> &[ReactionKey] {
        &self.shutdown_reactions
    }

    pub(crate) fn action_triggers(&self, action: ActionKey) -> &[ReactionKey] {
        self.action_triggers.get(action).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn timers(&self) -> impl Iterator<Item = (ActionKey, TimerSpec)> + '_ {
        self.timers.iter().map(|(k, spec)| (k, *spec))
    }

    pub(crate) fn action_origin_min_delay(&self, action: ActionKey) -> (Origin, TimeValue) {
        (self.actions[action].origin(), self.actions[action].min_delay())
    }

    pub(crate) fn clear_action(&mut self, action: ActionKey) {
        self.actions[action].clear();
    }

    pub(crate) fn action_is_present(&self, action: ActionKey, tag: Tag) -> bool {
        self.actions[action].is_present(tag)
    }

    /// Directly arms a timer's underlying (always unit-valued) action for
    /// `tag`, bypassing the declared-effect check `ReactionCtx::schedule`
    /// applies, since timers are rearmed by the scheduler itself rather
    /// than by a reaction.
    pub(crate) fn arm_timer(&mut self, action: ActionKey, tag: Tag) {
        if let Some(a) = self.actions.get_mut(action).and_then(|b| b.downcast_mut::<Action<()>>()) {
            a.set(tag, ());
        }
    }

    /// Stamps a physical action's value directly, bypassing `ReactionCtx`.
    /// Used by the scheduler to apply events that arrived through the
    /// cross-thread physical-action inbox rather than a reaction's own
    /// `schedule` call.
    pub(crate) fn set_physical_action_value(
        &mut self,
        action: ActionKey,
        tag: Tag,
        value: Box<dyn Any + Send>,
    ) -> Result<(), RuntimeError> {
        self.actions
            .get_mut(action)
            .ok_or(RuntimeError::ActionKeyNotFound(action))?
            .set_boxed_value(tag, value)
    }

    pub(crate) fn clear_port(&mut self, port: PortKey) {
        self.ports[port].clear();
    }

    pub(crate) fn all_port_keys(&self) -> Vec<PortKey> {
        self.ports.keys().collect()
    }

    pub(crate) fn all_action_keys(&self) -> Vec<ActionKey> {
        self.actions.keys().collect()
    }

    pub(crate) fn reactor_fqn(&self, key: ReactorKey) -> String {
        let meta = &self.reactors[key];
        match meta.parent {
            Some(parent) => format!("{}.{}", self.reactor_fqn(parent), meta.name),
            None => meta.name.clone(),
        }
    }

    pub(crate) fn reaction_fqn(&self, key: ReactionKey) -> String {
        let reaction = &self.reactions[key];
        format!("{}.{}", self.reactor_fqn(reaction.reactor_key()), reaction.name())
    }

    pub fn precedence_graph_snapshot(&self) -> String {
        self.graph.to_string_with(|key| self.reaction_fqn(key))
    }

    /// Copies the value at each written port to every port it connects to,
    /// and returns the set of trigger-reactions that must be re-queued for
    /// the current tag as a consequence.
    pub(crate) fn propagate_and_collect_readers(
        &mut self,
        written: &[PortKey],
    ) -> Result<Vec<ReactionKey>, RuntimeError> {
        let mut readers = Vec::new();
        for &port in written {
            if let Some(rs) = self.port_trigger_readers.get(port) {
                for &r in rs {
                    if !readers.contains(&r) {
                        readers.push(r);
                    }
                }
            }
            let sinks = self.connections.get(port).cloned().unwrap_or_default();
            for sink in sinks {
                if let Some(boxed) = self.ports.get(port).and_then(|p| p.clone_boxed_value()) {
                    if let Some(sink_port) = self.ports.get_mut(sink) {
                        sink_port.set_boxed_value(boxed)?;
                    }
                }
                if let Some(rs) = self.port_trigger_readers.get(sink) {
                    for &r in rs {
                        if !readers.contains(&r) {
                            readers.push(r);
                        }
                    }
                }
            }
        }
        Ok(readers)
    }

    pub(crate) fn invoke_reaction(
        &mut self,
        key: ReactionKey,
        start_time: TimeValue,
        tag: Tag,
        physical_now: TimeValue,
    ) -> Result<crate::context::ReactionOutcome, RuntimeError> {
        use crate::context::ReactionCtx;

        let reactor_key = self.reactions[key].reactor_key();
        let declared_read_ports: Vec<PortKey> = self.reactions[key].all_read_ports().collect();
        let declared_effect_ports: Vec<PortKey> = self.reactions[key].effect_ports().to_vec();
        let declared_trigger_actions: Vec<ActionKey> = self.reactions[key].trigger_actions().to_vec();
        let declared_effect_actions: Vec<ActionKey> = self.reactions[key].effect_actions().to_vec();

        let mut port_keys: Vec<PortKey> = declared_read_ports
            .iter()
            .chain(declared_effect_ports.iter())
            .copied()
            .collect();
        port_keys.sort_by_key(|k| k.index());
        port_keys.dedup();

        let mut action_keys: Vec<ActionKey> = declared_trigger_actions
            .iter()
            .chain(declared_effect_actions.iter())
            .copied()
            .collect();
        action_keys.sort_by_key(|k| k.index());
        action_keys.dedup();

        let port_refs = self.ports.get_disjoint_mut_vec(&port_keys);
        let ports: Vec<(PortKey, &mut dyn BasePort)> = port_keys
            .iter()
            .copied()
            .zip(port_refs.into_iter().map(|b| b.as_mut()))
            .collect();

        let action_refs = self.actions.get_disjoint_mut_vec(&action_keys);
        let actions: Vec<(ActionKey, &mut dyn BaseAction)> = action_keys
            .iter()
            .copied()
            .zip(action_refs.into_iter().map(|b| b.as_mut()))
            .collect();

        let state: &mut dyn ReactorState = self.reactors[reactor_key].state.as_mut();
        let is_mutation = self.reactions[key].is_mutation();

        let mut ctx = ReactionCtx {
            start_time,
            tag,
            physical_now,
            declared_read_ports: &declared_read_ports,
            declared_effect_ports: &declared_effect_ports,
            declared_trigger_actions: &declared_trigger_actions,
            declared_effect_actions: &declared_effect_actions,
            ports,
            actions,
            state,
            is_mutation,
            written_ports: Vec::new(),
            scheduled: Vec::new(),
            stop_requested: None,
            failed: None,
            mutation_requests: Vec::new(),
        };

        let reaction = &self.reactions[key];
        let over_deadline = reaction.deadline().is_some_and(|deadline| {
            physical_now
                .subtract(tag.time)
                .map(|elapsed| elapsed > deadline.duration)
                .unwrap_or(false)
        });

        if over_deadline {
            (reaction.deadline().expect("checked above").handler)(&mut ctx);
        } else {
            (reaction.body)(&mut ctx);
        }

        let outcome = ctx.into_outcome();
        for request in &outcome.mutation_requests {
            match *request {
                crate::context::MutationRequest::Connect(source, sink) => {
                    let _ = self.connect(source, sink);
                }
                crate::context::MutationRequest::Disconnect(source, sink) => {
                    self.disconnect(source, sink);
                }
            }
        }

        Ok(outcome)
    }
}
