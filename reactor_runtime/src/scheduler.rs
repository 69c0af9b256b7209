//! The single-threaded cooperative scheduler: drains the event queue tag by
//! tag, and within each tag drains the reaction queue in priority order
//! until a fixpoint is reached. Also owns the wall-clock alignment policy
//! (`Config`) and the thread-safe inbox physical actions are scheduled
//! through from outside this thread.

use std::any::Any;
use std::fmt;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tracing::{debug, instrument, trace};

use reactor_core::{ActionKey, ReactionKey, Tag, TimeValue};

use crate::action::Origin;
use crate::env::Env;
use crate::error::RuntimeError;
use crate::event::EventQueue;
use crate::port::PortData;
use crate::queue::PriorityQueue;

#[derive(Debug, Default, Clone, Copy)]
pub struct RunStats {
    pub tags_processed: u64,
    pub reactions_invoked: u64,
}

/// Scheduler policy, consumed by [`Scheduler::with_config`].
///
/// `success`/`failure` are invoked exactly once, at termination, from the
/// thread running [`Scheduler::run`].
pub struct Config {
    /// Absolute logical-time bound from start; once the scheduler sees a
    /// pending tag past this bound, it shuts down instead of running it.
    pub timeout: Option<TimeValue>,
    /// If the event queue empties with no timers or physical actions
    /// pending, keep the scheduler alive waiting for one rather than
    /// shutting down.
    pub keep_alive: bool,
    /// Skip physical-time alignment and advance as fast as events permit.
    pub fast: bool,
    pub success: Option<Box<dyn FnOnce(&RunStats) + Send>>,
    pub failure: Option<Box<dyn FnOnce(&RuntimeError) + Send>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout: None,
            keep_alive: false,
            fast: true,
            success: None,
            failure: None,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("timeout", &self.timeout)
            .field("keep_alive", &self.keep_alive)
            .field("fast", &self.fast)
            .finish_non_exhaustive()
    }
}

/// One physical action value crossing from another thread into the
/// scheduler, carried over the channel behind [`PhysicalInjector`].
struct PhysicalEvent {
    action: ActionKey,
    additional_delay: TimeValue,
    value: Box<dyn Any + Send>,
}

/// A cloneable, `Send` handle that lets other threads (I/O callbacks,
/// timers not modeled as reactor timers, etc.) schedule a physical action
/// without touching the event or reaction queues directly — the scheduler
/// remains their sole mutator, draining this inbox at each suspend/wakeup
/// boundary.
#[derive(Clone)]
pub struct PhysicalInjector {
    tx: Sender<PhysicalEvent>,
}

impl PhysicalInjector {
    /// Returns `false` if the scheduler has already been dropped.
    pub fn schedule<T: PortData>(&self, action: ActionKey, additional_delay: TimeValue, value: T) -> bool {
        self.tx
            .send(PhysicalEvent {
                action,
                additional_delay,
                value: Box::new(value),
            })
            .is_ok()
    }
}

pub struct Scheduler {
    env: Env,
    event_queue: EventQueue,
    start_instant: Instant,
    start_time: TimeValue,
    last_tag: Tag,
    error: Option<(ReactionKey, String)>,
    physical_tx: Sender<PhysicalEvent>,
    physical_rx: Receiver<PhysicalEvent>,
    config: Config,
}

impl Scheduler {
    /// Assigns initial reaction priorities and wraps `env` for execution
    /// under the default [`Config`] (fast, not kept alive, no timeout).
    pub fn new(env: Env) -> Result<Self, RuntimeError> {
        Self::with_config(env, Config::default())
    }

    /// As [`Scheduler::new`], under an explicit [`Config`].
    pub fn with_config(mut env: Env, config: Config) -> Result<Self, RuntimeError> {
        env.build(crate::env::DEFAULT_SPACING)?;
        let (physical_tx, physical_rx) = crossbeam_channel::unbounded();
        Ok(Self {
            env,
            event_queue: EventQueue::new(),
            start_instant: Instant::now(),
            start_time: TimeValue::ZERO,
            last_tag: Tag::ZERO,
            error: None,
            physical_tx,
            physical_rx,
            config,
        })
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Env {
        &mut self.env
    }

    /// A handle other threads can use to schedule physical actions while
    /// this scheduler runs.
    pub fn physical_injector(&self) -> PhysicalInjector {
        PhysicalInjector {
            tx: self.physical_tx.clone(),
        }
    }

    fn physical_now(&self) -> TimeValue {
        let elapsed = self.start_instant.elapsed();
        TimeValue::new(elapsed.as_secs(), elapsed.subsec_nanos())
    }

    #[instrument(skip(self))]
    pub fn run(&mut self) -> Result<RunStats, RuntimeError> {
        self.start_instant = Instant::now();
        let mut stats = RunStats::default();

        self.startup(&mut stats)?;

        'outer: loop {
            self.drain_physical_inbox()?;

            let event = loop {
                if let Some(event) = self.event_queue.pop() {
                    break event;
                }
                match self.wait_for_next_event() {
                    Some(physical) => {
                        self.apply_physical_event(physical)?;
                    }
                    None => {
                        // Queue exhausted with nothing left to wait for: run
                        // the shutdown reactions once before terminating.
                        self.force_shutdown(&mut stats)?;
                        break 'outer;
                    }
                }
            };

            if let Some(timeout) = self.config.timeout {
                if !event.terminal && event.tag.time > timeout {
                    debug!(?timeout, tag = %event.tag, "timeout reached, shutting down");
                    self.force_shutdown(&mut stats)?;
                    break;
                }
            }

            if !self.config.fast {
                if self.synchronize_wall_clock(event.tag.time)?.is_some() {
                    self.event_queue.push(event.tag, event.reactions, event.terminal);
                    continue 'outer;
                }
            }

            let terminal = event.terminal;
            self.process_tag(event.tag, event.reactions, &mut stats)?;
            if terminal {
                break;
            }
        }

        self.finish(stats)
    }

    fn finish(&mut self, stats: RunStats) -> Result<RunStats, RuntimeError> {
        if let Some((reaction_key, message)) = self.error.take() {
            let err = RuntimeError::ReactionFailure(reaction_key, message);
            if let Some(on_failure) = self.config.failure.take() {
                on_failure(&err);
            }
            return Err(err);
        }
        if let Some(on_success) = self.config.success.take() {
            on_success(&stats);
        }
        Ok(stats)
    }

    /// Drains any physical actions that arrived since the last check,
    /// without blocking.
    fn drain_physical_inbox(&mut self) -> Result<(), RuntimeError> {
        while let Ok(event) = self.physical_rx.try_recv() {
            self.apply_physical_event(event)?;
        }
        Ok(())
    }

    /// Called when the event queue is empty. Blocks indefinitely for a
    /// physical action if `keep_alive` is set; otherwise signals shutdown.
    fn wait_for_next_event(&mut self) -> Option<PhysicalEvent> {
        if self.config.keep_alive {
            debug!("event queue empty, waiting for a physical action");
            self.physical_rx.recv().ok()
        } else {
            None
        }
    }

    /// Stamps a received physical event onto its action and enqueues its
    /// triggers, returning the tag it was assigned.
    fn apply_physical_event(&mut self, event: PhysicalEvent) -> Result<Tag, RuntimeError> {
        let (origin, min_delay) = self.env.action_origin_min_delay(event.action);
        if origin != Origin::Physical {
            return Err(RuntimeError::UndeclaredAccess {
                kind: "physical action",
                key: format!("{:?} is not a physical action", event.action),
            });
        }
        let physical_now = self.physical_now();
        let tag = Tag::new(physical_now.add(min_delay)?.add(event.additional_delay)?, 0);
        self.env.set_physical_action_value(event.action, tag, event.value)?;
        let triggers = self.env.action_triggers(event.action).to_vec();
        self.event_queue.push(tag, triggers, false);
        Ok(tag)
    }

    /// Suspends this thread until physical time reaches `target`, or until
    /// a physical action preempts the wait. Returns `Some` if a physical
    /// event was applied (and the caller should re-check the event queue).
    fn synchronize_wall_clock(&mut self, target: TimeValue) -> Result<Option<Tag>, RuntimeError> {
        let now = self.physical_now();
        if now >= target {
            return Ok(None);
        }
        let remaining = target.subtract(now)?;
        let advance = Duration::new(remaining.seconds, remaining.nanoseconds);
        match self.physical_rx.recv_timeout(advance) {
            Ok(event) => Ok(Some(self.apply_physical_event(event)?)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                std::thread::sleep(advance);
                Ok(None)
            }
        }
    }

    /// Fires the shutdown event one microstep after the last tag actually
    /// processed, bypassing whatever event was peeked next.
    fn force_shutdown(&mut self, stats: &mut RunStats) -> Result<(), RuntimeError> {
        let shutdown_tag = self.last_tag.advance(TimeValue::ZERO)?;
        let shutdown_reactions = self.env.shutdown_reactions().to_vec();
        self.process_tag(shutdown_tag, shutdown_reactions, stats)?;
        Ok(())
    }

    fn startup(&mut self, stats: &mut RunStats) -> Result<(), RuntimeError> {
        debug!("startup");
        let startup_reactions = self.env.startup_reactions().to_vec();
        self.event_queue.push(Tag::ZERO, startup_reactions, false);

        for (key, spec) in self.env.timers().collect::<Vec<_>>() {
            let first_tag = Tag::new(spec.offset, 0);
            self.env.arm_timer(key, first_tag);
            let triggers = self.env.action_triggers(key).to_vec();
            self.event_queue.push(first_tag, triggers, false);
        }

        let _ = stats;
        Ok(())
    }

    #[instrument(skip(self, initial, stats))]
    fn process_tag(
        &mut self,
        tag: Tag,
        initial: Vec<ReactionKey>,
        stats: &mut RunStats,
    ) -> Result<(), RuntimeError> {
        trace!(?tag, "processing tag");
        self.last_tag = tag;
        let mut queue = PriorityQueue::new();
        for r in initial {
            queue.push(r, self.env.reaction_priority(r));
        }

        let mut stop_requested_at: Option<Tag> = None;

        while let Some((reaction_key, _)) = queue.pop() {
            let physical_now = self.physical_now();
            let outcome = self
                .env
                .invoke_reaction(reaction_key, self.start_time, tag, physical_now)?;
            stats.reactions_invoked += 1;

            if let Some(message) = outcome.failed {
                self.error = Some((reaction_key, message));
                stop_requested_at = Some(stop_requested_at.map_or(tag, |t| t.min(tag)));
            }
            if let Some(stop_tag) = outcome.stop_requested {
                stop_requested_at = Some(stop_requested_at.map_or(stop_tag, |t| t.min(stop_tag)));
            }

            if !outcome.written_ports.is_empty() {
                let readers = self.env.propagate_and_collect_readers(&outcome.written_ports)?;
                for r in readers {
                    queue.push(r, self.env.reaction_priority(r));
                }
            }

            for (action_key, new_tag) in outcome.scheduled {
                self.requeue_scheduled_action(action_key, new_tag, tag, &mut queue);
            }

            if self.env.reaction(reaction_key).is_mutation() {
                self.reprioritize_pending(&mut queue);
            }
        }

        self.rearm_periodic_timers(tag);
        self.clear_tag(tag);

        stats.tags_processed += 1;

        if let Some(stop_tag) = stop_requested_at {
            let shutdown_tag = tag.advance(TimeValue::ZERO)?;
            let shutdown_tag = shutdown_tag.max(stop_tag);
            let shutdown_reactions = self.env.shutdown_reactions().to_vec();
            self.event_queue.push(shutdown_tag, shutdown_reactions, true);
        }

        Ok(())
    }

    fn requeue_scheduled_action(
        &mut self,
        action_key: ActionKey,
        new_tag: Tag,
        current_tag: Tag,
        queue: &mut PriorityQueue<ReactionKey, i64>,
    ) {
        let triggers = self.env.action_triggers(action_key).to_vec();
        if new_tag == current_tag {
            for r in triggers {
                queue.push(r, self.env.reaction_priority(r));
            }
        } else {
            self.event_queue.push(new_tag, triggers, false);
        }
    }

    /// A mutation reaction may have changed the precedence graph; anything
    /// still queued for this tag could now be ordered incorrectly relative
    /// to the fresh priorities, so rebuild the queue against them.
    fn reprioritize_pending(&mut self, queue: &mut PriorityQueue<ReactionKey, i64>) {
        let mut pending = Vec::new();
        while let Some((id, _)) = queue.pop() {
            pending.push(id);
        }
        for id in pending {
            queue.push(id, self.env.reaction_priority(id));
        }
    }

    fn rearm_periodic_timers(&mut self, tag: Tag) {
        for (key, spec) in self.env.timers().collect::<Vec<_>>() {
            if spec.is_periodic() && self.env.action_is_present(key, tag) {
                if let Ok(next_time) = tag.time.add(spec.period) {
                    let next_tag = Tag::new(next_time, 0);
                    self.env.arm_timer(key, next_tag);
                    let triggers = self.env.action_triggers(key).to_vec();
                    self.event_queue.push(next_tag, triggers, false);
                }
            }
        }
    }

    fn clear_tag(&mut self, _tag: Tag) {
        for port in self.env.all_port_keys() {
            self.env.clear_port(port);
        }
        for action in self.env.all_action_keys() {
            self.env.clear_action(action);
        }
    }
}
