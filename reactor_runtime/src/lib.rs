#![doc = document_features::document_features!()]
//! Deterministic discrete-event execution engine for the reactor model of
//! computation: reactors communicating over typed ports, driven by timers
//! and scheduled actions, with a single-threaded scheduler that resolves a
//! within-tag fixpoint in priority order before advancing to the next tag.

mod action;
mod context;
mod env;
mod error;
mod event;
mod graph;
mod port;
mod queue;
mod reaction;
mod reactor;
mod scheduler;

pub use action::{Action, BaseAction, Origin, TimerSpec};
pub use context::ReactionCtx;
pub use env::{Direction, Env, DEFAULT_SPACING};
pub use error::RuntimeError;
pub use event::{EventQueue, ScheduledEvent};
pub use graph::PrecedenceGraph;
pub use port::{BasePort, Port, PortData};
pub use queue::PriorityQueue;
pub use reaction::{Deadline, Reaction, ReactionFn, ReactionSpec};
pub use reactor::{EmptyState, ReactorState};
pub use scheduler::{Config, PhysicalInjector, RunStats, Scheduler};

pub use reactor_core::{ActionKey, PortKey, ReactionKey, ReactorKey, Tag, TimeValue};
