#![doc = document_features::document_features!()]
//! Thin convenience layer over [`reactor_runtime`]: re-exports its full
//! public surface so a binary only needs one `use`, and adds the one-call
//! helper a `main` function actually wants.

pub use reactor_runtime::*;

use tracing::info;

/// Assigns priorities and drives `env` to completion in one call under the
/// default [`Config`] (fast, not kept alive, no timeout), logging how far
/// the run got.
///
/// Equivalent to constructing a [`Scheduler`] and calling [`Scheduler::run`]
/// directly; use that instead if you need to inspect or drive the scheduler
/// step by step, or [`run_with_config`] if you need `timeout`/`keep_alive`/
/// `fast`/`success`/`failure`.
pub fn run_to_completion(env: Env) -> Result<RunStats, RuntimeError> {
    run_with_config(env, Config::default())
}

/// As [`run_to_completion`], under an explicit [`Config`].
pub fn run_with_config(env: Env, config: Config) -> Result<RunStats, RuntimeError> {
    let mut scheduler = Scheduler::with_config(env, config)?;
    let stats = scheduler.run()?;
    info!(
        tags = stats.tags_processed,
        reactions = stats.reactions_invoked,
        "run finished"
    );
    Ok(stats)
}
