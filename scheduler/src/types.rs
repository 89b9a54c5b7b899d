//! Shared types used by the scheduler subsystem.

use std::sync::Arc;

use futures::future::BoxFuture;

/// Future produced by one fire of the scheduled job.
pub type FireFuture = BoxFuture<'static, ()>;

/// Builds the work for one fire. Called once per tick that is not coalesced.
pub type FireCallback = Arc<dyn Fn() -> FireFuture + Send + Sync>;

/// `Armed` while a job is registered and will fire; `Idle` otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Armed,
}
