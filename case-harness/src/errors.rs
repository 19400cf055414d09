//! Crate-wide error types for fallible construction paths. Internal
//! state-machine invariants that a caller cannot violate (e.g. "there is
//! only ever one pending timeout handle") are enforced by ownership and
//! assertions instead, not by these types.

use thiserror::Error;

use crate::scheduler::SchedulerError;

pub use crate::control::ControlConflictError;

/// Errors that can prevent a [`crate::runner::harness::Harness::run`] call
/// from completing.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("scheduler initialization failed")]
    Scheduler(#[from] SchedulerError),
    #[error("a run is already in progress on this harness")]
    AlreadyRunning,
}
