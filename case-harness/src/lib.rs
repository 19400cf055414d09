//! An asynchronous, single-threaded cooperative test-case harness.
//!
//! A [`specification::Specification`] is an ordered sequence of
//! [`case::Case`]s plus test-level setup/teardown. A [`runner::Harness`]
//! drives a specification to completion through a [`scheduler::Scheduler`]:
//! each case runs its setup, body, an optional asynchronous await (with an
//! optional timeout), teardown, and failure classification, entirely
//! through posted events -- the harness never spawns a thread or blocks on
//! its own callbacks.
//!
//! This crate provides the scheduler-agnostic core. `case-harness-tokio`
//! provides a `tokio`-backed [`scheduler::Scheduler`] implementation for
//! production use; tests in this crate use a deterministic virtual-time
//! scheduler instead.
//!
//! # Concurrency model
//!
//! Callbacks posted from within another callback are only eligible to run
//! after the current one returns: the harness relies on this for its
//! no-reentrancy guarantee. [`scheduler::Scheduler`] methods take `&self`
//! rather than `&mut self` so an implementation can use interior mutability
//! to allow posting from inside a callback it is currently dispatching.

pub mod case;
pub mod control;
pub mod errors;
pub mod failure;
pub mod handlers;
pub mod reporter;
pub mod runner;
pub mod scheduler;
pub mod specification;
pub mod status;

pub use case::Case;
pub use control::{Control, ControlConflictError, RepeatMode, TimeoutPolicy};
pub use errors::HarnessError;
pub use failure::{Failure, FailureLocation, FailureReason};
pub use handlers::{CaseBody, CaseContext, TeardownOutcome};
pub use runner::{Harness, Phase, RunState, RunSummary};
pub use scheduler::{CancelOutcome, Event, Scheduler, SchedulerError, SchedulerHandle};
pub use specification::{CaseView, HandlersTable, Specification, SpecificationBuilder};
pub use status::Status;
