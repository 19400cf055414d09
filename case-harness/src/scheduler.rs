//! The abstract cooperative dispatcher the harness drives cases through.
//!
//! A [`Scheduler`] is a single-threaded, FIFO-by-ready-time callback queue.
//! The harness never spawns threads and never awaits a future of its own: it
//! posts [`Event`]s and lets the scheduler decide when to hand them back.
//! Callbacks posted from within another callback are only eligible to run
//! after the current one returns -- the harness relies on this for its
//! no-reentrancy guarantee (see the crate-level docs).

use thiserror::Error;

use crate::control::Control;

/// An opaque, non-null handle to a posted callback.
///
/// Two handles compare equal only if they were returned from the same
/// [`Scheduler::post`] call. Implementations are free to reuse numeric
/// values once a handle has fired and been forgotten by the harness, since
/// the harness never compares a stale handle against a live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SchedulerHandle(pub u64);

/// The events the harness posts to itself through a [`Scheduler`].
///
/// These are the only "callbacks" a [`Scheduler`] implementation ever needs
/// to carry: the harness is both sole producer and sole consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Advance to the next case in the specification (or finish the run).
    RunNextCase,
    /// Re-invoke the current case's body (a `HandlerOnly`/`All` repeat).
    CaseBodyContinue,
    /// The await timeout for the current case's pending validation fired.
    ///
    /// Carries no handle: invariant 1 (at most one `pending_timeout_handle`
    /// at a time, a new one always cancelling the old) means a stale fire
    /// is detected simply by `pending_timeout_handle` already being `None`
    /// when this event is dispatched -- whichever of a validation or a
    /// timeout the scheduler delivers first clears it for the other.
    CaseTimeout,
    /// A validation, either called synchronously from within a case body
    /// (delay 0, dispatched after the current callback returns) or
    /// deferred from an interrupt-like context via a thread-safe `post`.
    Validate(Option<Control>),
    /// Posted once the harness has nothing further to do; tells
    /// [`Scheduler::run`] to return.
    Finished,
}

/// The result of [`Scheduler::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The callback was removed before it fired.
    Removed,
    /// The callback had already fired, or the handle is unknown. The harness
    /// must treat this the same as `Removed` -- it is not an error.
    AlreadyFired,
}

/// Error returned by [`Scheduler::init`].
#[derive(Debug, Error)]
#[error("scheduler failed to initialize")]
pub struct SchedulerError;

/// Abstract cooperative dispatcher.
///
/// Methods take `&self` rather than `&mut self`: every implementation in
/// this crate and its companion `case-harness-tokio` crate is single-owner
/// but uses interior mutability, which lets the harness hold a shared
/// reference to the scheduler for the whole run while still posting new
/// events from inside a callback it is currently dispatching.
pub trait Scheduler {
    /// Initializes the scheduler. Called exactly once, before any case
    /// runs.
    fn init(&self) -> Result<(), SchedulerError>;

    /// Enqueues `event` to be delivered after at least `delay_ms` has
    /// elapsed (`0` meaning "as soon as possible, but not before `post`
    /// returns"). Events posted with equal delay are delivered in post
    /// order.
    fn post(&self, event: Event, delay_ms: u32) -> SchedulerHandle;

    /// Cancels a previously posted event. Cancelling an event that has
    /// already fired (or an unknown handle) is a no-op success.
    fn cancel(&self, handle: SchedulerHandle) -> CancelOutcome;

    /// Blocks, invoking `dispatch` for each posted event in FIFO-by-
    /// ready-time order, until [`Event::Finished`] is delivered.
    fn run(&self, dispatch: &mut dyn FnMut(Event));
}
