//! The top-level entry point (component H): drives a specification to
//! completion through a scheduler, handling the once-per-run test setup and
//! teardown that sit outside the per-case state machine.

use std::cell::Cell;
use std::rc::Rc;

use tracing::{debug, instrument};

use crate::errors::HarnessError;
use crate::failure::{Failure, FailureLocation, FailureReason};
use crate::scheduler::{Event, Scheduler};
use crate::specification::Specification;
use crate::status::Status;

use super::case_runner::RunCtx;
use super::state::Phase;

/// The tallies and terminal phase of a completed (or rejected) run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub test_passed: usize,
    pub test_failed: usize,
    pub phase: Phase,
}

/// Drives specifications to completion, one at a time, through a
/// [`Scheduler`]. Reentrant calls to [`Harness::run`] -- e.g. from a handler
/// that tries to start a nested run -- are rejected rather than silently
/// corrupting the in-flight run's state.
pub struct Harness {
    scheduler: Rc<dyn Scheduler>,
    busy: Cell<bool>,
}

impl Harness {
    pub fn new(scheduler: Rc<dyn Scheduler>) -> Self {
        Harness {
            scheduler,
            busy: Cell::new(false),
        }
    }

    /// Runs `spec` to completion. Rejects the call with
    /// [`HarnessError::AlreadyRunning`] if this harness is already running
    /// another specification; no scheduler or handler is touched in that
    /// case.
    pub fn run(&self, spec: Specification) -> Result<RunSummary, HarnessError> {
        if self.busy.replace(true) {
            return Err(HarnessError::AlreadyRunning);
        }
        let result = self.run_inner(spec);
        self.busy.set(false);
        result
    }

    #[instrument(level = "debug", skip(self, spec))]
    fn run_inner(&self, spec: Specification) -> Result<RunSummary, HarnessError> {
        self.scheduler.init()?;

        let case_count = spec.case_count();
        debug!(case_count, "starting run");
        let test_setup_handler = spec.test_setup_handler.clone();
        let test_teardown_handler = spec.test_teardown_handler.clone();

        let setup_status = match &test_setup_handler {
            Some(handler) => handler(case_count),
            None => Status::Continue,
        };

        if setup_status == Status::Abort {
            debug!("test setup aborted the run before any case ran");
            let failure = Failure::new(FailureReason::TEST_SETUP, FailureLocation::TestSetup);
            if let Some(handler) = &test_teardown_handler {
                handler(0, 0, failure);
            }
            return Ok(RunSummary {
                test_passed: 0,
                test_failed: 0,
                phase: Phase::Aborted,
            });
        }

        let mut ctx = RunCtx::new(spec, Rc::clone(&self.scheduler));
        self.scheduler.post(Event::RunNextCase, 0);

        self.scheduler.run(&mut |event| ctx.handle_event(event));

        Ok(RunSummary {
            test_passed: ctx.state.test_passed,
            test_failed: ctx.state.test_failed,
            phase: ctx.state.phase,
        })
    }
}
