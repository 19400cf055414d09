//! The per-case state machine (component G): setup, body, await, timeout,
//! teardown, and failure classification, driven entirely by posted events.

use std::rc::Rc;

use tracing::{debug, instrument, warn};

use crate::control::{Control, RepeatMode, TimeoutPolicy};
use crate::failure::{Failure, FailureLocation, FailureReason};
use crate::handlers::{CaseBody, CaseContext, TeardownOutcome};
use crate::scheduler::{Event, Scheduler};
use crate::specification::Specification;
use crate::status::Status;

use super::state::{Phase, RunState};

/// Owns everything a single `run` needs: the resolved specification, the
/// scheduler it drives cases through, and the mutable run state. Exists for
/// exactly one `Harness::run` call and is dropped at `Done`/`Aborted`.
pub(crate) struct RunCtx {
    pub state: RunState,
    pub spec: Specification,
    pub scheduler: Rc<dyn Scheduler>,
    /// The control value a body returned, stashed across the suspension
    /// point between entering `Awaiting` and the validation/timeout event
    /// that resumes it. Not part of `RunState` proper: it is runner
    /// plumbing, not part of the data model in `spec.md` §3.
    pending_control: Option<Control>,
    pub finished: bool,
}

impl CaseContext for RunCtx {
    fn validate(&mut self, attrs: Option<Control>) {
        self.validate_callback(attrs);
    }

    fn schedule_validation(&mut self, delay_ms: u32, attrs: Option<Control>) {
        self.scheduler.post(Event::Validate(attrs), delay_ms);
    }
}

impl RunCtx {
    pub fn new(spec: Specification, scheduler: Rc<dyn Scheduler>) -> Self {
        RunCtx {
            state: RunState::new(),
            spec,
            scheduler,
            pending_control: None,
            finished: false,
        }
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::RunNextCase => self.run_next_case(),
            Event::CaseBodyContinue => self.invoke_body(),
            Event::CaseTimeout => self.handle_timeout(),
            Event::Validate(attrs) => self.validate_callback(attrs),
            Event::Finished => self.finished = true,
        }
    }

    // ---- CaseSetup ---------------------------------------------------

    #[instrument(level = "debug", skip(self))]
    fn run_next_case(&mut self) {
        if self.state.case_index >= self.spec.case_count() {
            self.finish();
            return;
        }

        self.state.phase = Phase::CaseSetup;
        self.state.reset_for_case();

        if self.spec.cases[self.state.case_index].is_empty() {
            debug!(index = self.state.case_index, "case body is empty, skipping straight to teardown");
            self.state.current_failure =
                Failure::new(FailureReason::EMPTY_CASE | FailureReason::CASES, FailureLocation::CaseSetup);
            self.case_teardown();
            return;
        }

        let index = self.state.case_index;
        let view = self.spec.cases[index].as_case_view();
        debug!(index, description = view.description(), "running case setup");
        let status = match &self.spec.cases[index].setup_handler {
            Some(handler) => handler(view, index),
            None => Status::Continue,
        };

        match status {
            Status::Continue | Status::Ignore => {
                self.state.phase = Phase::CaseBody;
                self.invoke_body();
            }
            Status::Abort => {
                self.state.current_failure = Failure::new(FailureReason::CASE_SETUP, FailureLocation::CaseSetup);
                self.case_teardown();
            }
        }
    }

    // ---- CaseBody -----------------------------------------------------

    #[instrument(level = "debug", skip(self))]
    fn invoke_body(&mut self) {
        self.state.call_count += 1;
        let index = self.state.case_index;
        debug!(index, call_count = self.state.call_count, "invoking case body");

        let mut body = std::mem::replace(&mut self.spec.cases[index].body, CaseBody::Empty);
        let control = match &mut body {
            CaseBody::Empty => Control::NEXT,
            CaseBody::Plain(f) => {
                f();
                Control::NEXT
            }
            CaseBody::Control(f) => f(self.state.call_count, self),
        };
        self.spec.cases[index].body = body;

        self.handle_control(control);
    }

    fn handle_control(&mut self, control: Control) {
        let index = self.state.case_index;
        let async_capable = self.spec.cases[index].is_async_capable();

        let needs_wait = matches!(
            control.timeout,
            TimeoutPolicy::Await | TimeoutPolicy::AwaitMs(_) | TimeoutPolicy::NoTimeout
        );

        if needs_wait && !async_capable {
            if self.raise_failure(FailureReason::UNKNOWN, FailureLocation::CaseHandler) != Status::Abort {
                self.case_teardown();
            }
            return;
        }

        if !needs_wait {
            self.post_await(control);
            return;
        }

        self.state.expected_validations = 1;
        if self.state.validated_so_far >= self.state.expected_validations {
            // Premature validations already satisfy this await. Consume the
            // credit now: left uncleared, it would also satisfy every
            // subsequent await this case enters (e.g. on a repeated
            // iteration), skipping them without ever posting a timeout or
            // waiting for a real validation.
            self.state.validated_so_far = 0;
            self.post_await(control);
            return;
        }

        self.state.phase = Phase::Awaiting;
        self.pending_control = Some(control);
        match control.timeout {
            TimeoutPolicy::AwaitMs(ms) => {
                let handle = self.scheduler.post(Event::CaseTimeout, ms);
                self.state.pending_timeout_handle = Some(handle);
            }
            TimeoutPolicy::Await | TimeoutPolicy::NoTimeout => {}
            _ => unreachable!("needs_wait implies Await/AwaitMs/NoTimeout"),
        }
    }

    // ---- validate_callback ---------------------------------------------

    fn validate_callback(&mut self, attrs: Option<Control>) {
        if let Some(attrs) = attrs {
            self.state.control_override = Some(attrs);
        }

        self.state.validated_so_far += 1;

        if self.state.phase != Phase::Awaiting {
            debug!(
                index = self.state.case_index,
                validated_so_far = self.state.validated_so_far,
                "premature validation credited ahead of the next await"
            );
            // Premature: the credit above is all that happens until the
            // next Awaiting begins.
            return;
        }

        if let Some(handle) = self.state.pending_timeout_handle.take() {
            self.scheduler.cancel(handle);
        }

        if self.state.validated_so_far >= self.state.expected_validations {
            // Consumed: must not survive to satisfy a later await on the
            // same case (see the matching reset in `handle_control`).
            self.state.validated_so_far = 0;
            let control = self.pending_control.take().unwrap_or(Control::NEXT);
            self.post_await(control);
        }
    }

    // ---- TimeoutBranch ---------------------------------------------------

    fn handle_timeout(&mut self) {
        if self.state.pending_timeout_handle.take().is_none() {
            // Stale: a validation already resolved this await.
            return;
        }

        warn!(index = self.state.case_index, "case await timed out");
        let control = self.pending_control.take().unwrap_or(Control::NEXT);

        if control.repeat.is_on_timeout_only() {
            // `call_count` is bumped by `invoke_body` itself once the posted
            // continuation (directly, or via `rerun_setup`'s success path)
            // actually re-invokes the body -- not here.
            if control.repeat.reruns_setup() {
                self.state.phase = Phase::CaseSetup;
                self.rerun_setup();
            } else {
                self.state.phase = Phase::CaseBody;
                self.scheduler.post(Event::CaseBodyContinue, 0);
            }
            return;
        }

        if self.raise_failure(FailureReason::TIMEOUT, FailureLocation::CaseHandler) != Status::Abort {
            self.case_teardown();
        }
    }

    fn rerun_setup(&mut self) {
        let index = self.state.case_index;
        let view = self.spec.cases[index].as_case_view();
        let status = match &self.spec.cases[index].setup_handler {
            Some(handler) => handler(view, index),
            None => Status::Continue,
        };
        match status {
            Status::Continue | Status::Ignore => {
                self.state.phase = Phase::CaseBody;
                self.scheduler.post(Event::CaseBodyContinue, 0);
            }
            Status::Abort => {
                self.state.current_failure = Failure::new(FailureReason::CASE_SETUP, FailureLocation::CaseSetup);
                self.case_teardown();
            }
        }
    }

    // ---- PostAwait ---------------------------------------------------

    fn post_await(&mut self, control: Control) {
        if !self.state.current_failure.is_failure() {
            self.state.case_passed += 1;
        }

        let effective = match self.state.control_override.take() {
            Some(overridden) => overridden,
            None => control,
        };

        match effective.repeat {
            RepeatMode::HandlerOnly => {
                self.scheduler.post(Event::CaseBodyContinue, 0);
                self.state.phase = Phase::CaseBody;
            }
            RepeatMode::All => {
                self.state.case_passed = 0;
                self.state.case_failed = 0;
                self.state.phase = Phase::CaseSetup;
                self.rerun_setup();
            }
            RepeatMode::None
            | RepeatMode::NoRepeat
            | RepeatMode::HandlerOnlyOnTimeout
            | RepeatMode::AllOnTimeout => {
                self.case_teardown();
            }
        }
    }

    // ---- raise_failure ---------------------------------------------------

    #[instrument(level = "debug", skip(self))]
    fn raise_failure(&mut self, reason: FailureReason, location: FailureLocation) -> Status {
        self.state.current_failure = if self.state.current_failure.is_failure() {
            self.state.current_failure.merge(reason)
        } else {
            Failure::new(reason, location)
        };

        let index = self.state.case_index;
        let view = self.spec.cases[index].as_case_view();
        let status = match &self.spec.cases[index].failure_handler {
            Some(handler) => handler(view, self.state.current_failure),
            None => Status::Continue,
        };

        match status {
            Status::Ignore => {
                self.state.current_failure = self.state.current_failure.ignored();
            }
            Status::Abort => {
                self.case_teardown();
            }
            Status::Continue => {}
        }
        status
    }

    // ---- CaseTeardown ---------------------------------------------------

    fn case_teardown(&mut self) {
        self.state.phase = Phase::CaseTeardown;
        let index = self.state.case_index;
        let view = self.spec.cases[index].as_case_view();
        let outcome = match &self.spec.cases[index].teardown_handler {
            Some(handler) => handler(view, self.state.case_passed, self.state.case_failed, self.state.current_failure),
            None => TeardownOutcome::NEXT,
        };

        match outcome {
            TeardownOutcome::Abort => {
                self.state.current_failure = self.state.current_failure.merge(FailureReason::CASE_TEARDOWN);
                self.tally_case();
                self.state.phase = Phase::Aborted;
                self.finish();
            }
            TeardownOutcome::Ignore => {
                self.state.current_failure = self.state.current_failure.ignored();
                self.tally_case();
                self.advance(1);
            }
            TeardownOutcome::Jump(jump) => {
                self.tally_case();
                self.advance(jump);
            }
        }
    }

    fn tally_case(&mut self) {
        if self.state.current_failure.is_failure() && !self.state.current_failure.is_ignored() {
            self.state.test_failed += 1;
        } else {
            self.state.test_passed += 1;
        }
    }

    fn advance(&mut self, jump: i32) {
        let next = self.state.case_index as i64 + jump as i64;
        if next < 0 || next as usize >= self.spec.case_count() {
            self.scheduler.post(Event::RunNextCase, 0);
            self.state.case_index = self.spec.case_count();
            return;
        }
        self.state.case_index = next as usize;
        self.scheduler.post(Event::RunNextCase, 0);
    }

    // ---- Harness-level completion ---------------------------------------

    fn finish(&mut self) {
        let failure = if self.state.test_failed > 0 {
            warn!(
                passed = self.state.test_passed,
                failed = self.state.test_failed,
                "run finished with failing cases"
            );
            Failure::new(FailureReason::CASES, FailureLocation::None)
        } else {
            Failure::none()
        };
        if let Some(handler) = &self.spec.test_teardown_handler {
            handler(self.state.test_passed, self.state.test_failed, failure);
        }
        self.state.phase = Phase::Done;
        self.scheduler.post(Event::Finished, 0);
    }
}
