//! The per-run state record: phase, tallies, and the bookkeeping the case
//! runner needs to resolve premature validations and timeout races.

use crate::control::Control;
use crate::failure::Failure;
use crate::scheduler::SchedulerHandle;

/// Where the harness currently is in the per-case/per-test lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    TestSetup,
    CaseSetup,
    CaseBody,
    Awaiting,
    CaseTeardown,
    TestTeardown,
    Aborted,
    Done,
}

/// Process-wide state for the duration of a single `run`. Owned by the
/// [`crate::runner::harness::Harness`] and mutated only from scheduler
/// callbacks.
pub struct RunState {
    pub case_index: usize,
    pub case_passed: usize,
    pub case_failed: usize,
    pub test_passed: usize,
    pub test_failed: usize,
    pub call_count: u32,
    pub pending_timeout_handle: Option<SchedulerHandle>,
    pub expected_validations: i32,
    pub validated_so_far: i32,
    pub control_override: Option<Control>,
    pub phase: Phase,
    /// The failure bitset accumulated for the case currently running.
    pub current_failure: Failure,
}

impl RunState {
    pub fn new() -> Self {
        RunState {
            case_index: 0,
            case_passed: 0,
            case_failed: 0,
            test_passed: 0,
            test_failed: 0,
            call_count: 0,
            pending_timeout_handle: None,
            expected_validations: 0,
            validated_so_far: 0,
            control_override: None,
            phase: Phase::Idle,
            current_failure: Failure::none(),
        }
    }

    /// Resets the per-case tallies and call counter; invoked at every
    /// `CaseSetup`.
    pub fn reset_for_case(&mut self) {
        self.case_passed = 0;
        self.case_failed = 0;
        self.call_count = 0;
        self.expected_validations = 0;
        self.validated_so_far = 0;
        self.control_override = None;
        self.current_failure = Failure::none();
    }
}

impl Default for RunState {
    fn default() -> Self {
        RunState::new()
    }
}
