//! The event stream a [`crate::reporter::displayer::Reporter`] consumes,
//! decoupled from how (or whether) it gets rendered to text.

use crate::failure::Failure;

/// A point-in-time event emitted by the harness as it drives a run.
#[derive(Debug, Clone)]
pub enum CaseEvent {
    TestStarted {
        case_count: usize,
    },
    CaseStarted {
        /// 1-based case number for human-facing display, not the 0-based
        /// index used to address `Specification::cases`.
        index: usize,
        description: String,
    },
    CaseFinished {
        description: String,
        passed: usize,
        failed: usize,
        failure: Failure,
    },
    TestFinished {
        passed: usize,
        failed: usize,
        failure: Failure,
    },
    /// A failure classification fatal enough that host-coordinated mode
    /// halts after reporting it.
    FatalFailure {
        failure: Failure,
    },
}
