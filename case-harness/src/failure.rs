//! Failure classification: why a case failed, where, and whether it counts.

use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// The reasons a case (or the test run as a whole) can be marked failed.
    ///
    /// Kept as a bitset rather than an enum because a single case can fail
    /// for more than one reason before its teardown runs (e.g. a timeout
    /// racing an assertion), and because `Ignored` is orthogonal to all of
    /// them -- it modifies a reason rather than naming one. The source this
    /// taxonomy is drawn from overloads the same numeric space for both
    /// "failure reason" and "handler return status"; here they are disjoint
    /// types (`FailureReason` and `Status`) by design.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FailureReason: u16 {
        const NONE          = 0;
        const UNKNOWN       = 1 << 0;
        /// Roll-up reason set at test-teardown when any case contributed a
        /// non-ignored failure.
        const CASES         = 1 << 1;
        const EMPTY_CASE    = 1 << 2;
        const TEST_SETUP    = 1 << 3;
        const TEST_TEARDOWN = 1 << 4;
        const CASE_SETUP    = 1 << 5;
        const CASE_HANDLER  = 1 << 6;
        const CASE_TEARDOWN = 1 << 7;
        const TIMEOUT       = 1 << 8;
        const ASSERTION     = 1 << 9;
        /// Set alongside any other bit to mark the failure as non-fatal:
        /// it still passes through the classifier, but does not increment
        /// the failed-case counter.
        const IGNORED       = 1 << 10;
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bare = *self & !FailureReason::IGNORED;
        let name = if bare.contains(FailureReason::ASSERTION) {
            "assertion"
        } else if bare.contains(FailureReason::TIMEOUT) {
            "timeout"
        } else if bare.contains(FailureReason::CASE_TEARDOWN) {
            "case teardown"
        } else if bare.contains(FailureReason::CASE_HANDLER) {
            "case handler"
        } else if bare.contains(FailureReason::CASE_SETUP) {
            "case setup"
        } else if bare.contains(FailureReason::TEST_TEARDOWN) {
            "test teardown"
        } else if bare.contains(FailureReason::TEST_SETUP) {
            "test setup"
        } else if bare.contains(FailureReason::EMPTY_CASE) {
            "empty case"
        } else if bare.contains(FailureReason::CASES) {
            "cases"
        } else if bare.contains(FailureReason::UNKNOWN) {
            "unknown"
        } else {
            "none"
        };
        f.write_str(name)
    }
}

/// Where a failure was raised from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureLocation {
    None,
    TestSetup,
    TestTeardown,
    CaseSetup,
    CaseHandler,
    CaseTeardown,
    UnknownHandler,
    Scheduler,
}

impl fmt::Display for FailureLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureLocation::None => "none",
            FailureLocation::TestSetup => "test setup",
            FailureLocation::TestTeardown => "test teardown",
            FailureLocation::CaseSetup => "case setup",
            FailureLocation::CaseHandler => "case handler",
            FailureLocation::CaseTeardown => "case teardown",
            FailureLocation::UnknownHandler => "unknown handler",
            FailureLocation::Scheduler => "scheduler",
        };
        f.write_str(name)
    }
}

/// A classified failure: a reason bitset plus the location it was raised
/// from. `Ignored` lives inside `reason` rather than as a separate field so
/// a reporter can test it with the same bit operations it uses for the rest
/// of the reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Failure {
    pub reason: FailureReason,
    pub location: FailureLocation,
}

impl Failure {
    pub fn none() -> Self {
        Failure {
            reason: FailureReason::NONE,
            location: FailureLocation::None,
        }
    }

    pub fn new(reason: FailureReason, location: FailureLocation) -> Self {
        Failure { reason, location }
    }

    /// Merges `reason` into this failure's reason bitset, keeping whichever
    /// location was already set (the first raise in a case wins the
    /// location, matching `raise_failure`'s "merges into the current-case
    /// bitset" rule).
    pub fn merge(self, reason: FailureReason) -> Self {
        Failure {
            reason: self.reason | reason,
            ..self
        }
    }

    /// Returns a copy of this failure with the `Ignored` bit set.
    pub fn ignored(self) -> Self {
        Failure {
            reason: self.reason | FailureReason::IGNORED,
            ..self
        }
    }

    /// Whether this failure is marked ignored.
    pub fn is_ignored(&self) -> bool {
        self.reason.contains(FailureReason::IGNORED)
    }

    /// Whether any reason bit beyond `Ignored` is set.
    pub fn is_failure(&self) -> bool {
        !(self.reason & !FailureReason::IGNORED).is_empty()
    }

    /// Whether this location can never be continued past -- the harness
    /// must abort the run regardless of what the case-failure handler
    /// returns.
    pub fn is_fatal_location(&self) -> bool {
        matches!(
            self.location,
            FailureLocation::TestSetup | FailureLocation::TestTeardown
        )
    }
}
