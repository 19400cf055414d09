//! The return status a handler hands back to the case runner.

/// What a setup, teardown, or failure handler tells the runner to do next.
///
/// Kept disjoint from [`crate::control::Control`] and from
/// [`crate::failure::FailureReason`] even though the source this taxonomy is
/// drawn from overlaps all three in one numeric space (`STATUS_CONTINUE ==
/// STATUS_SUCCESS == 0`) -- see `DESIGN.md` for why that ambiguity is
/// resolved into separate sum types here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Keep running: proceed to the next step in the lifecycle.
    Continue,
    /// Skip straight to case teardown (or, from a case-teardown/test-level
    /// handler, abort the whole run).
    Abort,
    /// Treat the step that produced this status as a non-failure.
    Ignore,
}

impl Status {
    pub fn is_continue(self) -> bool {
        matches!(self, Status::Continue)
    }

    pub fn is_abort(self) -> bool {
        matches!(self, Status::Abort)
    }

    pub fn is_ignore(self) -> bool {
        matches!(self, Status::Ignore)
    }
}
