//! The four default handler sets, grounded line-for-line in the teacher
//! project's `default_handlers.cpp`: two continue-on-failure sets, one
//! abort-on-first-failure set, and the fatal-to-process self-test set.

use std::cell::RefCell;
use std::rc::Rc;

use crate::failure::FailureReason;
use crate::handlers::TeardownOutcome;
use crate::reporter::displayer::Reporter;
use crate::reporter::events::CaseEvent;
use crate::specification::{HandlersTable, SpecificationBuilder};
use crate::status::Status;

/// Small, resolved-once configuration passed into the default handler
/// constructors: verbosity is implicit in which set is chosen, so the only
/// remaining knob is whether assertion/setup/teardown failures are fatal to
/// the process (self-test mode) or merely reported.
#[derive(Debug, Clone, Copy, Default)]
pub struct HarnessConfig {
    pub fatal_on_assertion: bool,
}

fn case_failure_is_fatal(reason: FailureReason) -> bool {
    let bare = reason & !FailureReason::IGNORED;
    bare.intersects(
        FailureReason::TEST_SETUP | FailureReason::TEST_TEARDOWN | FailureReason::ASSERTION,
    )
}

/// Reports progress via `reporter` and continues running after a case
/// failure. This is the harness's ordinary default.
pub fn verbose_continue_handlers(reporter: Rc<RefCell<dyn Reporter>>) -> HandlersTable {
    let setup_reporter = reporter.clone();
    let teardown_reporter = reporter.clone();
    HandlersTable::new()
        .case_setup(move |view, index| {
            setup_reporter.borrow_mut().report(CaseEvent::CaseStarted {
                index: index + 1,
                description: view.description().to_string(),
            });
            Status::Continue
        })
        .case_teardown(move |view, passed, failed, failure| {
            teardown_reporter.borrow_mut().report(CaseEvent::CaseFinished {
                description: view.description().to_string(),
                passed,
                failed,
                failure,
            });
            TeardownOutcome::NEXT
        })
        .case_failure(|_view, _failure| Status::Continue)
}

/// Same reporting as [`verbose_continue_handlers`], but any case failure
/// aborts the whole run rather than continuing to the next case.
pub fn greentea_abort_handlers(reporter: Rc<RefCell<dyn Reporter>>) -> HandlersTable {
    let setup_reporter = reporter.clone();
    let teardown_reporter = reporter.clone();
    HandlersTable::new()
        .case_setup(move |view, index| {
            setup_reporter.borrow_mut().report(CaseEvent::CaseStarted {
                index: index + 1,
                description: view.description().to_string(),
            });
            Status::Continue
        })
        .case_teardown(move |view, passed, failed, failure| {
            teardown_reporter.borrow_mut().report(CaseEvent::CaseFinished {
                description: view.description().to_string(),
                passed,
                failed,
                failure,
            });
            if failure.is_failure() && !failure.is_ignored() {
                TeardownOutcome::Abort
            } else {
                TeardownOutcome::NEXT
            }
        })
        .case_failure(|_view, _failure| Status::Abort)
}

/// Identical progress reporting and continue-on-failure policy to
/// [`verbose_continue_handlers`]; kept as a separate named set because the
/// teacher project ships it separately for the greentea host protocol (the
/// wire protocol itself is out of scope here, see `spec.md` §1).
pub fn greentea_continue_handlers(reporter: Rc<RefCell<dyn Reporter>>) -> HandlersTable {
    verbose_continue_handlers(reporter)
}

/// Used by the crate's own self-tests: treats `TestSetup`/`TestTeardown`/
/// `Assertion` failures as fatal to the process. `report_fatal` is called
/// with the triggering failure so the caller's reporter can emit the
/// `{{failure}}\n{{end}}\n` sentinel and halt.
pub fn selftest_handlers(reporter: Rc<RefCell<dyn Reporter>>) -> HandlersTable {
    let setup_reporter = reporter.clone();
    let teardown_reporter = reporter.clone();
    let failure_reporter = reporter;
    HandlersTable::new()
        .case_setup(move |view, index| {
            setup_reporter.borrow_mut().report(CaseEvent::CaseStarted {
                index: index + 1,
                description: view.description().to_string(),
            });
            Status::Continue
        })
        .case_teardown(move |view, passed, failed, failure| {
            teardown_reporter.borrow_mut().report(CaseEvent::CaseFinished {
                description: view.description().to_string(),
                passed,
                failed,
                failure,
            });
            if case_failure_is_fatal(failure.reason) {
                TeardownOutcome::Abort
            } else {
                TeardownOutcome::NEXT
            }
        })
        .case_failure(move |_view, failure| {
            if case_failure_is_fatal(failure.reason) {
                failure_reporter
                    .borrow_mut()
                    .report(CaseEvent::FatalFailure { failure });
                Status::Abort
            } else {
                Status::Continue
            }
        })
}

/// Wires a `HandlersTable` from one of the default sets above into a
/// complete [`crate::specification::Specification`], adding the matching
/// `TestStarted`/`TestFinished` test-level reporting (and, for self-test
/// mode, fatal test-setup/teardown handling).
pub fn with_reporter_test_handlers(
    builder: SpecificationBuilder,
    reporter: Rc<RefCell<dyn Reporter>>,
    config: HarnessConfig,
) -> SpecificationBuilder {
    let setup_reporter = reporter.clone();
    let teardown_reporter = reporter;
    builder
        .test_setup(move |case_count| {
            setup_reporter
                .borrow_mut()
                .report(CaseEvent::TestStarted { case_count });
            Status::Continue
        })
        .test_teardown(move |passed, failed, failure| {
            if config.fatal_on_assertion && case_failure_is_fatal(failure.reason) {
                teardown_reporter
                    .borrow_mut()
                    .report(CaseEvent::FatalFailure { failure });
            }
            teardown_reporter.borrow_mut().report(CaseEvent::TestFinished {
                passed,
                failed,
                failure,
            });
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::Case;
    use crate::failure::{Failure, FailureLocation};
    use crate::reporter::displayer::{BufferSink, FatalMode, TextReporter};

    #[test]
    fn greentea_abort_handlers_abort_after_failing_case() {
        let reporter: Rc<RefCell<dyn Reporter>> =
            Rc::new(RefCell::new(TextReporter::new(BufferSink::default(), FatalMode::Report)));
        let defaults = greentea_abort_handlers(reporter);
        let _case = Case::new("x", || {});
        let view = crate::specification::CaseView::new("x", -1);
        let outcome = (defaults.default_case_teardown.as_ref().unwrap())(
            view,
            0,
            1,
            Failure::new(FailureReason::ASSERTION, FailureLocation::CaseHandler),
        );
        assert_eq!(outcome, TeardownOutcome::Abort);
    }
}
