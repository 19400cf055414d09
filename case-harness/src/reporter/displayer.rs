//! Renders the [`CaseEvent`] stream into the exact text lines the harness's
//! default handler sets emit, grounded line-for-line in the teacher
//! project's `verbose_*`/`selftest_*` default handlers.

use crate::failure::FailureReason;
use crate::reporter::events::CaseEvent;

/// A pluggable output sink: anything that can take a rendered line.
/// Decoupled from the event stream itself, matching the dispatcher/executor
/// split the reporter is grounded on.
pub trait ReportSink {
    fn emit_line(&mut self, line: &str);
}

/// A sink that writes to stdout, for binaries that don't need to capture
/// output.
pub struct StdoutSink;

impl ReportSink for StdoutSink {
    fn emit_line(&mut self, line: &str) {
        println!("{line}");
    }
}

/// A sink that accumulates lines in memory, for tests and embedders that
/// want to inspect the exact output produced.
#[derive(Default)]
pub struct BufferSink {
    pub lines: Vec<String>,
}

impl ReportSink for BufferSink {
    fn emit_line(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}

/// Consumes the harness's event stream. `TextReporter` is the only
/// implementation shipped; it exists as a trait so an embedder can swap in
/// something that skips formatting entirely (e.g. structured JSON) without
/// touching the harness core.
pub trait Reporter {
    fn report(&mut self, event: CaseEvent);
}

/// Whether a fatal classification halts the process (selftest mode) after
/// reporting the `{{failure}}\n{{end}}\n` sentinel, or is just reported and
/// left to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalMode {
    /// Report and continue; the harness's own run loop decides what happens
    /// next (matches `greentea_*`/`verbose_*` handler sets).
    Report,
    /// Report the sentinel and signal that the process should halt (matches
    /// `selftest_handlers`' fatal-to-process behavior).
    Halt,
}

/// Renders [`CaseEvent`]s as the verbose text lines from `spec.md` §6.
pub struct TextReporter<S: ReportSink> {
    sink: S,
    fatal_mode: FatalMode,
}

impl<S: ReportSink> TextReporter<S> {
    pub fn new(sink: S, fatal_mode: FatalMode) -> Self {
        TextReporter { sink, fatal_mode }
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn reason_suffix(reason: FailureReason) -> String {
        let bare = reason & !FailureReason::IGNORED;
        if bare.is_empty() {
            String::new()
        } else {
            format!(" with reason '{bare}'")
        }
    }
}

impl<S: ReportSink> Reporter for TextReporter<S> {
    fn report(&mut self, event: CaseEvent) {
        match event {
            CaseEvent::TestStarted { case_count } => {
                self.sink
                    .emit_line(&format!(">>> Running {case_count} test cases..."));
            }
            CaseEvent::CaseStarted { index, description } => {
                self.sink
                    .emit_line(&format!(">>> Running case #{index}: '{description}'..."));
            }
            CaseEvent::CaseFinished {
                description,
                passed,
                failed,
                failure,
            } => {
                let suffix = Self::reason_suffix(failure.reason);
                self.sink.emit_line(&format!(
                    ">>> '{description}': {passed} passed, {failed} failed{suffix}"
                ));
            }
            CaseEvent::TestFinished {
                passed,
                failed,
                failure,
            } => {
                let suffix = Self::reason_suffix(failure.reason);
                self.sink.emit_line(&format!(
                    ">>> Test cases: {passed} passed, {failed} failed{suffix}"
                ));
                if failed > 0 {
                    self.sink.emit_line(">>> TESTS FAILED!");
                }
            }
            CaseEvent::FatalFailure { failure } => {
                if self.fatal_mode == FatalMode::Halt {
                    let bare = failure.reason & !FailureReason::IGNORED;
                    self.sink.emit_line(&format!(
                        ">>> failure with reason '{bare}' during '{}'",
                        failure.location
                    ));
                    // The sentinel itself is unparameterized: a host reading
                    // for it matches the bare literal, not a templated line.
                    self.sink.emit_line("{{failure}}");
                    self.sink.emit_line("{{end}}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::{Failure, FailureLocation};

    fn reporter() -> TextReporter<BufferSink> {
        TextReporter::new(BufferSink::default(), FatalMode::Report)
    }

    #[test]
    fn renders_test_started_line() {
        let mut r = reporter();
        r.report(CaseEvent::TestStarted { case_count: 3 });
        assert_eq!(r.into_sink().lines, vec![">>> Running 3 test cases..."]);
    }

    #[test]
    fn renders_case_started_with_one_based_index() {
        let mut r = reporter();
        r.report(CaseEvent::CaseStarted {
            index: 1,
            description: "first case".into(),
        });
        assert_eq!(
            r.into_sink().lines,
            vec![">>> Running case #1: 'first case'..."]
        );
    }

    #[test]
    fn renders_case_finished_without_reason() {
        let mut r = reporter();
        r.report(CaseEvent::CaseFinished {
            description: "repeat".into(),
            passed: 1,
            failed: 0,
            failure: Failure::none(),
        });
        assert_eq!(
            r.into_sink().lines,
            vec![">>> 'repeat': 1 passed, 0 failed"]
        );
    }

    #[test]
    fn renders_test_finished_with_timeout_reason_and_failed_banner() {
        let mut r = reporter();
        r.report(CaseEvent::TestFinished {
            passed: 0,
            failed: 1,
            failure: Failure::new(FailureReason::TIMEOUT, FailureLocation::CaseHandler),
        });
        assert_eq!(
            r.into_sink().lines,
            vec![
                ">>> Test cases: 0 passed, 1 failed with reason 'timeout'",
                ">>> TESTS FAILED!",
            ]
        );
    }

    #[test]
    fn halt_mode_emits_sentinel_on_fatal_failure() {
        let mut r = TextReporter::new(BufferSink::default(), FatalMode::Halt);
        r.report(CaseEvent::FatalFailure {
            failure: Failure::new(FailureReason::TEST_SETUP, FailureLocation::TestSetup),
        });
        let lines = r.into_sink().lines;
        assert_eq!(lines[0], ">>> failure with reason 'test setup' during 'test setup'");
        assert_eq!(lines[1], "{{failure}}");
        assert_eq!(lines[2], "{{end}}");
    }

    #[test]
    fn report_mode_emits_nothing_on_fatal_failure() {
        let mut r = reporter();
        r.report(CaseEvent::FatalFailure {
            failure: Failure::new(FailureReason::ASSERTION, FailureLocation::CaseHandler),
        });
        assert!(r.into_sink().lines.is_empty());
    }
}
