//! The testable-property invariants and literal scenarios: exercises the
//! full case runner through [`support::VirtualScheduler`] rather than any
//! real timer.

mod support;

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;

use case_harness::*;
use case_harness::reporter::defaults::verbose_continue_handlers;
use case_harness::reporter::{BufferSink, FatalMode, Reporter, TextReporter};
use support::VirtualScheduler;

fn harness() -> Harness {
    Harness::new(Rc::new(VirtualScheduler::new()))
}

// ---- Scenario 1: basic repeat --------------------------------------------

#[test]
fn scenario_basic_repeat() {
    let call_log = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&call_log);

    let case = Case::with_control("repeat", move |call_count, _ctx| {
        log.borrow_mut().push(call_count);
        if call_count < 6 {
            Control::repeat(RepeatMode::HandlerOnly)
        } else {
            Control::NEXT
        }
    });

    let spec = Specification::new(vec![case], HandlersTable::new());
    let summary = harness().run(spec).unwrap();

    assert_eq!(*call_log.borrow(), vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(summary.test_passed, 1);
    assert_eq!(summary.test_failed, 0);
}

// ---- Scenario 2: async success --------------------------------------------

#[test]
fn scenario_async_success() {
    let case = Case::with_control("async", |_call_count, ctx| {
        ctx.schedule_validation(100, None);
        Control::timeout(200)
    })
    .with_timeout(200);

    let spec = Specification::new(vec![case], HandlersTable::new());
    let summary = harness().run(spec).unwrap();

    assert_eq!(summary.test_passed, 1);
    assert_eq!(summary.test_failed, 0);
}

// ---- Scenario 3: async failure ---------------------------------------------

#[test]
fn scenario_async_failure_reports_timeout() {
    let reporter: Rc<RefCell<TextReporter<BufferSink>>> = Rc::new(RefCell::new(TextReporter::new(
        BufferSink::default(),
        FatalMode::Report,
    )));
    let reporter_dyn: Rc<RefCell<dyn Reporter>> = reporter.clone();

    let case = Case::with_control("async", |_call_count, ctx| {
        ctx.schedule_validation(300, None);
        Control::timeout(200)
    })
    .with_timeout(200);

    let defaults = verbose_continue_handlers(reporter_dyn);
    let spec = Specification::builder(vec![case], defaults).build();

    let summary = harness().run(spec).unwrap();

    assert_eq!(summary.test_passed, 0);
    assert_eq!(summary.test_failed, 1);

    let lines = reporter.borrow().sink().lines.clone();
    assert!(
        lines.iter().any(|line| line.contains("reason 'timeout'")),
        "expected a reported line mentioning the timeout reason, got: {lines:?}"
    );
}

// ---- Scenario 4: ordered selection via teardown relative jumps -----------

#[test]
fn scenario_ordered_selection_via_teardown_jumps() {
    // Source-order positions 0/1/2 hold "case0"/"case1"/"case2". Their
    // teardown jumps send dispatch order0 -> index2 -> index1, rather than
    // the default sequential 0 -> 1 -> 2, with every case visited exactly
    // once.
    let dispatch_order = Rc::new(RefCell::new(Vec::new()));

    let order0 = Rc::clone(&dispatch_order);
    let case0 = Case::new("case0", || {}).teardown(move |view, _passed, _failed, _failure| {
        order0.borrow_mut().push(view.description().to_string());
        TeardownOutcome::Jump(2)
    });

    let order1 = Rc::clone(&dispatch_order);
    let case1 = Case::new("case1", || {}).teardown(move |view, _passed, _failed, _failure| {
        order1.borrow_mut().push(view.description().to_string());
        TeardownOutcome::Jump(2)
    });

    let order2 = Rc::clone(&dispatch_order);
    let case2 = Case::new("case2", || {}).teardown(move |view, _passed, _failed, _failure| {
        order2.borrow_mut().push(view.description().to_string());
        TeardownOutcome::Jump(-1)
    });

    let spec = Specification::new(vec![case0, case1, case2], HandlersTable::new());
    let summary = harness().run(spec).unwrap();

    assert_eq!(*dispatch_order.borrow(), vec!["case0", "case2", "case1"]);
    assert_eq!(summary.test_passed, 3);
    assert_eq!(summary.test_failed, 0);
}

// ---- Scenario 5: premature validation (single) ---------------------------

#[test]
fn scenario_premature_validation_single() {
    let case = Case::with_control("premature", |_call_count, ctx| {
        ctx.validate(None);
        Control::await_validation()
    })
    .with_timeout(0);

    let spec = Specification::new(vec![case], HandlersTable::new());
    let summary = harness().run(spec).unwrap();

    assert_eq!(summary.test_passed, 1);
    assert_eq!(summary.test_failed, 0);
}

// ---- Scenario 6: multiple premature validations --------------------------

#[test]
fn scenario_multiple_premature_validations() {
    let case = Case::with_control("premature-many", |_call_count, ctx| {
        ctx.validate(None);
        ctx.validate(None);
        ctx.validate(None);
        ctx.validate(None);
        Control::await_validation()
    })
    .with_timeout(0);

    let spec = Specification::new(vec![case], HandlersTable::new());
    let summary = harness().run(spec).unwrap();

    assert_eq!(summary.test_passed, 1);
    assert_eq!(summary.test_failed, 0);
}

// ---- P1: exactly one setup iff one teardown -------------------------------

#[test]
fn p1_setup_and_teardown_counts_match() {
    let setups = Rc::new(RefCell::new(0));
    let teardowns = Rc::new(RefCell::new(0));
    let s = Rc::clone(&setups);
    let t = Rc::clone(&teardowns);

    let defaults = HandlersTable::new()
        .case_setup(move |_view, _index| {
            *s.borrow_mut() += 1;
            Status::Continue
        })
        .case_teardown(move |_view, _passed, _failed, _failure| {
            *t.borrow_mut() += 1;
            TeardownOutcome::NEXT
        });

    let cases = vec![Case::new("a", || {}), Case::new("b", || {})];
    let spec = Specification::new(cases, defaults);
    harness().run(spec).unwrap();

    assert_eq!(*setups.borrow(), 2);
    assert_eq!(*teardowns.borrow(), 2);
}

// ---- P3: passed + failed = cases run --------------------------------------

#[test]
fn p3_passed_plus_failed_equals_cases_run() {
    let cases = vec![
        Case::new("a", || {}),
        Case::new("b", || {}).setup(|_view, _index| Status::Abort),
        Case::new("c", || {}),
    ];
    let spec = Specification::new(cases, HandlersTable::new());
    let summary = harness().run(spec).unwrap();

    assert_eq!(summary.test_passed + summary.test_failed, 3);
    assert_eq!(summary.test_failed, 1);
}

// ---- P5: RepeatAllOnTimeout + Timeout(ms) repeats until resolved ----------

#[test]
fn p5_repeat_all_on_timeout_until_validated() {
    let attempt = Rc::new(RefCell::new(0));
    let a = Rc::clone(&attempt);

    let case = Case::with_control("retry-until-validated", move |_call_count, ctx| {
        let current = {
            let mut n = a.borrow_mut();
            *n += 1;
            *n
        };
        if current >= 3 {
            ctx.validate(None);
        }
        Control {
            repeat: RepeatMode::AllOnTimeout,
            timeout: TimeoutPolicy::AwaitMs(10),
        }
    })
    .with_timeout(10);

    let setups = Rc::new(RefCell::new(0));
    let s = Rc::clone(&setups);
    let defaults = HandlersTable::new().case_setup(move |_view, _index| {
        *s.borrow_mut() += 1;
        Status::Continue
    });

    let spec = Specification::new(vec![case], defaults);
    let summary = harness().run(spec).unwrap();

    assert_eq!(*attempt.borrow(), 3);
    assert_eq!(*setups.borrow(), 3);
    assert_eq!(summary.test_passed, 1);
    assert_eq!(summary.test_failed, 0);
}

// ---- P6: Ignored bit does not increment test_failed -----------------------

#[test]
fn p6_ignored_failure_does_not_count_as_failed() {
    let case = Case::with_control("ignored-failure", |_k, _ctx| Control::NEXT)
        .setup(|_view, _index| Status::Abort)
        .teardown(|_view, _passed, _failed, _failure| TeardownOutcome::Ignore);

    let spec = Specification::new(vec![case], HandlersTable::new());
    let summary = harness().run(spec).unwrap();

    assert_eq!(summary.test_passed, 1);
    assert_eq!(summary.test_failed, 0);
}

// ---- P2: call_count is 1-based, including across timeout-triggered repeats

#[test]
fn p2_call_count_is_one_based_across_timeout_repeats() {
    let observed = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::clone(&observed);

    let case = Case::with_control("retry-on-timeout", move |call_count, _ctx| {
        seen.borrow_mut().push(call_count);
        if call_count < 3 {
            Control {
                repeat: RepeatMode::HandlerOnlyOnTimeout,
                timeout: TimeoutPolicy::AwaitMs(10),
            }
        } else {
            Control::NEXT
        }
    })
    .with_timeout(10);

    let spec = Specification::new(vec![case], HandlersTable::new());
    let summary = harness().run(spec).unwrap();

    assert_eq!(*observed.borrow(), vec![1, 2, 3]);
    assert_eq!(summary.test_passed, 1);
}

// ---- Regression: a genuine (non-premature) validation must be awaited on
// every repeated iteration, not just the first -----------------------------

#[test]
fn repeated_genuine_validation_is_awaited_every_iteration() {
    let scheduler = Rc::new(VirtualScheduler::new());
    let call_log = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&call_log);

    let case = Case::with_control("repeat-validate", move |call_count, ctx| {
        log.borrow_mut().push(call_count);
        ctx.schedule_validation(5, None);
        if call_count < 3 {
            Control {
                repeat: RepeatMode::HandlerOnly,
                timeout: TimeoutPolicy::AwaitMs(50),
            }
        } else {
            Control::timeout(50)
        }
    })
    .with_timeout(50);

    let spec = Specification::new(vec![case], HandlersTable::new());
    let harness = Harness::new(Rc::clone(&scheduler) as Rc<dyn Scheduler>);
    let summary = harness.run(spec).unwrap();

    assert_eq!(*call_log.borrow(), vec![1, 2, 3]);
    assert_eq!(summary.test_passed, 1);
    assert_eq!(summary.test_failed, 0);

    // Each of the three iterations schedules its own 5ms validation. If a
    // stale `validated_so_far` credit from an earlier iteration's genuine
    // await leaked forward, later iterations would resolve immediately
    // instead of waiting, and the virtual clock would fall well short of
    // the 15ms three genuine waits require.
    assert!(
        scheduler.now() >= 15,
        "expected every iteration to actually await its own validation, virtual clock only reached {}",
        scheduler.now()
    );
}

// ---- P4: a discarded premature validation does not corrupt the next case -

#[test]
fn p4_premature_validation_after_teardown_begins_is_discarded() {
    // The first case validates twice before returning `Next`: its single
    // `Awaiting` never even starts (synchronous body), so both credits are
    // irrelevant to it. The second case must still see a clean `RunState`.
    let case_a = Case::with_control("a", |_call_count, ctx| {
        ctx.validate(None);
        ctx.validate(None);
        Control::NEXT
    });

    let call_count_b = Rc::new(RefCell::new(0));
    let seen_b = Rc::clone(&call_count_b);
    let case_b = Case::with_control("b", move |call_count, _ctx| {
        *seen_b.borrow_mut() = call_count;
        Control::NEXT
    });

    let spec = Specification::new(vec![case_a, case_b], HandlersTable::new());
    let summary = harness().run(spec).unwrap();

    assert_eq!(*call_count_b.borrow(), 1);
    assert_eq!(summary.test_passed, 2);
    assert_eq!(summary.test_failed, 0);
}
