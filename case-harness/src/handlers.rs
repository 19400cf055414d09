//! The handler and case-body callback shapes, and the default/ignore
//! sentinel slot that resolves them.

use std::rc::Rc;

use crate::control::Control;
use crate::failure::Failure;
use crate::specification::CaseView;
use crate::status::Status;

/// Called once before any case runs, with the total case count.
pub type TestSetupHandler = Rc<dyn Fn(usize) -> Status>;
/// Called once after the run ends (normally or aborted).
pub type TestTeardownHandler = Rc<dyn Fn(usize, usize, Failure)>;
/// Called before each case's body, with the case's index in the specification.
///
/// `Rc`, not `Box`: the same handler is commonly shared by every case that
/// falls back to the defaults table, and trait objects aren't `Clone`.
pub type CaseSetupHandler = Rc<dyn Fn(CaseView<'_>, usize) -> Status>;
/// Called after each case's body invocations are done.
pub type CaseTeardownHandler = Rc<dyn Fn(CaseView<'_>, usize, usize, Failure) -> TeardownOutcome>;
/// Called whenever a failure is raised anywhere in a case's lifecycle.
pub type CaseFailureHandler = Rc<dyn Fn(CaseView<'_>, Failure) -> Status>;

/// What a case-teardown handler tells the harness to do next: abort the
/// whole run, mask this case's failure as non-counting and continue, or
/// continue at a case index reached by a signed jump relative to the
/// current one (`1` is "next case", `0` is "repeat this case").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownOutcome {
    Abort,
    /// OR the `Ignored` bit into this case's failure, then advance as
    /// `Jump(1)` would.
    Ignore,
    Jump(i32),
}

impl TeardownOutcome {
    /// The default outcome for a teardown that does not override ordering:
    /// advance to the next case.
    pub const NEXT: TeardownOutcome = TeardownOutcome::Jump(1);
}

/// The interface a case body uses to call back into the running case: raise
/// a validation (immediately, or scheduled for later through the
/// scheduler). Kept as a narrow trait rather than exposing the full runner
/// context, so `handlers`/`case` do not need to know about the runner's
/// internals.
pub trait CaseContext {
    /// Calls `validate_callback` synchronously, from within the body's own
    /// invocation. If the case is not yet `Awaiting`, this is recorded as a
    /// premature validation and credited to the next await.
    fn validate(&mut self, attrs: Option<Control>);

    /// Schedules a validation to arrive after `delay_ms`, via the
    /// scheduler -- the in-process analogue of an interrupt posting a
    /// deferred `do_validate` callback (see the crate-level concurrency
    /// notes).
    fn schedule_validation(&mut self, delay_ms: u32, attrs: Option<Control>);
}

/// A control-returning case body: runs once per invocation, `call_count`
/// 1-based, deciding through its return value whether (and how) the runner
/// repeats it.
pub type ControlBody = Box<dyn FnMut(u32, &mut dyn CaseContext) -> Control>;

/// A case body, either side of the plain/control-returning union described
/// in the design notes.
pub enum CaseBody {
    /// The case is classified empty at setup and falls straight through to
    /// teardown with `EmptyCase | Cases`.
    Empty,
    /// Runs once; an implicit `Control::NEXT` is assumed on return.
    Plain(Box<dyn FnMut()>),
    /// Runs once per invocation; `call_count` is 1-based. The returned
    /// `Control` decides whether (and how) the runner repeats it.
    Control(ControlBody),
}

/// A handler slot: either the case's own value, the "use the defaults
/// table" sentinel, or the "skip this step" sentinel. Resolved once, at
/// `Specification` construction, against the owning table's default value.
#[derive(Default)]
pub enum HandlerSlot<T> {
    /// Use whatever the defaults table has for this slot.
    #[default]
    Default,
    /// Skip this step entirely.
    Ignore,
    /// Use this handler.
    Explicit(T),
}

impl<T> HandlerSlot<T> {
    /// Resolves this slot against `default`, consuming both. `Ignore`
    /// resolves to `None`; `Default` resolves to `default`; `Explicit`
    /// resolves to its own value.
    pub fn resolve(self, default: Option<T>) -> Option<T> {
        match self {
            HandlerSlot::Default => default,
            HandlerSlot::Ignore => None,
            HandlerSlot::Explicit(handler) => Some(handler),
        }
    }
}
