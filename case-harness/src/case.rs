//! The case descriptor: an immutable tuple of description, handlers, and
//! timeout hint.

use std::rc::Rc;

use crate::handlers::{CaseBody, CaseFailureHandler, CaseSetupHandler, CaseTeardownHandler, HandlerSlot};
use crate::specification::CaseView;

/// `default_timeout_ms` of a case that must run synchronously: no
/// asynchronous await is ever permitted, regardless of what its body
/// returns.
pub const SYNCHRONOUS: i32 = -1;

/// A single named test unit. Immutable once built; its handler slots are
/// resolved once, when it is folded into a [`crate::specification::Specification`].
pub struct Case {
    pub(crate) description: String,
    pub(crate) body: CaseBody,
    pub(crate) setup_handler: HandlerSlot<CaseSetupHandler>,
    pub(crate) teardown_handler: HandlerSlot<CaseTeardownHandler>,
    pub(crate) failure_handler: HandlerSlot<CaseFailureHandler>,
    pub(crate) default_timeout_ms: i32,
}

impl Case {
    /// A case with a plain, non-repeating body, using the specification's
    /// default handlers.
    pub fn new(description: impl Into<String>, body: impl FnMut() + 'static) -> Self {
        Case {
            description: description.into(),
            body: CaseBody::Plain(Box::new(body)),
            setup_handler: HandlerSlot::Default,
            teardown_handler: HandlerSlot::Default,
            failure_handler: HandlerSlot::Default,
            default_timeout_ms: SYNCHRONOUS,
        }
    }

    /// A case whose body returns a [`crate::control::Control`] value each
    /// invocation, using the specification's default handlers. Synchronous
    /// (`default_timeout_ms = -1`) unless built `with_timeout`.
    pub fn with_control(
        description: impl Into<String>,
        body: impl FnMut(u32, &mut dyn crate::handlers::CaseContext) -> crate::control::Control + 'static,
    ) -> Self {
        Case {
            description: description.into(),
            body: CaseBody::Control(Box::new(body)),
            setup_handler: HandlerSlot::Default,
            teardown_handler: HandlerSlot::Default,
            failure_handler: HandlerSlot::Default,
            default_timeout_ms: SYNCHRONOUS,
        }
    }

    /// A case that is classified empty at setup: it proceeds straight to
    /// teardown with `EmptyCase | Cases` and the test is marked failed but
    /// continues.
    pub fn empty(description: impl Into<String>) -> Self {
        Case {
            description: description.into(),
            body: CaseBody::Empty,
            setup_handler: HandlerSlot::Default,
            teardown_handler: HandlerSlot::Default,
            failure_handler: HandlerSlot::Default,
            default_timeout_ms: SYNCHRONOUS,
        }
    }

    /// Named constructor for an async-capable case with an explicit default
    /// timeout, mirroring `AsyncCase` as a distinct constructor over the
    /// same descriptor rather than only a field.
    pub fn with_timeout(mut self, timeout_ms: u32) -> Self {
        self.default_timeout_ms = timeout_ms as i32;
        self
    }

    pub fn setup(mut self, handler: impl Fn(CaseView<'_>, usize) -> crate::status::Status + 'static) -> Self {
        self.setup_handler = HandlerSlot::Explicit(Rc::new(handler));
        self
    }

    pub fn teardown(
        mut self,
        handler: impl Fn(CaseView<'_>, usize, usize, crate::failure::Failure) -> crate::handlers::TeardownOutcome + 'static,
    ) -> Self {
        self.teardown_handler = HandlerSlot::Explicit(Rc::new(handler));
        self
    }

    pub fn on_failure(mut self, handler: impl Fn(CaseView<'_>, crate::failure::Failure) -> crate::status::Status + 'static) -> Self {
        self.failure_handler = HandlerSlot::Explicit(Rc::new(handler));
        self
    }

    /// Skip setup entirely for this case.
    pub fn ignore_setup(mut self) -> Self {
        self.setup_handler = HandlerSlot::Ignore;
        self
    }

    /// Skip teardown entirely for this case.
    pub fn ignore_teardown(mut self) -> Self {
        self.teardown_handler = HandlerSlot::Ignore;
        self
    }

    /// Skip the failure handler entirely for this case.
    pub fn ignore_failure(mut self) -> Self {
        self.failure_handler = HandlerSlot::Ignore;
        self
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether this case's body is the empty sentinel.
    pub fn is_empty(&self) -> bool {
        matches!(self.body, CaseBody::Empty)
    }

    /// Whether this case may ever enter `Awaiting`.
    pub fn is_async_capable(&self) -> bool {
        self.default_timeout_ms >= 0
    }
}
