//! The handlers table (component E) and the specification (component D):
//! an ordered sequence of cases plus test-level handlers, resolved once at
//! construction and immutable thereafter.

use std::rc::Rc;

use crate::case::Case;
use crate::failure::Failure;
use crate::handlers::{
    CaseBody, CaseFailureHandler, CaseSetupHandler, CaseTeardownHandler, TeardownOutcome,
    TestSetupHandler, TestTeardownHandler,
};
use crate::status::Status;

/// The three case-level default callbacks a [`Specification`] resolves
/// `HandlerSlot::Default` slots against. Test-level setup/teardown have no
/// default sentinel -- they are supplied directly to [`Specification::new`].
#[derive(Default)]
pub struct HandlersTable {
    pub default_case_setup: Option<CaseSetupHandler>,
    pub default_case_teardown: Option<CaseTeardownHandler>,
    pub default_case_failure: Option<CaseFailureHandler>,
}

impl HandlersTable {
    pub fn new() -> Self {
        HandlersTable::default()
    }

    pub fn case_setup(mut self, handler: impl Fn(CaseView<'_>, usize) -> Status + 'static) -> Self {
        self.default_case_setup = Some(Rc::new(handler));
        self
    }

    pub fn case_teardown(
        mut self,
        handler: impl Fn(CaseView<'_>, usize, usize, Failure) -> TeardownOutcome + 'static,
    ) -> Self {
        self.default_case_teardown = Some(Rc::new(handler));
        self
    }

    pub fn case_failure(mut self, handler: impl Fn(CaseView<'_>, Failure) -> Status + 'static) -> Self {
        self.default_case_failure = Some(Rc::new(handler));
        self
    }
}

/// A case after its handler slots have been resolved against a
/// [`HandlersTable`]: `Default` replaced by the table's entry, `Ignore`
/// replaced by `None`, `Explicit` kept as supplied.
pub(crate) struct ResolvedCase {
    pub description: String,
    pub body: CaseBody,
    pub setup_handler: Option<CaseSetupHandler>,
    pub teardown_handler: Option<CaseTeardownHandler>,
    pub failure_handler: Option<CaseFailureHandler>,
    pub default_timeout_ms: i32,
}

impl ResolvedCase {
    pub fn is_empty(&self) -> bool {
        matches!(self.body, CaseBody::Empty)
    }

    pub fn is_async_capable(&self) -> bool {
        self.default_timeout_ms >= 0
    }

    /// A borrow of this resolved case shaped like the public [`Case`], for
    /// handlers that take `&Case` -- they only ever need description and
    /// timeout, never the body or other handlers.
    pub fn as_case_view(&self) -> CaseView<'_> {
        CaseView {
            description: &self.description,
            default_timeout_ms: self.default_timeout_ms,
        }
    }
}

/// The read-only view of a case passed into setup/teardown/failure
/// handlers while a run is in progress. `Case` itself is only a
/// construction-time builder; this is what handler code actually sees.
pub struct CaseView<'a> {
    description: &'a str,
    default_timeout_ms: i32,
}

impl<'a> CaseView<'a> {
    pub fn new(description: &'a str, default_timeout_ms: i32) -> Self {
        CaseView {
            description,
            default_timeout_ms,
        }
    }

    pub fn description(&self) -> &str {
        self.description
    }

    pub fn is_async_capable(&self) -> bool {
        self.default_timeout_ms >= 0
    }
}

/// An ordered sequence of cases plus test-level handlers. Construction-only:
/// immutable once built, and immutable for the lifetime of a `run`.
pub struct Specification {
    pub(crate) test_setup_handler: Option<TestSetupHandler>,
    pub(crate) test_teardown_handler: Option<TestTeardownHandler>,
    pub(crate) cases: Vec<ResolvedCase>,
}

impl Specification {
    /// Resolves every case's unset handler slots against `defaults`
    /// immediately; the result is immutable for the remainder of this
    /// specification's life.
    pub fn new(cases: Vec<Case>, defaults: HandlersTable) -> Self {
        SpecificationBuilder::new(cases, defaults).build()
    }

    /// A builder that also accepts test-level setup/teardown handlers.
    pub fn builder(cases: Vec<Case>, defaults: HandlersTable) -> SpecificationBuilder {
        SpecificationBuilder::new(cases, defaults)
    }

    pub fn case_count(&self) -> usize {
        self.cases.len()
    }
}

/// Builds a [`Specification`], accepting test-level handlers as plain
/// closures (converted to `Rc` internally) rather than requiring the caller
/// to box them.
pub struct SpecificationBuilder {
    cases: Vec<Case>,
    defaults: HandlersTable,
    test_setup_handler: Option<TestSetupHandler>,
    test_teardown_handler: Option<TestTeardownHandler>,
}

impl SpecificationBuilder {
    fn new(cases: Vec<Case>, defaults: HandlersTable) -> Self {
        SpecificationBuilder {
            cases,
            defaults,
            test_setup_handler: None,
            test_teardown_handler: None,
        }
    }

    pub fn test_setup(mut self, handler: impl Fn(usize) -> Status + 'static) -> Self {
        self.test_setup_handler = Some(Rc::new(handler));
        self
    }

    pub fn test_teardown(mut self, handler: impl Fn(usize, usize, Failure) + 'static) -> Self {
        self.test_teardown_handler = Some(Rc::new(handler));
        self
    }

    pub fn build(self) -> Specification {
        let HandlersTable {
            default_case_setup,
            default_case_teardown,
            default_case_failure,
        } = self.defaults;

        let resolved = self
            .cases
            .into_iter()
            .map(|case| ResolvedCase {
                description: case.description,
                body: case.body,
                setup_handler: case.setup_handler.resolve(default_case_setup.clone()),
                teardown_handler: case.teardown_handler.resolve(default_case_teardown.clone()),
                failure_handler: case.failure_handler.resolve(default_case_failure.clone()),
                default_timeout_ms: case.default_timeout_ms,
            })
            .collect();

        Specification {
            test_setup_handler: self.test_setup_handler,
            test_teardown_handler: self.test_teardown_handler,
            cases: resolved,
        }
    }
}
