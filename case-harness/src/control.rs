//! The value a case body returns (or implicitly carries) to steer the runner.

use thiserror::Error;

/// How the case runner should repeat (or not repeat) after this body
/// invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepeatMode {
    /// Advance past this case; no repeat.
    #[default]
    None,
    /// Re-invoke the body only, keeping setup state.
    HandlerOnly,
    /// Re-run setup and body.
    All,
    /// Like `HandlerOnly`, but only when the await times out.
    HandlerOnlyOnTimeout,
    /// Like `All`, but only when the await times out.
    AllOnTimeout,
    /// Explicit cancellation of any repeat that would otherwise apply.
    NoRepeat,
}

/// How the case runner should wait (if at all) for an asynchronous
/// validation before completing this body invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeoutPolicy {
    /// Use whatever the case's `default_timeout_ms` implies.
    #[default]
    Inherit,
    /// Complete synchronously; no await is entered.
    Immediate,
    /// Await exactly one validation, with no expiration.
    Await,
    /// Await exactly one validation, expiring after `ms`.
    AwaitMs(u32),
    /// Await forever; there is no timeout to race against.
    NoTimeout,
}

/// The value returned by a case body (or implied for a plain body):
/// a repeat decision and a timeout decision, composed together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Control {
    pub repeat: RepeatMode,
    pub timeout: TimeoutPolicy,
}

/// Two `Control` fragments disagree on the same field (e.g. `Immediate`
/// composed with `Await`).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("contradictory control composition: {left:?} vs {right:?}")]
pub struct ControlConflictError {
    left: TimeoutPolicy,
    right: TimeoutPolicy,
}

impl Control {
    /// Advance to the next case-body invocation decision; no repeat, no
    /// wait.
    pub const NEXT: Control = Control {
        repeat: RepeatMode::None,
        timeout: TimeoutPolicy::Inherit,
    };

    /// Repeat the body or whole case per `mode`.
    pub fn repeat(mode: RepeatMode) -> Self {
        Control {
            repeat: mode,
            timeout: TimeoutPolicy::Inherit,
        }
    }

    /// Await one validation within `ms`.
    pub fn timeout(ms: u32) -> Self {
        Control {
            repeat: RepeatMode::None,
            timeout: TimeoutPolicy::AwaitMs(ms),
        }
    }

    /// Await one validation indefinitely.
    pub fn await_validation() -> Self {
        Control {
            repeat: RepeatMode::None,
            timeout: TimeoutPolicy::Await,
        }
    }

    /// Synchronous case must not wait; asserts timeout is absent.
    pub fn no_timeout() -> Self {
        Control {
            repeat: RepeatMode::None,
            timeout: TimeoutPolicy::NoTimeout,
        }
    }

    /// Composes a repeat fragment and a timeout fragment (e.g.
    /// `RepeatAll + Timeout(200)`). A repeat mode and a timeout policy never
    /// contradict each other directly; contradictions only arise when two
    /// timeout fragments are merged (see [`Control::and_timeout`]).
    pub fn compose(repeat: RepeatMode, timeout: TimeoutPolicy) -> Result<Self, ControlConflictError> {
        Ok(Control { repeat, timeout })
    }

    /// Merges `self` (treated as already having a repeat decision) with an
    /// additional timeout fragment, erroring if both sides name a
    /// non-`Inherit` and differing timeout policy.
    pub fn and_timeout(self, timeout: TimeoutPolicy) -> Result<Self, ControlConflictError> {
        match (self.timeout, timeout) {
            (TimeoutPolicy::Inherit, t) => Ok(Control { timeout: t, ..self }),
            (t, TimeoutPolicy::Inherit) => Ok(Control { timeout: t, ..self }),
            (a, b) if a == b => Ok(self),
            (a, b) => Err(ControlConflictError { left: a, right: b }),
        }
    }
}

impl RepeatMode {
    /// True for the two modes that only repeat when the await times out.
    pub fn is_on_timeout_only(self) -> bool {
        matches!(self, RepeatMode::HandlerOnlyOnTimeout | RepeatMode::AllOnTimeout)
    }

    /// True for the two modes that re-run setup (as opposed to body-only).
    pub fn reruns_setup(self) -> bool {
        matches!(self, RepeatMode::All | RepeatMode::AllOnTimeout)
    }

    /// True for any mode that causes a repeat at all.
    pub fn repeats(self) -> bool {
        !matches!(self, RepeatMode::None | RepeatMode::NoRepeat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_accepts_repeat_all_plus_timeout() {
        let c = Control::compose(RepeatMode::All, TimeoutPolicy::AwaitMs(200)).unwrap();
        assert_eq!(c.repeat, RepeatMode::All);
        assert_eq!(c.timeout, TimeoutPolicy::AwaitMs(200));
    }

    #[test]
    fn and_timeout_rejects_immediate_plus_await() {
        let immediate = Control {
            repeat: RepeatMode::None,
            timeout: TimeoutPolicy::Immediate,
        };
        assert!(immediate.and_timeout(TimeoutPolicy::Await).is_err());
    }

    #[test]
    fn and_timeout_allows_same_policy_twice() {
        let c = Control::timeout(100);
        assert_eq!(c.and_timeout(TimeoutPolicy::AwaitMs(100)).unwrap(), c);
    }
}
