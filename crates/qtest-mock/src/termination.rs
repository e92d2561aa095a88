//! The unwind payload raised by stopping stub operations, and the scope that
//! absorbs it.

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use qtest_harness::silence_panic_reports_if;
use tracing::debug;

use crate::operation::Operation;

const TARGET: &str = "qmock::termination";

thread_local! {
    static ABSORBING: Cell<usize> = const { Cell::new(0) };
}

/// Unwind payload raised when a stubbed operation stops the test.
///
/// Only the stub creates these, so a caught payload of this type always
/// means "a stubbed `fail_now`, `fatal` or `fatalf` ran", never an unrelated
/// panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StubTermination {
    operation: Operation,
}

impl StubTermination {
    pub(crate) const fn new(operation: Operation) -> Self {
        Self { operation }
    }

    /// Returns the operation that stopped the test.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        self.operation
    }
}

impl fmt::Display for StubTermination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stubbed {} stopped the test", self.operation)
    }
}

/// Returns `true` when a caught unwind payload is a [`StubTermination`].
#[must_use]
pub fn is_stub_termination(payload: &(dyn Any + Send)) -> bool {
    payload.is::<StubTermination>()
}

/// Result of running a region under [`absorb_termination`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<R> {
    /// The region returned normally.
    Finished(R),
    /// A stubbed operation stopped the region.
    Terminated(StubTermination),
}

impl<R> Outcome<R> {
    /// Returns `true` when a stubbed operation stopped the region.
    #[must_use]
    pub const fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated(_))
    }

    /// Returns `true` when the region returned normally.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self, Self::Finished(_))
    }

    /// Returns the region's value if it finished.
    #[must_use]
    pub fn finished(self) -> Option<R> {
        match self {
            Self::Finished(value) => Some(value),
            Self::Terminated(_) => None,
        }
    }

    /// Returns the termination if a stubbed operation stopped the region.
    #[must_use]
    pub const fn termination(&self) -> Option<StubTermination> {
        match self {
            Self::Finished(_) => None,
            Self::Terminated(termination) => Some(*termination),
        }
    }
}

/// Runs `region`, turning a stub termination into [`Outcome::Terminated`].
///
/// Any other panic raised inside the region continues to unwind unchanged.
/// Terminations absorbed here are not reported by the panic hook; one that
/// escapes to the test runner is reported like any other panic.
///
/// ```
/// use qmock::{LifecycleStub, Operation, Outcome, absorb_termination};
/// use qtest_harness::{TestContext, TestLifecycle};
///
/// let context = TestContext::new("absorb");
/// let stub = LifecycleStub::new(&context);
/// let outcome: Outcome<()> = absorb_termination(|| stub.fail_now());
/// assert_eq!(outcome.termination().map(|t| t.operation()), Some(Operation::FailNow));
/// ```
pub fn absorb_termination<F, R>(region: F) -> Outcome<R>
where
    F: FnOnce() -> R,
{
    silence_absorbed_reports();
    ABSORBING.with(|depth| depth.set(depth.get() + 1));
    let result = panic::catch_unwind(AssertUnwindSafe(region));
    ABSORBING.with(|depth| depth.set(depth.get().saturating_sub(1)));

    match result {
        Ok(value) => Outcome::Finished(value),
        Err(payload) => match payload.downcast::<StubTermination>() {
            Ok(termination) => {
                debug!(target: TARGET, operation = %termination.operation, "absorbed stub termination");
                Outcome::Terminated(*termination)
            }
            Err(other) => panic::resume_unwind(other),
        },
    }
}

/// Stops the current test by unwinding with a [`StubTermination`].
pub(crate) fn raise(operation: Operation) -> ! {
    debug!(target: TARGET, %operation, "stub stopping the test");
    panic::panic_any(StubTermination::new(operation))
}

/// Hides [`StubTermination`] reports raised inside [`absorb_termination`].
pub(crate) fn silence_absorbed_reports() {
    silence_panic_reports_if::<StubTermination>(is_absorbing);
}

fn is_absorbing() -> bool {
    ABSORBING.with(Cell::get) > 0
}
