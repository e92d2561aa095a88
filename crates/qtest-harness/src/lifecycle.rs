//! The lifecycle interface a harness exposes to test code.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use camino::Utf8PathBuf;

use crate::arg::Args;

type CleanupFn = Box<dyn FnOnce() + Send + 'static>;

/// A deferred action registered to run when a test tears down.
///
/// Clones share the same action, which runs at most once no matter how many
/// clones call [`Cleanup::run`].
#[derive(Clone)]
pub struct Cleanup {
    action: Arc<Mutex<Option<CleanupFn>>>,
}

impl Cleanup {
    /// Wraps an action for later execution.
    #[must_use]
    pub fn new<F>(action: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            action: Arc::new(Mutex::new(Some(Box::new(action)))),
        }
    }

    /// Runs the action unless a clone already ran it. Returns whether it ran.
    pub fn run(&self) -> bool {
        let pending = self
            .action
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match pending {
            Some(action) => {
                action();
                true
            }
            None => false,
        }
    }

    /// Returns `true` once the action has run.
    #[must_use]
    pub fn has_run(&self) -> bool {
        self.action
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cleanup")
            .field("has_run", &self.has_run())
            .finish()
    }
}

/// Operations a test harness offers to the test it is running.
///
/// Failure reporting, logging, skipping, cleanup registration and temporary
/// directory allocation all go through this trait, so code written against
/// it can be driven by a real [`TestContext`](crate::TestContext) or by a
/// recording stub.
///
/// Formatted variants take a `{}` format string; see
/// [`render_format`](crate::render_format).
pub trait TestLifecycle: Send + Sync {
    /// Registers an action to run when the test tears down.
    fn cleanup(&self, action: Cleanup);

    /// Logs the arguments and marks the test as failed.
    fn error(&self, args: Args);

    /// Logs a formatted message and marks the test as failed.
    fn errorf(&self, format: &str, args: Args);

    /// Marks the test as failed without stopping it.
    fn fail(&self);

    /// Marks the test as failed and stops it.
    fn fail_now(&self) -> !;

    /// Reports whether the test has been marked as failed.
    fn failed(&self) -> bool;

    /// Logs the arguments, marks the test as failed and stops it.
    fn fatal(&self, args: Args) -> !;

    /// Logs a formatted message, marks the test as failed and stops it.
    fn fatalf(&self, format: &str, args: Args) -> !;

    /// Marks the caller as a helper function.
    fn helper(&self);

    /// Logs the arguments.
    fn log(&self, args: Args);

    /// Logs a formatted message.
    fn logf(&self, format: &str, args: Args);

    /// Returns the name of the running test.
    fn name(&self) -> String;

    /// Logs the arguments and skips the test.
    fn skip(&self, args: Args);

    /// Skips the test.
    fn skip_now(&self);

    /// Logs a formatted message and skips the test.
    fn skipf(&self, format: &str, args: Args);

    /// Reports whether the test has been skipped.
    fn skipped(&self) -> bool;

    /// Returns a fresh directory that is removed when the test tears down.
    fn temp_dir(&self) -> Utf8PathBuf;
}

macro_rules! forward_lifecycle {
    ($wrapper:ty) => {
        impl<T: TestLifecycle + ?Sized> TestLifecycle for $wrapper {
            fn cleanup(&self, action: Cleanup) {
                (**self).cleanup(action);
            }

            fn error(&self, args: Args) {
                (**self).error(args);
            }

            fn errorf(&self, format: &str, args: Args) {
                (**self).errorf(format, args);
            }

            fn fail(&self) {
                (**self).fail();
            }

            fn fail_now(&self) -> ! {
                (**self).fail_now()
            }

            fn failed(&self) -> bool {
                (**self).failed()
            }

            fn fatal(&self, args: Args) -> ! {
                (**self).fatal(args)
            }

            fn fatalf(&self, format: &str, args: Args) -> ! {
                (**self).fatalf(format, args)
            }

            fn helper(&self) {
                (**self).helper();
            }

            fn log(&self, args: Args) {
                (**self).log(args);
            }

            fn logf(&self, format: &str, args: Args) {
                (**self).logf(format, args);
            }

            fn name(&self) -> String {
                (**self).name()
            }

            fn skip(&self, args: Args) {
                (**self).skip(args);
            }

            fn skip_now(&self) {
                (**self).skip_now();
            }

            fn skipf(&self, format: &str, args: Args) {
                (**self).skipf(format, args);
            }

            fn skipped(&self) -> bool {
                (**self).skipped()
            }

            fn temp_dir(&self) -> Utf8PathBuf {
                (**self).temp_dir()
            }
        }
    };
}

forward_lifecycle!(&T);
forward_lifecycle!(Arc<T>);
forward_lifecycle!(Box<T>);
