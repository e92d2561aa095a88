//! Thread-safe, append-only log of calls to one operation.

use std::sync::{Mutex, MutexGuard, PoisonError};

use qtest_harness::Args;
use tracing::trace;

use crate::call::Call;

const TARGET: &str = "qmock::recorder";

/// Records every invocation of a single stubbed operation.
///
/// Calls are kept in the order they were added. All methods take `&self` and
/// may be used from any number of threads at once.
///
/// ```
/// use qmock::Recorder;
/// use qtest_harness::args;
///
/// let recorder = Recorder::new();
/// recorder.add_call(args!["first"]);
/// recorder.add_call(args!["second", 2]);
/// assert_eq!(recorder.call_count(), 2);
/// assert_eq!(recorder.call(1).arg_count(), 2);
///
/// recorder.reset();
/// assert_eq!(recorder.call_count(), 0);
/// ```
#[derive(Debug, Default)]
pub struct Recorder {
    calls: Mutex<Vec<Call>>,
}

impl Recorder {
    /// Creates an empty recorder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Appends a call carrying `args`, timestamped now.
    pub fn add_call(&self, args: Args) {
        let mut calls = self.lock();
        trace!(target: TARGET, index = calls.len(), arg_count = args.len(), "recording call");
        calls.push(Call::new(args));
    }

    /// Returns how many calls have been recorded since creation or the last
    /// reset.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.lock().len()
    }

    /// Returns a copy of the call at `index`.
    ///
    /// # Panics
    ///
    /// Panics when `index` is not below [`Recorder::call_count`]. Use
    /// [`Recorder::get`] for a checked lookup.
    #[must_use]
    pub fn call(&self, index: usize) -> Call {
        let calls = self.lock();
        if let Some(call) = calls.get(index) {
            return call.clone();
        }
        let recorded = calls.len();
        drop(calls);
        panic!("call index {index} out of range: {recorded} calls recorded");
    }

    /// Returns a copy of the call at `index`, if one was recorded.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Call> {
        self.lock().get(index).cloned()
    }

    /// Returns a snapshot of every recorded call.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.lock().clone()
    }

    /// Discards every recorded call.
    pub fn reset(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Call>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
