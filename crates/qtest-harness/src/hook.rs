//! Panic hook filtering for unwind payloads used as control flow.

use std::any::{Any, TypeId};
use std::panic;
use std::sync::{Mutex, PoisonError};
use std::thread;

static SILENCED: Mutex<Vec<TypeId>> = Mutex::new(Vec::new());

/// Stops the panic hook from reporting unwinds whose payload is a `P`.
///
/// The previously installed hook is wrapped, so every other panic is still
/// reported exactly as before. Installing the filter for the same payload
/// type more than once is a no-op.
///
/// The hook cannot be replaced while the current thread is unwinding, so a
/// call made from a destructor during a panic does nothing; a later call
/// installs the filter.
pub fn silence_panic_reports<P: Any + Send>() {
    silence_panic_reports_if::<P>(|| true);
}

/// Like [`silence_panic_reports`], but a `P` unwind is only hidden while
/// `active` returns `true` on the panicking thread.
///
/// The condition is fixed by the first call for each payload type.
pub fn silence_panic_reports_if<P: Any + Send>(active: fn() -> bool) {
    if thread::panicking() {
        return;
    }
    let mut silenced = SILENCED.lock().unwrap_or_else(PoisonError::into_inner);
    let payload_type = TypeId::of::<P>();
    if silenced.contains(&payload_type) {
        return;
    }
    silenced.push(payload_type);

    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        if info.payload().is::<P>() && active() {
            return;
        }
        previous(info);
    }));
}
