//! Handling of broken internal invariants (an order missing from the collection it must
//! be in, an assignment to a courier that does not exist).
//!
//! In strict mode (the default for debug builds) a violation panics so it is caught in
//! development. Otherwise it is logged at `error` and the caller turns the operation into
//! a no-op, so one bad order cannot take the service down.

use tracing::error;

/// Reports a violation. Returns only in lenient mode.
#[track_caller]
pub fn violated(strict: bool, message: &str) {
    if strict {
        panic!("Invariant violation: {message}");
    }
    error!(message, "Invariant violation");
}
