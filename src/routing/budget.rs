use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Bounds the work a single route search may do.
///
/// A search checks its budget periodically and gives up with the fail-soft plan once the
/// deadline has passed or the token was cancelled.
#[derive(Debug, Clone, Default)]
pub struct RouteBudget {
    deadline: Option<Instant>,
    cancel: Option<CancellationToken>,
}

impl RouteBudget {
    /// No deadline, no cancellation.
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::unlimited().until(Instant::now() + timeout)
    }

    pub fn until(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn cancelled_by(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn is_exhausted(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
            || self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }
}
