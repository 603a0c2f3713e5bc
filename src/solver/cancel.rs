//! Cooperative cancellation token
//!
//! Workers cannot be interrupted from the outside. Instead, each worker gets a
//! `CancelToken` that its solver polls at its own checkpoints. The coordinator
//! flips the flag once a winner is decided; an optional deadline makes the token
//! report cancellation on its own once the race has run too long.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared cancellation flag with an optional deadline
///
/// Clones share the same flag, so the coordinator keeps one clone and hands
/// the other to the worker.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// Create a token that is only cancelled explicitly
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a token that also reports cancellation once `deadline` passes
    pub fn with_deadline(deadline: Option<Instant>) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            deadline,
        }
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Whether `cancel()` was called on any clone of this token
    pub fn is_cancel_requested(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Whether the solver should stop: explicit request or expired deadline
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.is_cancel_requested() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Deadline carried by this token, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline (`None` when there is no deadline)
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let token = CancelToken::new();
        let worker_side = token.clone();

        assert!(!worker_side.is_cancelled());
        token.cancel();
        assert!(worker_side.is_cancelled());
        assert!(worker_side.is_cancel_requested());
    }

    #[test]
    fn test_expired_deadline_reports_cancelled() {
        let token = CancelToken::with_deadline(Some(Instant::now()));
        assert!(token.is_cancelled());
        // The deadline alone is not an explicit request
        assert!(!token.is_cancel_requested());
        assert_eq!(token.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn test_future_deadline() {
        let token = CancelToken::with_deadline(Some(Instant::now() + Duration::from_secs(60)));
        assert!(!token.is_cancelled());
        assert!(token.remaining().unwrap() > Duration::from_secs(30));
    }

    #[test]
    fn test_no_deadline() {
        let token = CancelToken::new();
        assert!(token.deadline().is_none());
        assert!(token.remaining().is_none());
    }
}
