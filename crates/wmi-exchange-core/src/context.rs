//! Cooperative cancellation for a single scrape.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Cancellation state shared between a scrape and whoever may abort it.
///
/// Clones share the same flag, so a clone handed to a signal handler can
/// cancel the scrape running on another thread. The dispatcher checks the
/// context between collectors; sources check it before issuing a query.
/// A query already in flight is not interrupted, so a deadline can be
/// overrun by at most one query.
#[derive(Debug, Clone, Default)]
pub struct ScrapeContext {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl ScrapeContext {
    /// A context that is never cancelled unless `cancel()` is called.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that counts as cancelled once `timeout` has elapsed.
    ///
    /// Checked at the same points as `cancel()`, never mid-query.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// A context sharing this one's cancellation flag, with its own deadline.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        Self {
            cancelled: Arc::clone(&self.cancelled),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Marks the context (and every clone of it) as cancelled.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        if self.cancelled.load(Ordering::SeqCst) {
            return true;
        }
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Time left before the deadline, if one is set.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }
}
