/// Cooperative cancellation for background network calls.
///
/// Every fetch or chat submit is handed a [`CancelToken`]. The component that
/// started the call keeps a clone and cancels it when it is torn down or
/// superseded; the worker checks the flag before sending the request and
/// again before reporting its result, so a late response is never written
/// into state that has already been discarded.
///
/// `ureq` has no way to abort a request that is already on the wire, so the
/// token cannot shorten an in-flight call. It only guarantees the result is
/// dropped.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared cancellation flag. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the token (and every clone of it) as cancelled.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether [`cancel`](Self::cancel) has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
