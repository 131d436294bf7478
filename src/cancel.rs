//! Cooperative cancellation
//!
//! A `CancelSignal` is a cheap clonable flag shared between the caller and
//! the execution machinery. Cancellation is cooperative: the flag is checked
//! at loop boundaries and before admitting new step invocations; work already
//! in flight finishes naturally.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared cancellation flag. Clones observe the same signal.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    cancelled: Arc<AtomicBool>,
}

impl CancelSignal {
    /// Create a fresh, unset signal
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent; cannot be unset.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
