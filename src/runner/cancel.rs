//! Cooperative cancellation signal.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag that asks a loop to stop before its next iteration.
///
/// Clones observe the same flag. Cancellation never interrupts work that is
/// already in flight.
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    cancelled: Arc<AtomicBool>,
}

impl CancellationSignal {
    /// Create a signal that has not fired
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether the signal has fired
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
