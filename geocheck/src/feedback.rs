//! Cooperative progress reporting and cancellation.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Cancellation and progress signal shared between an orchestrator and a running check.
///
/// Cancellation is cooperative: iteration and detection passes poll [`Feedback::is_canceled`]
/// between features and stop early, returning whatever results were gathered so far. Nothing is
/// ever interrupted preemptively.
#[derive(Debug, Default)]
pub struct Feedback {
    canceled: AtomicBool,
    progress: AtomicU64,
}

impl Feedback {
    /// Creates a new, non-canceled feedback handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation of the operation this handle was given to.
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Relaxed)
    }

    /// Updates the number of processed items.
    pub fn set_progress(&self, progress: u64) {
        self.progress.store(progress, Ordering::Relaxed);
    }

    /// Number of processed items reported so far.
    pub fn progress(&self) -> u64 {
        self.progress.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_is_sticky() {
        let feedback = Feedback::new();
        assert!(!feedback.is_canceled());
        feedback.cancel();
        assert!(feedback.is_canceled());
        assert!(feedback.is_canceled());
    }
}
