use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Seconds spent in a session, shared between the session and its tick source.
///
/// Only a display value: it never affects scoring or submission.
#[derive(Debug, Clone, Default)]
pub struct ElapsedCounter(Arc<AtomicU64>);

impl ElapsedCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn seconds(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.0.store(0, Ordering::Relaxed);
    }
}
