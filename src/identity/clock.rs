use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Wall-clock source for token expiry checks.
pub trait Clock: Send + Sync {
    fn now_epoch_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Settable clock shared between a test and the store under test.
#[derive(Debug, Clone, Default)]
pub struct FixedClock {
    now_millis: Arc<AtomicI64>,
}

impl FixedClock {
    pub fn at(now_epoch_seconds: i64) -> Self {
        Self::at_millis(now_epoch_seconds * 1000)
    }

    pub fn at_millis(now_epoch_millis: i64) -> Self {
        Self { now_millis: Arc::new(AtomicI64::new(now_epoch_millis)) }
    }

    pub fn advance(&self, secs: i64) {
        self.now_millis.fetch_add(secs * 1000, Ordering::SeqCst);
    }

    pub fn advance_millis(&self, millis: i64) {
        self.now_millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_epoch_millis(&self) -> i64 {
        self.now_millis.load(Ordering::SeqCst)
    }
}
