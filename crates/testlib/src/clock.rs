//! A swappable monotonic clock for deterministic coordinator/phantom-auction
//! timeout tests, implementing `model::Clock`.

use model::Clock;
use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

#[derive(Debug)]
pub struct TestClock {
    epoch: Instant,
    offset_millis: AtomicU64,
}

impl Default for TestClock {
    fn default() -> Self {
        Self {
            epoch: Instant::now(),
            offset_millis: AtomicU64::new(0),
        }
    }
}

impl TestClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, duration: Duration) {
        self.offset_millis
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for TestClock {
    fn now(&self) -> Instant {
        self.epoch + Duration::from_millis(self.offset_millis.load(Ordering::SeqCst))
    }
}
