//! Monotonic time source.
//!
//! Design note §9: "Use monotonic clocks for all deadlines, sliding windows,
//! and heartbeats. Wall-clock time is used only for human-readable
//! timestamps in emitted events." [`Clock`] is the seam tests substitute
//! (see `testlib::clock::TestClock`) so coordinator/phantom timeout tests
//! don't depend on real sleeps.

use std::time::Instant;

pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> Instant;
}

/// Real wall-clock-backed monotonic clock, used in production.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
