use deeds_core::id::Timestamp;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of the ledger's notion of "now"
///
/// Lease expiry is evaluated lazily against this clock, so tests drive it
/// with a manual implementation instead of waiting for wall time.
pub trait Clock: Send + Sync {
    /// Current time as a unix timestamp in seconds
    fn now(&self) -> Timestamp;
}

/// Wall-clock time
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let now = chrono::Utc::now().timestamp();
        // Timestamps before the epoch clamp to zero
        if now < 0 {
            0
        } else {
            now as Timestamp
        }
    }
}

/// Manually driven clock for tests
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    /// Set the clock to an absolute time
    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move the clock forward by `secs`
    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(100);
        assert_eq!(clock.now(), 100);

        clock.advance(50);
        assert_eq!(clock.now(), 150);

        clock.set(10);
        assert_eq!(clock.now(), 10);
    }

    #[test]
    fn test_system_clock_is_recent() {
        // Any plausible wall clock is well past 2020-01-01
        assert!(SystemClock.now() > 1_577_836_800);
    }
}
