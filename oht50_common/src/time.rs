//! Monotonic microsecond time source.
//!
//! Every deadline, age and jitter computation in this workspace is derived
//! from this clock. Wall-clock time (`SystemTime`) is reserved strictly for
//! human-readable log timestamps and must never participate in scheduling
//! arithmetic.

use std::sync::OnceLock;
use std::time::Instant;

static EPOCH: OnceLock<Instant> = OnceLock::new();

fn epoch() -> Instant {
    *EPOCH.get_or_init(Instant::now)
}

/// Microseconds elapsed since process start. Monotonic, never wraps within
/// any realistic uptime (u64 at 1 MHz overflows after ~584,000 years).
pub fn now_us() -> u64 {
    epoch().elapsed().as_micros() as u64
}

/// Sleep until the given absolute microsecond timestamp (as returned by
/// [`now_us`]). Returns immediately if `target_us` is already in the past.
pub fn sleep_until_us(target_us: u64) {
    let now = now_us();
    if target_us <= now {
        return;
    }
    std::thread::sleep(std::time::Duration::from_micros(target_us - now));
}

/// A small object wrapper over the free functions above, for components
/// that prefer to hold a clock handle rather than call free functions
/// directly (useful for injecting a fake clock in tests).
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl MonotonicClock {
    pub fn now_us(&self) -> u64 {
        now_us()
    }

    pub fn sleep_until_us(&self, target_us: u64) {
        sleep_until_us(target_us)
    }

    /// Elapsed microseconds since `since`, saturating at zero if `since` is
    /// in the future (clock skew should never happen with a monotonic
    /// source, but callers doing subtraction on raw u64s should prefer this).
    pub fn elapsed_us_since(&self, since: u64) -> u64 {
        self.now_us().saturating_sub(since)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_us_is_monotonic() {
        let a = now_us();
        std::thread::sleep(std::time::Duration::from_micros(500));
        let b = now_us();
        assert!(b >= a);
    }

    #[test]
    fn sleep_until_past_returns_immediately() {
        let start = now_us();
        sleep_until_us(start.saturating_sub(1_000));
        let elapsed = now_us() - start;
        assert!(elapsed < 5_000, "elapsed = {elapsed}us");
    }

    #[test]
    fn elapsed_us_since_saturates() {
        let clock = MonotonicClock;
        let future = clock.now_us() + 1_000_000;
        assert_eq!(clock.elapsed_us_since(future), 0);
    }
}
