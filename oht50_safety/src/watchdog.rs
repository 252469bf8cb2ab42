//! Periodic heartbeat whose expiry forces a fault transition (SPEC_FULL
//! §4.3, cadence 1 s).

use oht50_common::time::now_us;

pub struct Watchdog {
    timeout_us: u64,
    last_kick_us: u64,
}

impl Watchdog {
    pub fn new(timeout_us: u64) -> Self {
        Self {
            timeout_us,
            last_kick_us: now_us(),
        }
    }

    pub fn kick(&mut self) {
        self.last_kick_us = now_us();
    }

    pub fn is_expired(&self) -> bool {
        now_us().saturating_sub(self.last_kick_us) > self.timeout_us
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_watchdog_is_not_expired() {
        let wd = Watchdog::new(1_000_000);
        assert!(!wd.is_expired());
    }

    #[test]
    fn expiry_trips_after_timeout() {
        let mut wd = Watchdog::new(1_000);
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(wd.is_expired());
        wd.kick();
        assert!(!wd.is_expired());
    }
}
