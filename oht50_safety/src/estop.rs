//! Dual E-Stop latch: hardware (debounced input, releases automatically)
//! and software (latched by `trigger_emergency_stop`, cleared only by
//! `reset()`). Aggregate active = hardware ∨ software. The read side must
//! be lock-free (SPEC_FULL §5); both flags are plain atomics.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use oht50_common::time::now_us;

#[derive(Default)]
pub struct EStopLatch {
    hardware_active: AtomicBool,
    software_active: AtomicBool,
    last_check_timestamp_us: AtomicU64,
    last_latency_us: AtomicU64,
}

impl EStopLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock-free aggregate read: hardware ∨ software.
    pub fn is_active(&self) -> bool {
        self.hardware_active.load(Ordering::Acquire) || self.software_active.load(Ordering::Acquire)
    }

    pub fn hardware_active(&self) -> bool {
        self.hardware_active.load(Ordering::Acquire)
    }

    pub fn software_active(&self) -> bool {
        self.software_active.load(Ordering::Acquire)
    }

    pub fn last_latency_us(&self) -> u64 {
        self.last_latency_us.load(Ordering::Acquire)
    }

    /// Sample the hardware E-Stop input (§4.3's 100 µs cadence). If the
    /// aggregate transitions from inactive to active, latch the measured
    /// latency relative to the last time this was sampled.
    pub fn sample_hardware(&self, asserted: bool) {
        let was_active = self.is_active();
        let now = now_us();
        let previous_check = self.last_check_timestamp_us.swap(now, Ordering::AcqRel);

        self.hardware_active.store(asserted, Ordering::Release);

        let now_active = self.is_active();
        if !was_active && now_active {
            self.last_latency_us
                .store(now.saturating_sub(previous_check), Ordering::Release);
        }
    }

    /// Latch the software E-Stop. Idempotent: repeated calls are a no-op
    /// once already latched (§8 round-trip property).
    pub fn trigger_software(&self) {
        let was_active = self.is_active();
        self.software_active.store(true, Ordering::Release);
        if !was_active {
            let now = now_us();
            let previous_check = self.last_check_timestamp_us.swap(now, Ordering::AcqRel);
            self.last_latency_us
                .store(now.saturating_sub(previous_check), Ordering::Release);
        }
    }

    /// Clear the software latch. Rejected by the caller (see
    /// `SafetyMonitor::reset`) while `hardware_active` is true; this method
    /// itself performs no such check, since it has no notion of "rejected".
    pub fn clear_software(&self) {
        self.software_active.store(false, Ordering::Release);
    }
}
