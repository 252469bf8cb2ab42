//! Safety monitor initialisation configuration: wraps the shared
//! [`oht50_common::config::SafetyConfigSection`] plus the HAL handles the
//! monitor needs to own.

use std::sync::Arc;

use oht50_common::config::SafetyConfigSection;
use oht50_hal::{EStopInput, LedController, RelayController};

use crate::monitor::SafetyMonitorHandles;
use crate::zones::ZoneThresholds;

/// Everything [`crate::monitor::SafetyMonitor::init`] needs: the validated
/// configuration section plus live handles to the HAL shims. Handles are
/// constructed by the caller (the daemon, or a test) so the monitor never
/// has to know whether it's driving real or simulated hardware.
pub struct SafetyInitConfig {
    pub section: SafetyConfigSection,
    pub estop_input: Arc<dyn EStopInput>,
    pub leds: Arc<dyn LedController>,
    pub relays: Arc<dyn RelayController>,
}

impl SafetyInitConfig {
    pub fn zone_thresholds(&self) -> ZoneThresholds {
        ZoneThresholds {
            emergency_mm: self.section.emergency_zone_mm,
            warning_mm: self.section.warning_zone_mm,
            safe_mm: self.section.safe_zone_mm,
        }
    }

    pub fn watchdog_timeout_us(&self) -> u64 {
        // The config section only carries the E-Stop debounce window;
        // the watchdog uses the fixed cadence constant's own timeout,
        // one order of magnitude above its check period.
        self.section.estop_debounce_us.max(1) * 10_000
    }

    pub fn into_handles(self) -> (SafetyMonitorHandles, ZoneThresholds, u64) {
        let thresholds = self.zone_thresholds();
        let timeout_us = self.watchdog_timeout_us();
        (
            SafetyMonitorHandles {
                estop_input: self.estop_input,
                leds: self.leds,
                relays: self.relays,
            },
            thresholds,
            timeout_us,
        )
    }
}
