//! The safety monitor: owns the safety state machine, the E-Stop dual
//! latch, zone/interlock/sensor/watchdog checks, and drives LED/relay side
//! effects deterministically on every state transition (SPEC_FULL §4.3).

use std::sync::Arc;

use parking_lot::Mutex;

use oht50_common::consts;
use oht50_common::time::now_us;
use oht50_hal::{EStopInput, LedController, LedPattern, LidarScan, RelayController};

use crate::error::SafetyError;
use crate::estop::EStopLatch;
use crate::interlocks::{InterlockConfig, InterlockTable};
use crate::persist::ZoneConfigDocument;
use crate::sensors::{SensorConfig, SensorTable};
use crate::state::{SafetyState, SafetyStateMachine, TransitionResult};
use crate::watchdog::Watchdog;
use crate::zones::{self, ZoneThresholds};

/// Event classes folded by [`SafetyMonitor::process_event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyEventKind {
    EStopPressed,
    InterlockOpen,
    SensorFault,
    CommunicationLost,
    WatchdogExpired,
    ExplicitEStop,
    SafetyReset,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SafetyStatistics {
    pub violation_count: u64,
    pub fault_count: u64,
    pub state_transition_count: u64,
    pub recovery_count: u64,
    pub uptime_us: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct SafetyDiagnostics {
    pub state: SafetyState,
    pub estop_active: bool,
    pub hardware_estop_active: bool,
    pub software_estop_active: bool,
    pub last_fault_code: u32,
    pub last_estop_latency_us: u64,
    pub statistics: SafetyStatistics,
}

pub struct SafetyMonitorHandles {
    pub estop_input: Arc<dyn EStopInput>,
    pub leds: Arc<dyn LedController>,
    pub relays: Arc<dyn RelayController>,
}

struct Cadence {
    period_us: u64,
    last_run_us: u64,
}

impl Cadence {
    fn new(period_us: u64) -> Self {
        Self {
            period_us,
            last_run_us: 0,
        }
    }

    fn due(&mut self, now: u64) -> bool {
        if now.saturating_sub(self.last_run_us) >= self.period_us {
            self.last_run_us = now;
            true
        } else {
            false
        }
    }
}

struct CadenceGroup {
    estop: Cadence,
    interlocks: Cadence,
    sensors: Cadence,
    watchdog: Cadence,
    module_health: Cadence,
}

impl Default for CadenceGroup {
    fn default() -> Self {
        Self {
            estop: Cadence::new(consts::ESTOP_SAMPLE_PERIOD_US),
            interlocks: Cadence::new(consts::INTERLOCK_CHECK_PERIOD_US),
            sensors: Cadence::new(consts::SENSOR_CHECK_PERIOD_US),
            watchdog: Cadence::new(consts::WATCHDOG_CHECK_PERIOD_US),
            module_health: Cadence::new(consts::MODULE_HEALTH_CHECK_PERIOD_US),
        }
    }
}

struct Guarded {
    machine: SafetyStateMachine,
    zone_thresholds: ZoneThresholds,
    last_zone_eval: Option<zones::ZoneEvaluation>,
    interlocks: InterlockTable,
    sensors: SensorTable,
    watchdog: Watchdog,
    cadence: CadenceGroup,
    stats: SafetyStatistics,
    last_fault_code: u32,
    start_time_us: u64,
}

/// Top-level safety monitor. Cheap to clone (wraps `Arc`s); clone it into
/// the control loop's safety hook closure.
#[derive(Clone)]
pub struct SafetyMonitor {
    estop: Arc<EStopLatch>,
    handles: Arc<SafetyMonitorHandles>,
    inner: Arc<Mutex<Guarded>>,
}

impl SafetyMonitor {
    /// Initialise the monitor. If the E-Stop input cannot be constructed
    /// the safety argument cannot hold, so this is the one failure mode
    /// that must propagate; LED/relay init failures degrade to headless
    /// mode instead (handled by the caller constructing `handles`, since
    /// the simulated/real backends here never fail to construct).
    pub fn init(
        handles: SafetyMonitorHandles,
        zone_thresholds: ZoneThresholds,
        watchdog_timeout_us: u64,
    ) -> Result<Self, SafetyError> {
        if !zone_thresholds.ordering_holds() {
            return Err(SafetyError::InvalidZoneConfig(
                crate::persist::PersistError::InvalidOrdering {
                    emergency: zone_thresholds.emergency_mm,
                    warning: zone_thresholds.warning_mm,
                    safe: zone_thresholds.safe_mm,
                },
            ));
        }

        let now = now_us();
        let monitor = Self {
            estop: Arc::new(EStopLatch::new()),
            handles: Arc::new(handles),
            inner: Arc::new(Mutex::new(Guarded {
                machine: SafetyStateMachine::default(),
                zone_thresholds,
                last_zone_eval: None,
                interlocks: InterlockTable::default(),
                sensors: SensorTable::default(),
                watchdog: Watchdog::new(watchdog_timeout_us),
                cadence: CadenceGroup::default(),
                stats: SafetyStatistics::default(),
                last_fault_code: 0,
                start_time_us: now,
            })),
        };

        monitor.force_transition(SafetyState::Safe);
        Ok(monitor)
    }

    pub fn state(&self) -> SafetyState {
        self.inner.lock().machine.state()
    }

    pub fn is_safe(&self) -> bool {
        matches!(self.state(), SafetyState::Safe)
    }

    pub fn estop_active(&self) -> bool {
        self.estop.is_active()
    }

    fn force_transition(&self, to: SafetyState) {
        let mut inner = self.inner.lock();
        match inner.machine.transition(to) {
            TransitionResult::Transitioned(state) => {
                inner.stats.state_transition_count += 1;
                drop(inner);
                self.apply_transition_side_effects(to);
                let _ = state;
            }
            TransitionResult::Rejected(reason) => {
                tracing::error!(%reason, ?to, "internal transition rejected; this is a monitor bug");
            }
            TransitionResult::NoChange => {}
        }
    }

    fn apply_transition_side_effects(&self, to: SafetyState) {
        let pattern = match to {
            SafetyState::Safe => LedPattern::AllGreen,
            SafetyState::Warning => LedPattern::SystemFastBlink,
            SafetyState::Critical => LedPattern::ErrorSlowBlink,
            SafetyState::EStop => LedPattern::ErrorFastBlinkNonEssentialOff,
            SafetyState::Fault => LedPattern::ErrorSlowBlink,
            SafetyState::Init => return,
        };
        self.handles.leds.set_pattern(pattern);

        if to == SafetyState::EStop {
            self.handles.relays.de_energize_all();
        }
    }

    /// Latch software E-Stop, run the emergency procedure, transition to
    /// `estop`. Idempotent (§8): repeated calls leave state at `estop` with
    /// `software_active` remaining true.
    pub fn trigger_emergency_stop(&self, reason: &str) {
        tracing::error!(reason, "emergency stop triggered");
        self.estop.trigger_software();
        let mut inner = self.inner.lock();
        inner.stats.violation_count += 1;
        inner.last_fault_code = 1;
        drop(inner);
        self.force_transition(SafetyState::EStop);
    }

    /// Permitted only when hardware E-Stop is inactive (§8 property 5).
    /// Clears the software latch and transitions to `safe`.
    pub fn reset(&self) -> Result<(), SafetyError> {
        if self.estop.hardware_active() {
            return Err(SafetyError::ResetRejectedHardwareActive);
        }
        if self.estop.software_active() {
            // software path not yet cleared: caller must call reset() again
            // after confirming both latches are clear, matching S3.
            self.estop.clear_software();
        }
        if self.estop.is_active() {
            return Err(SafetyError::ResetRejectedHardwareActive);
        }

        let mut inner = self.inner.lock();
        inner.stats.recovery_count += 1;
        inner.last_fault_code = 0;
        drop(inner);
        self.force_transition(SafetyState::Safe);
        Ok(())
    }

    pub fn process_event(&self, kind: SafetyEventKind, detail: &str) {
        match kind {
            SafetyEventKind::EStopPressed => {
                self.estop.sample_hardware(true);
                self.force_transition(SafetyState::EStop);
            }
            SafetyEventKind::ExplicitEStop => self.trigger_emergency_stop(detail),
            SafetyEventKind::SafetyReset => {
                if let Err(err) = self.reset() {
                    tracing::warn!(%err, "safety reset rejected");
                }
            }
            SafetyEventKind::InterlockOpen | SafetyEventKind::SensorFault => {
                let mut inner = self.inner.lock();
                inner.stats.violation_count += 1;
                drop(inner);
                self.force_transition(SafetyState::Warning);
            }
            SafetyEventKind::CommunicationLost => {
                // Unsafe because blind, not because hazardous: critical, not estop.
                self.force_transition(SafetyState::Critical);
            }
            SafetyEventKind::WatchdogExpired => {
                let mut inner = self.inner.lock();
                inner.stats.fault_count += 1;
                inner.last_fault_code = 2;
                drop(inner);
                self.force_transition(SafetyState::Fault);
            }
        }
    }

    /// Periodic update (≤10 ms cadence). Runs each cadenced check on its
    /// own schedule; never blocks waiting on any one of them.
    pub fn update(
        &self,
        read_interlock: impl Fn(usize) -> bool,
        read_sensor: impl Fn(usize) -> i32,
        read_module_health: impl Fn() -> bool,
    ) {
        let now = now_us();
        self.estop.sample_hardware(self.handles.estop_input.is_asserted());
        if self.estop.is_active() && self.state() != SafetyState::EStop {
            self.force_transition(SafetyState::EStop);
        }

        let mut inner = self.inner.lock();
        inner.stats.uptime_us = now.saturating_sub(inner.start_time_us);

        if inner.cadence.interlocks.due(now) {
            if inner.interlocks.check(&read_interlock) {
                inner.stats.violation_count += 1;
                drop(inner);
                self.force_transition(SafetyState::Warning);
                inner = self.inner.lock();
            }
        }

        if inner.cadence.sensors.due(now) {
            if inner.sensors.check(&read_sensor) {
                inner.stats.violation_count += 1;
                drop(inner);
                self.force_transition(SafetyState::Warning);
                inner = self.inner.lock();
            }
        }

        if inner.cadence.watchdog.due(now) && inner.watchdog.is_expired() {
            inner.stats.fault_count += 1;
            inner.last_fault_code = 2;
            drop(inner);
            self.force_transition(SafetyState::Fault);
            inner = self.inner.lock();
        }

        // Critical-module health: structurally a communication check against
        // the modules the control loop depends on, so a failure is "unsafe
        // because blind" (critical), not "unsafe because hazardous" (estop).
        if inner.cadence.module_health.due(now) && !read_module_health() {
            inner.stats.violation_count += 1;
            drop(inner);
            self.force_transition(SafetyState::Critical);
        }
    }

    /// Variant of `update` that also recomputes zone violations from a
    /// fresh LiDAR scan (SPEC_FULL §4.3). Driven by the LiDAR driver's own
    /// scan cadence rather than an internal poll, so every scan handed in
    /// is evaluated immediately.
    pub fn update_with_lidar(&self, scan: &LidarScan) {
        let mut inner = self.inner.lock();
        let thresholds = inner.zone_thresholds;
        let Some(eval) = zones::evaluate(&thresholds, scan) else {
            return;
        };
        inner.last_zone_eval = Some(eval);
        let was_safe = inner.machine.state() == SafetyState::Safe;
        let was_warning = inner.machine.state() == SafetyState::Warning;
        drop(inner);

        if eval.violations.emergency_violated {
            self.trigger_emergency_stop(&format!(
                "zone emergency violation: min_distance_mm={}",
                eval.min_distance_mm
            ));
        } else if eval.violations.warning_violated && was_safe {
            self.force_transition(SafetyState::Warning);
        } else if !eval.violations.safe_violated && was_warning {
            self.force_transition(SafetyState::Safe);
        }
    }

    pub fn zone_evaluation(&self) -> Option<zones::ZoneEvaluation> {
        self.inner.lock().last_zone_eval
    }

    pub fn set_zone_thresholds(&self, thresholds: ZoneThresholds) -> Result<(), SafetyError> {
        if !thresholds.ordering_holds() {
            return Err(SafetyError::InvalidZoneConfig(
                crate::persist::PersistError::InvalidOrdering {
                    emergency: thresholds.emergency_mm,
                    warning: thresholds.warning_mm,
                    safe: thresholds.safe_mm,
                },
            ));
        }
        self.inner.lock().zone_thresholds = thresholds;
        Ok(())
    }

    pub fn zone_thresholds(&self) -> ZoneThresholds {
        self.inner.lock().zone_thresholds
    }

    pub fn set_interlock(&self, index: usize, config: InterlockConfig) -> Result<(), SafetyError> {
        let mut inner = self.inner.lock();
        if !inner.interlocks.set(index, config) {
            return Err(SafetyError::IndexOutOfBounds {
                index,
                max: consts::MAX_INTERLOCK_CONFIGS,
            });
        }
        Ok(())
    }

    pub fn set_sensor(&self, index: usize, config: SensorConfig) -> Result<(), SafetyError> {
        let mut inner = self.inner.lock();
        if !inner.sensors.set(index, config) {
            return Err(SafetyError::IndexOutOfBounds {
                index,
                max: consts::MAX_SENSOR_CONFIGS,
            });
        }
        Ok(())
    }

    pub fn kick_watchdog(&self) {
        self.inner.lock().watchdog.kick();
    }

    /// Export the current basic-zone configuration as a JSON document.
    pub fn export_zone_config(&self) -> ZoneConfigDocument {
        let inner = self.inner.lock();
        ZoneConfigDocument {
            version: crate::persist::ZONE_CONFIG_DOCUMENT_VERSION,
            timestamp_us: now_us(),
            zones: crate::persist::ZoneDocumentZones {
                enabled: true,
                emergency_zone_mm: inner.zone_thresholds.emergency_mm,
                warning_zone_mm: inner.zone_thresholds.warning_mm,
                safe_zone_mm: inner.zone_thresholds.safe_mm,
            },
            timing: crate::persist::MonitorTimingKnobs {
                zone_check_period_us: consts::ZONE_CHECK_PERIOD_US,
                interlock_check_period_us: consts::INTERLOCK_CHECK_PERIOD_US,
                sensor_check_period_us: consts::SENSOR_CHECK_PERIOD_US,
            },
        }
    }

    /// Import a basic-zone configuration from JSON text. Rejects (leaving
    /// the previous configuration unchanged) on an ordering violation (S6).
    pub fn import_zone_config(&self, json: &str) -> Result<(), SafetyError> {
        let doc = crate::persist::parse_and_validate(json)?;
        self.set_zone_thresholds(doc.thresholds())
    }

    pub fn diagnostics(&self) -> SafetyDiagnostics {
        let inner = self.inner.lock();
        SafetyDiagnostics {
            state: inner.machine.state(),
            estop_active: self.estop.is_active(),
            hardware_estop_active: self.estop.hardware_active(),
            software_estop_active: self.estop.software_active(),
            last_fault_code: inner.last_fault_code,
            last_estop_latency_us: self.estop.last_latency_us(),
            statistics: inner.stats,
        }
    }

    pub fn reset_statistics(&self) {
        let mut inner = self.inner.lock();
        inner.stats = SafetyStatistics::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oht50_hal::{SimulatedEStopInput, SimulatedLedController, SimulatedRelayController};
    use std::sync::Arc;

    fn make_monitor() -> (SafetyMonitor, Arc<SimulatedEStopInput>) {
        let estop_input = Arc::new(SimulatedEStopInput::new());
        let handles = SafetyMonitorHandles {
            estop_input: estop_input.clone(),
            leds: Arc::new(SimulatedLedController::new()),
            relays: Arc::new(SimulatedRelayController::new()),
        };
        let thresholds = ZoneThresholds {
            emergency_mm: 500,
            warning_mm: 1_000,
            safe_mm: 2_000,
        };
        let monitor = SafetyMonitor::init(handles, thresholds, 1_000_000).unwrap();
        (monitor, estop_input)
    }

    #[test]
    fn init_starts_in_safe_state() {
        let (monitor, _) = make_monitor();
        assert_eq!(monitor.state(), SafetyState::Safe);
    }

    #[test]
    fn init_rejects_invalid_zone_ordering() {
        let estop_input = Arc::new(SimulatedEStopInput::new());
        let handles = SafetyMonitorHandles {
            estop_input,
            leds: Arc::new(SimulatedLedController::new()),
            relays: Arc::new(SimulatedRelayController::new()),
        };
        let bad = ZoneThresholds {
            emergency_mm: 1_500,
            warning_mm: 1_000,
            safe_mm: 2_000,
        };
        assert!(SafetyMonitor::init(handles, bad, 1_000_000).is_err());
    }

    #[test]
    fn s3_estop_latching_and_two_phase_reset() {
        let (monitor, estop_input) = make_monitor();
        estop_input.set_asserted(true);
        monitor.update(|_| true, |_| 0, || true);
        assert_eq!(monitor.state(), SafetyState::EStop);

        monitor.trigger_emergency_stop("test");
        assert!(monitor.reset().is_err(), "hardware still active");

        estop_input.set_asserted(false);
        monitor.update(|_| true, |_| 0, || true);
        // software latch still set from trigger_emergency_stop
        monitor.reset().unwrap();
        assert_eq!(monitor.state(), SafetyState::Safe);
    }

    #[test]
    fn module_health_failure_triggers_critical() {
        let (monitor, _) = make_monitor();
        monitor.update(|_| true, |_| 0, || false);
        assert_eq!(monitor.state(), SafetyState::Critical);
    }

    #[test]
    fn trigger_emergency_stop_is_idempotent() {
        let (monitor, _) = make_monitor();
        monitor.trigger_emergency_stop("first");
        monitor.trigger_emergency_stop("second");
        assert_eq!(monitor.state(), SafetyState::EStop);
        assert!(monitor.estop_active());
    }

    #[test]
    fn s4_zone_emergency_triggers_estop() {
        let (monitor, _) = make_monitor();
        let scan = LidarScan::new(vec![oht50_hal::LidarPoint { angle_deg: 90.0, distance_mm: 400 }]);
        monitor.update_with_lidar(&scan);
        assert_eq!(monitor.state(), SafetyState::EStop);
        let eval = monitor.zone_evaluation().unwrap();
        assert_eq!(eval.min_distance_mm, 400);
    }

    #[test]
    fn s5_zone_warning_then_clears() {
        let (monitor, _) = make_monitor();
        let warn_scan = LidarScan::new(vec![oht50_hal::LidarPoint { angle_deg: 0.0, distance_mm: 900 }]);
        monitor.update_with_lidar(&warn_scan);
        assert_eq!(monitor.state(), SafetyState::Warning);

        let clear_scan = LidarScan::new(vec![oht50_hal::LidarPoint { angle_deg: 0.0, distance_mm: 2_500 }]);
        monitor.update_with_lidar(&clear_scan);
        assert_eq!(monitor.state(), SafetyState::Safe);
    }

    #[test]
    fn export_import_zone_config_round_trips() {
        let (monitor, _) = make_monitor();
        let doc = monitor.export_zone_config();
        let json = doc.to_json();
        monitor.import_zone_config(&json).unwrap();
        assert_eq!(monitor.zone_thresholds().emergency_mm, 500);
    }

    #[test]
    fn s6_invalid_import_leaves_config_unchanged() {
        let (monitor, _) = make_monitor();
        let mut bad = monitor.export_zone_config();
        bad.zones.emergency_zone_mm = 1_500;
        bad.zones.warning_zone_mm = 1_000;
        let result = monitor.import_zone_config(&bad.to_json());
        assert!(result.is_err());
        assert_eq!(monitor.zone_thresholds().emergency_mm, 500);
    }

    #[test]
    fn reset_statistics_zeroes_counters_not_state() {
        let (monitor, _) = make_monitor();
        monitor.trigger_emergency_stop("x");
        monitor.reset_statistics();
        let diag = monitor.diagnostics();
        assert_eq!(diag.statistics.violation_count, 0);
        assert_eq!(diag.state, SafetyState::EStop);
    }
}
