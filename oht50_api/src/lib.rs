//! In-process `CoreApi` surface (SPEC_FULL §6). The core does not parse
//! HTTP itself — an out-of-scope shim (see `bin/oht50-api-shim` in this
//! crate) translates HTTP/WebSocket requests into calls against this trait
//! and is responsible for bearer-token authentication and per-register
//! access-level authorisation before any write reaches here.

pub mod error;

use oht50_control_loop::{ControlLoop, ControlLoopState, CycleStats};
use oht50_controller::{ControllerState, SystemController};
use oht50_safety::{SafetyMonitor, SafetyState, ZoneThresholds};
use oht50_scheduler::{Scheduler, TaskSnapshot};

pub use error::ApiError;

#[derive(Debug, Clone, Copy)]
pub struct SystemSnapshot {
    pub controller_state: ControllerState,
    pub safety_state: SafetyState,
    pub control_loop_state: ControlLoopState,
    pub estop_active: bool,
    pub last_fault_code: u32,
    pub last_estop_latency_us: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct ZoneSnapshot {
    pub thresholds: ZoneThresholds,
    pub min_distance_mm: Option<u32>,
    pub min_angle_deg: Option<f32>,
}

/// Read and write operations the (out-of-scope) HTTP/WebSocket shim
/// translates requests into. Every write is assumed pre-authenticated and
/// pre-authorised by the caller (SPEC_FULL §6) — this trait carries no
/// auth concept of its own.
pub trait CoreApi {
    fn system_snapshot(&self) -> SystemSnapshot;
    fn control_loop_stats(&self) -> CycleStats;
    fn task_snapshots(&self) -> Vec<TaskSnapshot>;
    fn zone_snapshot(&self) -> ZoneSnapshot;

    fn request_emergency_stop(&self, reason: &str);
    fn request_safety_reset(&self) -> Result<(), ApiError>;
    fn replace_zone_config(&self, thresholds: ZoneThresholds) -> Result<(), ApiError>;
    fn activate(&self) -> Result<(), ApiError>;
    fn deactivate(&self) -> Result<(), ApiError>;
}

/// The concrete `CoreApi`, composing handles to the four subsystems plus
/// the scheduler. Cheap to clone — every field is an `Arc`-backed handle.
#[derive(Clone)]
pub struct CoreApiImpl {
    pub scheduler: std::sync::Arc<Scheduler>,
    pub control_loop: ControlLoop,
    pub safety: SafetyMonitor,
    pub controller: SystemController,
}

impl CoreApi for CoreApiImpl {
    fn system_snapshot(&self) -> SystemSnapshot {
        let diag = self.safety.diagnostics();
        SystemSnapshot {
            controller_state: self.controller.state(),
            safety_state: diag.state,
            control_loop_state: self.control_loop.state(),
            estop_active: diag.estop_active,
            last_fault_code: diag.last_fault_code,
            last_estop_latency_us: diag.last_estop_latency_us,
        }
    }

    fn control_loop_stats(&self) -> CycleStats {
        self.control_loop.get_stats()
    }

    fn task_snapshots(&self) -> Vec<TaskSnapshot> {
        self.scheduler.task_snapshots()
    }

    fn zone_snapshot(&self) -> ZoneSnapshot {
        let eval = self.safety.zone_evaluation();
        ZoneSnapshot {
            thresholds: self.safety.zone_thresholds(),
            min_distance_mm: eval.map(|e| e.min_distance_mm),
            min_angle_deg: eval.map(|e| e.min_angle_deg),
        }
    }

    fn request_emergency_stop(&self, reason: &str) {
        self.safety.trigger_emergency_stop(reason);
    }

    fn request_safety_reset(&self) -> Result<(), ApiError> {
        self.safety.reset().map_err(ApiError::from)
    }

    fn replace_zone_config(&self, thresholds: ZoneThresholds) -> Result<(), ApiError> {
        self.safety.set_zone_thresholds(thresholds).map_err(ApiError::from)
    }

    fn activate(&self) -> Result<(), ApiError> {
        self.controller
            .process_event(oht50_controller::ControllerEvent::Activate)
            .map_err(ApiError::from)
    }

    fn deactivate(&self) -> Result<(), ApiError> {
        self.controller
            .process_event(oht50_controller::ControllerEvent::Shutdown)
            .map_err(ApiError::from)
    }
}
