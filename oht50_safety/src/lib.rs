//! Safety monitor: dual E-Stop latch, zone/interlock/sensor/watchdog checks
//! and the `{init, safe, warning, critical, estop, fault}` state machine
//! driving LED/relay side effects (SPEC_FULL §4.3).

pub mod config;
pub mod error;
pub mod estop;
pub mod interlocks;
pub mod monitor;
pub mod persist;
pub mod sensors;
pub mod state;
pub mod watchdog;
pub mod zones;

pub use config::SafetyInitConfig;
pub use error::SafetyError;
pub use estop::EStopLatch;
pub use interlocks::{InterlockConfig, InterlockTable};
pub use monitor::{SafetyDiagnostics, SafetyEventKind, SafetyMonitor, SafetyMonitorHandles, SafetyStatistics};
pub use persist::ZoneConfigDocument;
pub use sensors::{SensorConfig, SensorTable};
pub use state::{SafetyEvent, SafetyState, SafetyStateMachine, TransitionResult};
pub use watchdog::Watchdog;
pub use zones::{ZoneEvaluation, ZoneThresholds, ZoneViolations};
