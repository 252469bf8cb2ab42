//! System controller: supervises the scheduler, control loop, safety
//! monitor, and HAL shims — aggregates health, sequences lifecycle
//! transitions, and owns cross-subsystem error recovery (SPEC_FULL §4.4).

pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod health;
pub mod metrics;
pub mod state;

pub use config::ControllerInitConfig;
pub use controller::{DiagnosticsReport, SystemController};
pub use error::ControllerError;
pub use event::{ControllerErrorKind, ControllerErrorReport, ControllerEvent, EventQueue};
pub use health::SubsystemHealth;
pub use metrics::PerformanceMetrics;
pub use state::{ControllerState, SupervisoryStateMachine, TransitionResult};
