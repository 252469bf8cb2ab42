//! External hardware shims the core consumes as capability traits: the
//! field bus, E-Stop input, LEDs, relays and LiDAR. The core treats every
//! one of these as an out-of-scope collaborator (SPEC_FULL §1); this crate
//! gives each one a thin, typed seam plus a simulated backend so the rest
//! of the workspace can run and be tested without real hardware attached.

#![deny(clippy::disallowed_types)]

pub mod estop_input;
pub mod fieldbus;
pub mod led;
pub mod lidar;
pub mod relay;

pub use estop_input::{EStopInput, SimulatedEStopInput};
pub use fieldbus::{FieldBus, FieldBusError, FieldBusResult, SimulatedFieldBus};
pub use led::{LedController, LedPattern, SimulatedLedController};
pub use lidar::{LidarPoint, LidarScan};
pub use relay::{RelayController, SimulatedRelayController};
