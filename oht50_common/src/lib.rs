//! Shared plumbing for the OHT-50 master module firmware: monotonic time,
//! system-wide constants, configuration loading, CLI flags, and logging
//! initialisation.

#![deny(clippy::disallowed_types)]

pub mod cli;
pub mod config;
pub mod consts;
pub mod logging;
pub mod time;

pub use cli::Cli;
pub use config::{ConfigError, ConfigLoader, OhtConfig};
pub use time::{now_us, sleep_until_us, MonotonicClock};
