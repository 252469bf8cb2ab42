//! Structured logging initialisation, shared by every binary in the
//! workspace so log format and filtering are configured exactly once.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Install the global `tracing` subscriber. Must be called once, before any
/// subsystem starts logging. Safe to call from tests repeatedly; later
/// calls after the first are no-ops (tracing's global dispatcher can only
/// be set once per process).
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_filter_str()));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    let result = if config.json {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };

    if let Err(err) = result {
        // Another subscriber is already installed (e.g. a previous test in
        // the same process). Not fatal: logging still goes somewhere.
        eprintln!("tracing subscriber already initialised: {err}");
    }
}
