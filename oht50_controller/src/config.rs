//! System controller initialisation configuration: a thin wrapper over
//! [`oht50_common::config::SystemControllerConfig`].

use oht50_common::config::SystemControllerConfig;

#[derive(Debug, Clone)]
pub struct ControllerInitConfig {
    pub section: SystemControllerConfig,
    /// Assumed total RAM, KB, used as the denominator for the performance
    /// metrics' `memory_percent` derivation (SPEC_FULL §4.4). Not read from
    /// `/proc/meminfo` so this module has no filesystem dependency; a
    /// reasonable default for the OHT-50's target hardware.
    pub assumed_memory_ceiling_kb: u64,
}

impl Default for ControllerInitConfig {
    fn default() -> Self {
        Self {
            section: SystemControllerConfig::default(),
            assumed_memory_ceiling_kb: 2 * 1024 * 1024,
        }
    }
}
