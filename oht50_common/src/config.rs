//! Configuration loading: a single [`OhtConfig`] deserialised from TOML,
//! validated section by section before any subsystem is constructed from it.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Implemented by any section of [`OhtConfig`] that needs post-deserialize
/// validation beyond what serde's type system can express.
pub trait Validate {
    fn validate(&self) -> Result<(), ConfigError>;
}

/// Blanket loader: any `DeserializeOwned + Validate` type can be loaded from
/// a TOML file and is validated immediately after parsing.
pub trait ConfigLoader: DeserializeOwned + Validate {
    fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let parsed: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        parsed.validate()?;
        Ok(parsed)
    }
}

impl<T: DeserializeOwned + Validate> ConfigLoader for T {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SchedulerConfig {
    pub tick_period_us: u64,
    pub task_table_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_period_us: consts::SCHEDULER_TICK_US,
            task_table_capacity: consts::DEFAULT_TASK_TABLE_CAPACITY,
        }
    }
}

impl Validate for SchedulerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_period_us == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.tick_period_us must be non-zero".into(),
            ));
        }
        if self.task_table_capacity == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.task_table_capacity must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ControlLoopConfig {
    pub period_us: u64,
    pub deadline_us: u64,
    pub latency_samples: usize,
}

impl Default for ControlLoopConfig {
    fn default() -> Self {
        Self {
            period_us: consts::CONTROL_LOOP_PERIOD_US,
            deadline_us: consts::CONTROL_LOOP_DEADLINE_US,
            latency_samples: consts::DEFAULT_LATENCY_SAMPLES,
        }
    }
}

impl Validate for ControlLoopConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.deadline_us < self.period_us {
            return Err(ConfigError::Invalid(format!(
                "control_loop.deadline_us ({}) must be >= period_us ({})",
                self.deadline_us, self.period_us
            )));
        }
        if self.latency_samples == 0 {
            return Err(ConfigError::Invalid(
                "control_loop.latency_samples must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SafetyConfigSection {
    pub emergency_zone_mm: u32,
    pub warning_zone_mm: u32,
    pub safe_zone_mm: u32,
    pub estop_debounce_us: u64,
    pub max_interlocks: usize,
    pub max_sensors: usize,
}

impl Default for SafetyConfigSection {
    fn default() -> Self {
        Self {
            emergency_zone_mm: consts::FACTORY_EMERGENCY_ZONE_MM,
            warning_zone_mm: consts::FACTORY_WARNING_ZONE_MM,
            safe_zone_mm: consts::FACTORY_SAFE_ZONE_MM,
            estop_debounce_us: 5_000,
            max_interlocks: consts::MAX_INTERLOCK_CONFIGS,
            max_sensors: consts::MAX_SENSOR_CONFIGS,
        }
    }
}

impl Validate for SafetyConfigSection {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.emergency_zone_mm < self.warning_zone_mm
            && self.warning_zone_mm < self.safe_zone_mm)
        {
            return Err(ConfigError::Invalid(format!(
                "safety zone ordering violated: emergency={} warning={} safe={}",
                self.emergency_zone_mm, self.warning_zone_mm, self.safe_zone_mm
            )));
        }
        if self.emergency_zone_mm == 0 {
            return Err(ConfigError::Invalid(
                "safety.emergency_zone_mm must be > 0".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SystemControllerConfig {
    pub update_period_us: u64,
    pub event_queue_capacity: usize,
    pub max_error_count: u32,
}

impl Default for SystemControllerConfig {
    fn default() -> Self {
        Self {
            update_period_us: consts::CONTROLLER_UPDATE_PERIOD_US,
            event_queue_capacity: consts::DEFAULT_EVENT_QUEUE_CAPACITY,
            max_error_count: consts::DEFAULT_MAX_ERROR_COUNT,
        }
    }
}

impl Validate for SystemControllerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.event_queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "system_controller.event_queue_capacity must be non-zero".into(),
            ));
        }
        if self.max_error_count == 0 {
            return Err(ConfigError::Invalid(
                "system_controller.max_error_count must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct FieldBusConfig {
    pub device_path: String,
    pub baud_rate: u32,
    pub timeout_ms: u64,
}

impl Default for FieldBusConfig {
    fn default() -> Self {
        Self {
            device_path: "/dev/ttyUSB0".to_string(),
            baud_rate: 115_200,
            timeout_ms: 100,
        }
    }
}

impl Validate for FieldBusConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "fieldbus.timeout_ms must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            json: false,
        }
    }
}

impl Validate for LoggingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct OhtConfig {
    pub scheduler: SchedulerConfig,
    pub control_loop: ControlLoopConfig,
    pub safety: SafetyConfigSection,
    pub system_controller: SystemControllerConfig,
    pub fieldbus: FieldBusConfig,
    pub logging: LoggingConfig,
}

impl Validate for OhtConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.scheduler.validate()?;
        self.control_loop.validate()?;
        self.safety.validate()?;
        self.system_controller.validate()?;
        self.fieldbus.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_validates() {
        OhtConfig::default().validate().unwrap();
    }

    #[test]
    fn zone_ordering_violation_rejected() {
        let mut cfg = SafetyConfigSection::default();
        cfg.emergency_zone_mm = 1_500;
        cfg.warning_zone_mm = 1_000;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn load_from_path_roundtrips_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oht50.toml");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "").unwrap();
        let loaded = OhtConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded.scheduler.tick_period_us, consts::SCHEDULER_TICK_US);
    }

    #[test]
    fn unknown_field_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oht50.toml");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "[scheduler]\nbogus_field = 1").unwrap();
        let result = OhtConfig::load_from_path(&path);
        assert!(result.is_err());
    }

    #[test]
    fn missing_file_reports_io_error() {
        let result = OhtConfig::load_from_path(Path::new("/nonexistent/oht50.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
