//! Sensor health checks: structurally identical to interlocks, but flag a
//! fault (not a blocked-motion condition) on deviation.

use oht50_common::consts::MAX_SENSOR_CONFIGS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorConfig {
    pub enabled: bool,
    pub min_value: i32,
    pub max_value: i32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_value: i32::MIN,
            max_value: i32::MAX,
        }
    }
}

pub struct SensorTable {
    configs: Vec<SensorConfig>,
    faulted: Vec<bool>,
}

impl Default for SensorTable {
    fn default() -> Self {
        Self {
            configs: vec![SensorConfig::default(); MAX_SENSOR_CONFIGS],
            faulted: vec![false; MAX_SENSOR_CONFIGS],
        }
    }
}

impl SensorTable {
    pub fn set(&mut self, index: usize, config: SensorConfig) -> bool {
        let Some(slot) = self.configs.get_mut(index) else {
            return false;
        };
        *slot = config;
        true
    }

    pub fn get(&self, index: usize) -> Option<SensorConfig> {
        self.configs.get(index).copied()
    }

    /// Check every enabled sensor's current value against its configured
    /// bounds. Returns true iff any enabled sensor is out of range.
    pub fn check(&mut self, read_value: impl Fn(usize) -> i32) -> bool {
        let mut any_fault = false;
        for (idx, config) in self.configs.iter().enumerate() {
            if !config.enabled {
                self.faulted[idx] = false;
                continue;
            }
            let value = read_value(idx);
            let fault = value < config.min_value || value > config.max_value;
            self.faulted[idx] = fault;
            any_fault |= fault;
        }
        any_fault
    }

    pub fn is_faulted(&self, index: usize) -> bool {
        self.faulted.get(index).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_value_faults() {
        let mut table = SensorTable::default();
        table.set(0, SensorConfig { enabled: true, min_value: 0, max_value: 100 });
        assert!(table.check(|_| 200));
        assert!(table.is_faulted(0));
    }

    #[test]
    fn in_range_value_does_not_fault() {
        let mut table = SensorTable::default();
        table.set(0, SensorConfig { enabled: true, min_value: 0, max_value: 100 });
        assert!(!table.check(|_| 50));
        assert!(!table.is_faulted(0));
    }
}
