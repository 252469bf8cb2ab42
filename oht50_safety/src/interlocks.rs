//! Interlock checks: physical/logical preconditions (door closed, gate
//! shut, light curtain unbroken) that must hold for motion to be permitted.
//! Structurally identical to sensor and watchdog checks (SPEC_FULL §4.3):
//! iterate configured entries, read current value, compare to expected,
//! flag deviation.

use oht50_common::consts::MAX_INTERLOCK_CONFIGS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterlockConfig {
    pub enabled: bool,
    pub expected_closed: bool,
}

impl Default for InterlockConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            expected_closed: true,
        }
    }
}

/// Fixed-capacity table of interlock configs, indexed by position.
pub struct InterlockTable {
    configs: Vec<InterlockConfig>,
    violated: Vec<bool>,
}

impl Default for InterlockTable {
    fn default() -> Self {
        Self {
            configs: vec![InterlockConfig::default(); MAX_INTERLOCK_CONFIGS],
            violated: vec![false; MAX_INTERLOCK_CONFIGS],
        }
    }
}

impl InterlockTable {
    pub fn set(&mut self, index: usize, config: InterlockConfig) -> bool {
        let Some(slot) = self.configs.get_mut(index) else {
            return false;
        };
        *slot = config;
        true
    }

    pub fn get(&self, index: usize) -> Option<InterlockConfig> {
        self.configs.get(index).copied()
    }

    /// Check every enabled interlock against `read_closed(index)`. Returns
    /// true iff any enabled interlock is violated.
    pub fn check(&mut self, read_closed: impl Fn(usize) -> bool) -> bool {
        let mut any_violated = false;
        for (idx, config) in self.configs.iter().enumerate() {
            if !config.enabled {
                self.violated[idx] = false;
                continue;
            }
            let closed = read_closed(idx);
            let violated = closed != config.expected_closed;
            self.violated[idx] = violated;
            any_violated |= violated;
        }
        any_violated
    }

    pub fn is_violated(&self, index: usize) -> bool {
        self.violated.get(index).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_interlocks_are_never_violated() {
        let mut table = InterlockTable::default();
        assert!(!table.check(|_| false));
    }

    #[test]
    fn enabled_interlock_flags_deviation() {
        let mut table = InterlockTable::default();
        table.set(0, InterlockConfig { enabled: true, expected_closed: true });
        let any = table.check(|idx| idx != 0);
        assert!(any);
        assert!(table.is_violated(0));
    }

    #[test]
    fn matching_state_is_not_violated() {
        let mut table = InterlockTable::default();
        table.set(0, InterlockConfig { enabled: true, expected_closed: true });
        let any = table.check(|_| true);
        assert!(!any);
        assert!(!table.is_violated(0));
    }
}
