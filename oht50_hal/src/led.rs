//! LED output shim. Pattern changes are deterministic side effects of
//! safety state-machine transitions (SPEC_FULL §4.3).

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedPattern {
    AllGreen,
    SystemFastBlink,
    ErrorSlowBlink,
    ErrorFastBlinkNonEssentialOff,
    CommSlowBlink,
    CommOff,
}

pub trait LedController: Send + Sync {
    fn set_pattern(&self, pattern: LedPattern);
    fn current_pattern(&self) -> Option<LedPattern>;
}

#[derive(Default)]
pub struct SimulatedLedController {
    pattern: Mutex<Option<LedPattern>>,
}

impl SimulatedLedController {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedController for SimulatedLedController {
    fn set_pattern(&self, pattern: LedPattern) {
        tracing::debug!(?pattern, "LED pattern set");
        *self.pattern.lock() = Some(pattern);
    }

    fn current_pattern(&self) -> Option<LedPattern> {
        *self.pattern.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_pattern_is_observed() {
        let leds = SimulatedLedController::new();
        assert_eq!(leds.current_pattern(), None);
        leds.set_pattern(LedPattern::AllGreen);
        assert_eq!(leds.current_pattern(), Some(LedPattern::AllGreen));
    }
}
