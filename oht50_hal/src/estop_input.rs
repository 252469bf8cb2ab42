//! Hardware E-Stop digital input. The safety monitor's lock-free read path
//! samples this on its own cadence (100 µs, SPEC_FULL §4.3); it must never
//! block.

use std::sync::atomic::{AtomicBool, Ordering};

pub trait EStopInput: Send + Sync {
    /// Debounced current state of the hardware E-Stop circuit: `true` means
    /// asserted (stop requested).
    fn is_asserted(&self) -> bool;
}

/// Simulated hardware input, toggled by tests or a dev console.
#[derive(Default)]
pub struct SimulatedEStopInput {
    asserted: AtomicBool,
}

impl SimulatedEStopInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_asserted(&self, asserted: bool) {
        self.asserted.store(asserted, Ordering::Release);
    }
}

impl EStopInput for SimulatedEStopInput {
    fn is_asserted(&self) -> bool {
        self.asserted.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_released() {
        let input = SimulatedEStopInput::new();
        assert!(!input.is_asserted());
    }

    #[test]
    fn set_asserted_is_observed() {
        let input = SimulatedEStopInput::new();
        input.set_asserted(true);
        assert!(input.is_asserted());
    }
}
