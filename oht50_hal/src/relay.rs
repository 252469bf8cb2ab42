//! Relay output shim: two independently addressable relays, de-energised
//! (fail-safe) on entry to the `estop` safety state.

use parking_lot::Mutex;

pub trait RelayController: Send + Sync {
    fn energize(&self, relay: u8);
    fn de_energize(&self, relay: u8);
    fn de_energize_all(&self);
    fn is_energized(&self, relay: u8) -> bool;
}

#[derive(Default)]
pub struct SimulatedRelayController {
    energized: Mutex<[bool; 2]>,
}

impl SimulatedRelayController {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RelayController for SimulatedRelayController {
    fn energize(&self, relay: u8) {
        if let Some(slot) = self.energized.lock().get_mut(relay as usize) {
            *slot = true;
        }
    }

    fn de_energize(&self, relay: u8) {
        if let Some(slot) = self.energized.lock().get_mut(relay as usize) {
            *slot = false;
        }
    }

    fn de_energize_all(&self) {
        let mut energized = self.energized.lock();
        for slot in energized.iter_mut() {
            *slot = false;
        }
    }

    fn is_energized(&self, relay: u8) -> bool {
        self.energized
            .lock()
            .get(relay as usize)
            .copied()
            .unwrap_or(false)
    }
}
