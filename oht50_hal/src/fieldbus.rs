//! Field bus (RS-485) capability: synchronous request/response with a
//! (module_addr, register_addr, count|values) shape. The transport and
//! per-module register maps are out of scope (SPEC_FULL §6); this is the
//! single capability the core consumes.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FieldBusError {
    #[error("request timed out")]
    Timeout,
    #[error("CRC check failed")]
    CrcError,
    #[error("frame malformed")]
    FramingError,
}

pub type FieldBusResult<T> = Result<T, FieldBusError>;

/// A single capability trait the core consumes; real transport internals
/// (serial framing, retries) are out of scope.
pub trait FieldBus: Send + Sync {
    fn read(&self, module_addr: u8, register_addr: u16, count: u16) -> FieldBusResult<Vec<u16>>;
    fn write(&self, module_addr: u8, register_addr: u16, values: &[u16]) -> FieldBusResult<()>;

    /// Whether the transport currently considers itself connected. Used by
    /// the system controller's `communication_ok` health input.
    fn is_connected(&self) -> bool;
}

/// Always-succeeds backend for tests and non-hardware runs, with optional
/// fault injection.
pub struct SimulatedFieldBus {
    connected: parking_lot::Mutex<bool>,
    inject_timeout: parking_lot::Mutex<bool>,
}

impl Default for SimulatedFieldBus {
    fn default() -> Self {
        Self {
            connected: parking_lot::Mutex::new(true),
            inject_timeout: parking_lot::Mutex::new(false),
        }
    }
}

impl SimulatedFieldBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_connected(&self, connected: bool) {
        *self.connected.lock() = connected;
    }

    pub fn inject_timeout(&self, inject: bool) {
        *self.inject_timeout.lock() = inject;
    }
}

impl FieldBus for SimulatedFieldBus {
    fn read(&self, _module_addr: u8, _register_addr: u16, count: u16) -> FieldBusResult<Vec<u16>> {
        if *self.inject_timeout.lock() {
            return Err(FieldBusError::Timeout);
        }
        if !*self.connected.lock() {
            return Err(FieldBusError::Timeout);
        }
        Ok(vec![0u16; count as usize])
    }

    fn write(&self, _module_addr: u8, _register_addr: u16, _values: &[u16]) -> FieldBusResult<()> {
        if !*self.connected.lock() {
            return Err(FieldBusError::Timeout);
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        *self.connected.lock()
    }
}
