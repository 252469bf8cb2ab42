use thiserror::Error;

#[derive(Debug, Error)]
pub enum SafetyError {
    #[error("E-Stop input initialisation failed: {0}")]
    EStopInitFailed(String),

    #[error("illegal safety state transition: {0}")]
    IllegalTransition(&'static str),

    #[error("reset rejected: hardware E-Stop is still active")]
    ResetRejectedHardwareActive,

    #[error("zone configuration invalid: {0}")]
    InvalidZoneConfig(#[from] crate::persist::PersistError),

    #[error("configuration index {index} out of bounds (max {max})")]
    IndexOutOfBounds { index: usize, max: usize },
}
