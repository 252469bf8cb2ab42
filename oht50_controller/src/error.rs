use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("event queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },

    #[error("activation prerequisites not met: safety_ok={safety_ok} communication_ok={communication_ok} control_ok={control_ok}")]
    PrerequisitesNotMet {
        safety_ok: bool,
        communication_ok: bool,
        control_ok: bool,
    },

    #[error("illegal controller state transition: {0}")]
    IllegalTransition(&'static str),
}
