use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unknown task id {0}")]
    UnknownTask(u32),

    #[error(transparent)]
    Safety(#[from] oht50_safety::SafetyError),

    #[error(transparent)]
    Controller(#[from] oht50_controller::ControllerError),
}
