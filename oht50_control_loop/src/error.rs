use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControlLoopError {
    #[error("control loop not initialised")]
    NotInitialised,

    #[error("control loop already running")]
    AlreadyRunning,

    #[error("underlying scheduler rejected control loop task: {0}")]
    SchedulerRejected(#[from] oht50_scheduler::SchedulerError),
}
