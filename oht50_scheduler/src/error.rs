//! Scheduler error taxonomy. Deadline misses are not represented here —
//! they are counted and logged, never returned as an error (see §4.1's
//! failure semantics).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("scheduler already initialised")]
    AlreadyInitialised,

    #[error("task table full (capacity {capacity})")]
    TableFull { capacity: usize },

    #[error("task name '{name}' exceeds maximum length {max_len}")]
    NameTooLong { name: String, max_len: usize },

    #[error("task deadline_us ({deadline_us}) must be >= period_us ({period_us}) for periodic tasks")]
    DeadlineShorterThanPeriod { period_us: u64, deadline_us: u64 },

    #[error("unknown task id {id}")]
    UnknownTask { id: u32 },

    #[error("scheduler is not running")]
    NotRunning,

    #[error("scheduler is already running")]
    AlreadyRunning,
}
