//! Real-time task dispatcher: fixed-priority, period-driven dispatch with
//! earliest-deadline-first tie-breaking within a priority band, deadline
//! accounting, and latency statistics.

#![deny(clippy::disallowed_types)]

pub mod error;
mod rt;
pub mod task;

mod dispatcher;

pub use dispatcher::{Scheduler, SchedulerStats};
pub use error::SchedulerError;
pub use task::{Priority, TaskHandle, TaskId, TaskSnapshot, TaskState};
