//! Errors and their split between callers and task records.
//!
//! - [`CourierError`]: store- and queue-level failures, returned synchronously
//!   to whoever submitted or polled.
//! - [`ExecutionError`]: failures of a task body. Never returned to a caller;
//!   its `Display` text is written into the task record's `error` field.

use thiserror::Error;

use super::{TaskId, TaskStatus, TaskType};
use crate::typed::CodecError;

#[derive(Debug, Error)]
pub enum CourierError {
    /// No record under this id (or the id is malformed and so cannot exist).
    #[error("task not found: {0}")]
    NotFound(String),

    /// A result was requested for a task that is pending, running or failed.
    #[error("task {0} has not completed")]
    NotCompleted(TaskId),

    /// Admission-time backpressure: the dispatch queue has no free slot.
    #[error("task queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },

    /// Id collision on create. Should not happen with generated ids.
    #[error("task {0} already exists")]
    AlreadyExists(TaskId),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("task {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },

    #[error("dispatch engine is stopped")]
    EngineStopped,

    #[error("dispatch engine is already running")]
    AlreadyStarted,
}

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("unknown task type: {0}")]
    UnknownTaskType(TaskType),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("{0}")]
    Failed(String),

    #[error("handler for task type {0} panicked")]
    Panicked(TaskType),
}

impl ExecutionError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
