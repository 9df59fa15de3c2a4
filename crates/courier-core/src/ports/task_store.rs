//! TaskStore port - the keyed collection of task records.
//!
//! The store is the only shared mutable state in the system. Everything goes
//! through `create` / `get` / `replace`; nobody mutates a stored record in
//! place.

use async_trait::async_trait;

use crate::domain::{CourierError, TaskId, TaskRecord};
use crate::observability::StatusCounts;

/// Keyed, mutable collection of task records.
///
/// # Contract
/// - Concurrent readers, exclusive writers, per operation.
/// - `get` returns an owned snapshot; later writes never show through it.
/// - `replace` stamps `updated_at` and swaps the whole record.
/// - No operation holds the lock across I/O or task execution.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert a new record. `AlreadyExists` if the id is taken.
    async fn create(&self, task: TaskRecord) -> Result<(), CourierError>;

    /// Current snapshot of the record, or `NotFound`.
    async fn get(&self, id: TaskId) -> Result<TaskRecord, CourierError>;

    /// Overwrite the record with the same id and return what was stored.
    ///
    /// `NotFound` if the id is absent, `InvalidTransition` if the status
    /// would move backwards or leave a terminal state.
    async fn replace(&self, task: TaskRecord) -> Result<TaskRecord, CourierError>;

    /// Number of records per status.
    async fn counts_by_status(&self) -> Result<StatusCounts, CourierError>;
}
