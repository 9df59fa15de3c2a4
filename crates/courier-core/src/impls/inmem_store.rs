//! InMemoryTaskStore - process-lifetime task store.
//!
//! - `RwLock<HashMap<TaskId, TaskRecord>>`: pollers share the read lock,
//!   executors take the write lock for one swap.
//! - The lock is never held across an `.await`. Every method copies a
//!   record in or out and returns.
//! - Nothing is ever evicted.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use crate::domain::{CourierError, TaskId, TaskRecord, TaskStatus};
use crate::observability::StatusCounts;
use crate::ports::{Clock, SystemClock, TaskStore};

pub struct InMemoryTaskStore {
    tasks: RwLock<HashMap<TaskId, TaskRecord>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Store whose `updated_at` stamps come from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            clock,
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.read().is_empty()
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

/// A replacement may keep a non-terminal status or take one step forward.
fn check_forward(current: &TaskRecord, next: &TaskRecord) -> Result<(), CourierError> {
    let (from, to) = (current.status(), next.status());
    let same_open_state = from == to && !from.is_terminal();
    if same_open_state || from.can_transition_to(to) {
        return Ok(());
    }
    Err(CourierError::InvalidTransition {
        id: current.id(),
        from,
        to,
    })
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn create(&self, task: TaskRecord) -> Result<(), CourierError> {
        let mut tasks = self.tasks.write();
        match tasks.entry(task.id()) {
            Entry::Occupied(_) => Err(CourierError::AlreadyExists(task.id())),
            Entry::Vacant(slot) => {
                slot.insert(task);
                Ok(())
            }
        }
    }

    async fn get(&self, id: TaskId) -> Result<TaskRecord, CourierError> {
        self.tasks
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| CourierError::NotFound(id.to_string()))
    }

    async fn replace(&self, task: TaskRecord) -> Result<TaskRecord, CourierError> {
        let task = task.with_updated_at(self.clock.now());
        let mut tasks = self.tasks.write();
        let current = tasks
            .get_mut(&task.id())
            .ok_or_else(|| CourierError::NotFound(task.id().to_string()))?;
        check_forward(current, &task)?;
        *current = task.clone();
        Ok(task)
    }

    async fn counts_by_status(&self) -> Result<StatusCounts, CourierError> {
        let tasks = self.tasks.read();
        let mut counts = StatusCounts::default();
        for status in tasks.values().map(TaskRecord::status) {
            counts.record(status);
        }
        Ok(counts)
    }
}
