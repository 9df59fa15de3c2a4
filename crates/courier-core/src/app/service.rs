//! TaskService - the query/submission surface exposed to transports.

use serde_json::{Map, Value};
use std::sync::Arc;

use crate::domain::{CourierError, TaskId, TaskRecord, TaskResult, TaskStatus, TaskType};
use crate::observability::EngineStats;
use crate::ports::{Clock, IdGenerator, TaskStore};

use super::dispatcher::Dispatcher;

/// Cheap to clone; every clone talks to the same store and queue.
#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
    dispatcher: Arc<Dispatcher>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl TaskService {
    pub fn new(
        store: Arc<dyn TaskStore>,
        dispatcher: Arc<Dispatcher>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            ids,
            clock,
        }
    }

    /// Accept a task and queue it for execution.
    ///
    /// The queue slot is reserved first, so a full queue never leaves a
    /// record behind. The id only reaches the queue after its record is
    /// stored.
    ///
    /// If the engine stops while the record is being written, the call fails
    /// with `EngineStopped` and the record stays `pending`, like any id still
    /// queued at shutdown. A `stop` on another thread can still land between
    /// that check and the send; the id is then dropped with the queue and the
    /// record likewise stays `pending`.
    pub async fn submit(
        &self,
        task_type: impl Into<String>,
        payload: Map<String, Value>,
    ) -> Result<TaskId, CourierError> {
        let task_type = TaskType::parse(task_type)?;
        let slot = self.dispatcher.reserve().inspect_err(|err| {
            tracing::warn!(%task_type, error = %err, "task rejected");
        })?;

        let task = TaskRecord::new(
            self.ids.generate_task_id(),
            task_type.clone(),
            payload,
            self.clock.now(),
        );
        let task_id = task.id();
        self.store.create(task).await?;
        if self.dispatcher.is_stopped() {
            tracing::warn!(%task_id, %task_type, "engine stopped before task was queued");
            return Err(CourierError::EngineStopped);
        }
        slot.send(task_id);

        tracing::info!(%task_id, %task_type, "task accepted");
        Ok(task_id)
    }

    pub async fn get_status(&self, id: &str) -> Result<TaskStatus, CourierError> {
        Ok(self.get_task(id).await?.status())
    }

    /// The result of a completed task. Any other status is `NotCompleted`.
    pub async fn get_result(&self, id: &str) -> Result<TaskResult, CourierError> {
        let task = self.get_task(id).await?;
        match (task.status(), task.result()) {
            (TaskStatus::Completed, Some(result)) => Ok(TaskResult {
                id: task.id(),
                result: result.clone(),
            }),
            _ => Err(CourierError::NotCompleted(task.id())),
        }
    }

    /// Full record snapshot. A malformed id is reported as `NotFound`.
    pub async fn get_task(&self, id: &str) -> Result<TaskRecord, CourierError> {
        let task_id: TaskId = id
            .parse()
            .map_err(|_| CourierError::NotFound(id.to_string()))?;
        self.store.get(task_id).await
    }

    /// Queue occupancy plus per-status record counts.
    pub async fn stats(&self) -> Result<EngineStats, CourierError> {
        Ok(EngineStats {
            queue_capacity: self.dispatcher.capacity(),
            queued: self.dispatcher.queued(),
            in_flight: self.dispatcher.in_flight(),
            tasks: self.store.counts_by_status().await?,
        })
    }
}
