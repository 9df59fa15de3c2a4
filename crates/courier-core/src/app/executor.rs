//! TaskExecutor - drives one task through its lifecycle.
//!
//! # Flow
//! 1. `TaskStore::get` the record. Missing: log and abandon.
//! 2. `pending -> running`, persist with `replace`.
//! 3. `Runtime::execute` the routine.
//! 4. `running -> completed | failed`, persist with `replace`.
//!
//! Nothing is retried. A failed write at step 2 or 4 is logged and the task
//! stays at whatever state was last stored.

use std::sync::Arc;

use crate::domain::{CourierError, TaskId, TaskRecord};
use crate::ports::TaskStore;

use super::runtime::Runtime;

pub struct TaskExecutor {
    store: Arc<dyn TaskStore>,
    runtime: Arc<Runtime>,
}

impl TaskExecutor {
    pub fn new(store: Arc<dyn TaskStore>, runtime: Arc<Runtime>) -> Self {
        Self { store, runtime }
    }

    /// Process one id. Returns the stored terminal record, or `None` if
    /// processing was abandoned.
    #[tracing::instrument(name = "task", skip_all, fields(task_id = %task_id))]
    pub async fn process(&self, task_id: TaskId) -> Option<TaskRecord> {
        let task = match self.store.get(task_id).await {
            Ok(task) => task,
            Err(err) => {
                tracing::error!(error = %err, "abandoning task: record could not be loaded");
                return None;
            }
        };

        let running = self.persist(task.start()).await?;
        tracing::debug!(task_type = %running.task_type(), "task running");

        let finished = match self.runtime.execute(&running).await {
            Ok(result) => running.complete(result),
            Err(err) => {
                tracing::warn!(task_type = %running.task_type(), error = %err, "task failed");
                running.fail(err.to_string())
            }
        };

        let finished = self.persist(finished).await?;
        tracing::info!(status = %finished.status(), "task finished");
        Some(finished)
    }

    async fn persist(&self, next: Result<TaskRecord, CourierError>) -> Option<TaskRecord> {
        let next = match next {
            Ok(next) => next,
            Err(err) => {
                tracing::error!(error = %err, "abandoning task: illegal lifecycle step");
                return None;
            }
        };

        let status = next.status();
        match self.store.replace(next).await {
            Ok(stored) => Some(stored),
            Err(err) => {
                tracing::error!(
                    %status,
                    error = %err,
                    "failed to persist transition; task left at its last stored state"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TaskStatus, TaskType};
    use crate::impls::InMemoryTaskStore;
    use crate::observability::StatusCounts;
    use crate::typed::TypedRegistry;
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::{Map, Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use ulid::Ulid;

    fn runtime() -> Arc<Runtime> {
        let mut registry = TypedRegistry::new();
        registry
            .register_fn("echo", |v| async move { Ok(v) })
            .unwrap();
        Arc::new(Runtime::new(Arc::new(registry)))
    }

    fn pending(task_type: &str) -> TaskRecord {
        let payload: Map<String, Value> = json!({"x": 1}).as_object().cloned().unwrap();
        TaskRecord::new(
            TaskId::from_ulid(Ulid::new()),
            TaskType::new(task_type),
            payload,
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn completes_known_task() {
        let store = Arc::new(InMemoryTaskStore::new());
        let task = pending("echo");
        store.create(task.clone()).await.unwrap();
        let executor = TaskExecutor::new(store.clone(), runtime());

        let done = executor.process(task.id()).await.unwrap();

        assert_eq!(done.status(), TaskStatus::Completed);
        assert_eq!(done.result(), Some(&json!({"x": 1})));
        assert_eq!(store.get(task.id()).await.unwrap(), done);
    }

    #[tokio::test]
    async fn unknown_type_is_recorded_as_failure() {
        let store = Arc::new(InMemoryTaskStore::new());
        let task = pending("unknown_type");
        store.create(task.clone()).await.unwrap();
        let executor = TaskExecutor::new(store.clone(), runtime());

        let done = executor.process(task.id()).await.unwrap();

        assert_eq!(done.status(), TaskStatus::Failed);
        assert_eq!(done.error(), Some("unknown task type: unknown_type"));
        assert!(done.is_consistent());
    }

    #[tokio::test]
    async fn missing_record_is_abandoned() {
        let store = Arc::new(InMemoryTaskStore::new());
        let executor = TaskExecutor::new(store.clone(), runtime());

        assert!(executor.process(TaskId::from_ulid(Ulid::new())).await.is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn already_started_record_is_left_alone() {
        let store = Arc::new(InMemoryTaskStore::new());
        let task = pending("echo");
        store.create(task.clone()).await.unwrap();
        let executor = TaskExecutor::new(store.clone(), runtime());

        executor.process(task.id()).await.unwrap();
        // a duplicate delivery of the same id
        assert!(executor.process(task.id()).await.is_none());
        assert_eq!(
            store.get(task.id()).await.unwrap().status(),
            TaskStatus::Completed
        );
    }

    /// Lets the first `allowed` replaces through, then fails every one after.
    struct FlakyStore {
        inner: InMemoryTaskStore,
        allowed: usize,
        replaces: AtomicUsize,
    }

    #[async_trait]
    impl TaskStore for FlakyStore {
        async fn create(&self, task: TaskRecord) -> Result<(), CourierError> {
            self.inner.create(task).await
        }

        async fn get(&self, id: TaskId) -> Result<TaskRecord, CourierError> {
            self.inner.get(id).await
        }

        async fn replace(&self, task: TaskRecord) -> Result<TaskRecord, CourierError> {
            if self.replaces.fetch_add(1, Ordering::SeqCst) >= self.allowed {
                return Err(CourierError::NotFound(task.id().to_string()));
            }
            self.inner.replace(task).await
        }

        async fn counts_by_status(&self) -> Result<StatusCounts, CourierError> {
            self.inner.counts_by_status().await
        }
    }

    #[tokio::test]
    async fn failed_terminal_write_leaves_task_running() {
        let store = Arc::new(FlakyStore {
            inner: InMemoryTaskStore::new(),
            allowed: 1,
            replaces: AtomicUsize::new(0),
        });
        let task = pending("echo");
        store.create(task.clone()).await.unwrap();
        let executor = TaskExecutor::new(store.clone(), runtime());

        assert!(executor.process(task.id()).await.is_none());
        assert_eq!(
            store.get(task.id()).await.unwrap().status(),
            TaskStatus::Running
        );
    }

    #[tokio::test]
    async fn failed_running_write_leaves_task_pending() {
        let store = Arc::new(FlakyStore {
            inner: InMemoryTaskStore::new(),
            allowed: 0,
            replaces: AtomicUsize::new(0),
        });
        let task = pending("echo");
        store.create(task.clone()).await.unwrap();
        let executor = TaskExecutor::new(store.clone(), runtime());

        assert!(executor.process(task.id()).await.is_none());
        assert_eq!(
            store.get(task.id()).await.unwrap().status(),
            TaskStatus::Pending
        );
        // the routine never ran: only the one rejected write happened
        assert_eq!(store.replaces.load(Ordering::SeqCst), 1);
    }
}
