//! Runtime - looks up the routine for a task and runs it.

use serde_json::Value;
use std::sync::Arc;

use crate::domain::{ExecutionError, TaskRecord};
use crate::typed::TypedRegistry;

/// Executes a task record by dispatching on its `task_type`.
pub struct Runtime {
    registry: Arc<TypedRegistry>,
}

impl Runtime {
    pub fn new(registry: Arc<TypedRegistry>) -> Self {
        Self { registry }
    }

    /// Run the routine registered for `task.task_type()`.
    ///
    /// An unknown type, a payload the routine cannot decode, a routine error
    /// and a routine panic all come back as `ExecutionError`.
    pub async fn execute(&self, task: &TaskRecord) -> Result<Value, ExecutionError> {
        let task_type = task.task_type();
        let handler = self
            .registry
            .get(task_type.as_str())
            .ok_or_else(|| ExecutionError::UnknownTaskType(task_type.clone()))?;

        let payload = Value::Object(task.payload().clone());

        // own tokio task: a panic comes back as a JoinError
        match tokio::spawn(async move { handler.handle_dyn(payload).await }).await {
            Ok(outcome) => outcome,
            Err(join_err) if join_err.is_panic() => {
                Err(ExecutionError::Panicked(task_type.clone()))
            }
            Err(join_err) => Err(ExecutionError::failed(join_err.to_string())),
        }
    }
}
