//! TypedRegistry - the open mapping from `task_type` to routine.
//!
//! Built during initialization (mutable), shared read-only by executors
//! afterwards, so lookups need no lock.

use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use super::handler::{DynHandler, FnHandler, Handler, TypedHandler};
use super::task::Task;
use crate::domain::ExecutionError;

/// Registered routines keyed by `task_type`.
///
/// # Example
/// ```ignore
/// let mut registry = TypedRegistry::new();
/// registry.register::<ExampleTask, _>(ExampleTaskHandler::new())?;
/// registry.register_fn("echo", |payload| async move { Ok(payload) })?;
///
/// let handler = registry.get("example_task");
/// ```
pub struct TypedRegistry {
    handlers: HashMap<String, Arc<dyn DynHandler>>,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Handler for task type '{0}' is already registered")]
    AlreadyRegistered(String),
}

impl TypedRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a typed handler under `T::TYPE`.
    pub fn register<T: Task, H: Handler<T> + 'static>(
        &mut self,
        handler: H,
    ) -> Result<(), RegistryError> {
        self.insert(Arc::new(TypedHandler::<T, H>::new(handler)))
    }

    /// Register an async closure over the raw JSON payload.
    pub fn register_fn<F, Fut>(
        &mut self,
        task_type: impl Into<String>,
        f: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ExecutionError>> + Send + 'static,
    {
        self.insert(Arc::new(FnHandler::new(task_type, f)))
    }

    fn insert(&mut self, handler: Arc<dyn DynHandler>) -> Result<(), RegistryError> {
        let task_type = handler.task_type().to_string();
        if self.handlers.contains_key(&task_type) {
            return Err(RegistryError::AlreadyRegistered(task_type));
        }
        tracing::debug!(%task_type, "registered task handler");
        self.handlers.insert(task_type, handler);
        Ok(())
    }

    pub fn get(&self, task_type: &str) -> Option<Arc<dyn DynHandler>> {
        self.handlers.get(task_type).cloned()
    }

    pub fn contains(&self, task_type: &str) -> bool {
        self.handlers.contains_key(task_type)
    }

    /// Registered task types, sorted.
    pub fn registered_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.handlers.keys().cloned().collect();
        types.sort();
        types
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for TypedRegistry {
    fn default() -> Self {
        Self::new()
    }
}
