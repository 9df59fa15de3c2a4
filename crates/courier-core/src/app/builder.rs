//! AppBuilder - wiring of registry, store, queue and service.
//!
//! Checks are fail-fast: a missing expected task type or an unusable engine
//! config is reported by `build()`, not on the first submission.

use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

use crate::config::{EngineConfig, EngineConfigError};
use crate::domain::{CourierError, ExecutionError};
use crate::impls::InMemoryTaskStore;
use crate::observability::EngineStats;
use crate::ports::{Clock, IdGenerator, SystemClock, TaskStore, UlidGenerator};
use crate::typed::{Handler, RegistryError, Task, TypedRegistry};

use super::dispatcher::Dispatcher;
use super::executor::TaskExecutor;
use super::runtime::Runtime;
use super::service::TaskService;

/// # Example
/// ```ignore
/// let app = AppBuilder::new()
///     .register::<ExampleTask, _>(ExampleTaskHandler::new())?
///     .expect_tasks(&[ExampleTask::TYPE])
///     .config(EngineConfig::default().with_queue_capacity(100))
///     .build()?;
/// app.start()?;
/// let id = app.service().submit("example_task", payload).await?;
/// ```
pub struct AppBuilder {
    registry: TypedRegistry,
    expected_tasks: Option<Vec<String>>,
    config: EngineConfig,
    store: Option<Arc<dyn TaskStore>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing task types: {0:?}. These tasks were expected but not registered.")]
    MissingTaskTypes(Vec<String>),

    #[error("invalid engine config: {0}")]
    InvalidConfig(#[from] EngineConfigError),
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            registry: TypedRegistry::new(),
            expected_tasks: None,
            config: EngineConfig::default(),
            store: None,
            clock: None,
            ids: None,
        }
    }

    pub fn register<T: Task, H: Handler<T> + 'static>(
        mut self,
        handler: H,
    ) -> Result<Self, RegistryError> {
        self.registry.register::<T, H>(handler)?;
        Ok(self)
    }

    pub fn register_fn<F, Fut>(
        mut self,
        task_type: impl Into<String>,
        f: F,
    ) -> Result<Self, RegistryError>
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ExecutionError>> + Send + 'static,
    {
        self.registry.register_fn(task_type, f)?;
        Ok(self)
    }

    /// Task types that must be registered by the time `build()` runs.
    pub fn expect_tasks(mut self, task_types: &[&str]) -> Self {
        self.expected_tasks = Some(task_types.iter().map(|t| t.to_string()).collect());
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Defaults to an [`InMemoryTaskStore`] on the builder's clock.
    pub fn store(mut self, store: Arc<dyn TaskStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn build(self) -> Result<App, BuildError> {
        if let Some(expected_tasks) = &self.expected_tasks {
            let missing_tasks: Vec<String> = expected_tasks
                .iter()
                .filter(|t| !self.registry.contains(t))
                .cloned()
                .collect();
            if !missing_tasks.is_empty() {
                return Err(BuildError::MissingTaskTypes(missing_tasks));
            }
        }
        self.config.validate()?;

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);
        let store = self.store.unwrap_or_else(|| {
            Arc::new(InMemoryTaskStore::with_clock(Arc::clone(&clock))) as Arc<dyn TaskStore>
        });
        let ids = self.ids.unwrap_or_else(|| {
            Arc::new(UlidGenerator::new(Arc::clone(&clock))) as Arc<dyn IdGenerator>
        });

        tracing::debug!(task_types = ?self.registry.registered_types(), "building app");

        let runtime = Arc::new(Runtime::new(Arc::new(self.registry)));
        let executor = Arc::new(TaskExecutor::new(Arc::clone(&store), runtime));
        let dispatcher = Arc::new(Dispatcher::new(&self.config, executor));
        let service = TaskService::new(store, Arc::clone(&dispatcher), ids, clock);

        Ok(App {
            service,
            dispatcher,
        })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A wired engine: the service handle plus lifecycle control.
pub struct App {
    service: TaskService,
    dispatcher: Arc<Dispatcher>,
}

impl App {
    pub fn service(&self) -> TaskService {
        self.service.clone()
    }

    /// Start the dispatch loop. Must be called from within a tokio runtime.
    pub fn start(&self) -> Result<(), CourierError> {
        self.dispatcher.start()
    }

    /// Stop accepting tasks and wait for running ones to finish.
    pub async fn shutdown(&self) {
        self.dispatcher.stop().await;
    }

    pub async fn stats(&self) -> Result<EngineStats, CourierError> {
        self.service.stats().await
    }
}
