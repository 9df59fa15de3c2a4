//! courier-core
//!
//! In-process asynchronous task processing: submit a typed unit of work,
//! get an id back immediately, poll its status and result while a bounded
//! dispatch engine runs it in the background.
//!
//! # Modules
//! - **domain**: ids, task records, lifecycle states, errors
//! - **ports**: seams for storage, time and id generation
//! - **impls**: in-memory `TaskStore`
//! - **typed**: `Task`/`Handler` API, registry and payload codec
//! - **tasks**: built-in routines (`example_task`)
//! - **app**: builder, service, dispatcher, executor
//! - **config**: engine tuning
//! - **observability**: queue and status counters

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod tasks;
pub mod typed;

pub use app::{App, AppBuilder, TaskService};
pub use config::EngineConfig;
pub use domain::{CourierError, TaskId, TaskRecord, TaskResult, TaskStatus};
