//! Application layer: wires ports into the running engine.
//!
//! - **AppBuilder / App**: construction and lifecycle
//! - **TaskService**: submit and poll
//! - **Dispatcher**: bounded queue plus the loop that drains it
//! - **TaskExecutor**: one task through `pending -> running -> terminal`
//! - **Runtime**: `task_type` to routine

pub mod builder;
pub mod dispatcher;
pub mod executor;
pub mod runtime;
pub mod service;

pub use self::builder::{App, AppBuilder, BuildError};
pub use self::dispatcher::{Dispatcher, EnqueueSlot};
pub use self::executor::TaskExecutor;
pub use self::runtime::Runtime;
pub use self::service::TaskService;
