//! Domain model: ids, the task record, the status vocabulary and errors.
//!
//! Pure data contract. Nothing here locks, spawns or awaits.

pub mod errors;
pub mod ids;
pub mod state;
pub mod task;

pub use self::errors::{CourierError, ExecutionError};
pub use self::ids::{ParseTaskIdError, TaskId};
pub use self::state::TaskStatus;
pub use self::task::{TaskRecord, TaskResult, TaskType};
