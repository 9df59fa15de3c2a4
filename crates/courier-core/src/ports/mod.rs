//! Ports - the seams between the engine and its backing services.
//!
//! Each trait hides an implementation detail the engine should not care
//! about: where records live, how ids are made, what time it is.

pub mod clock;
pub mod id_generator;
pub mod task_store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::task_store::TaskStore;
