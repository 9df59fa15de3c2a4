//! Typed - task routines and their registry.
//!
//! # Two layers
//! - **Typed**: `Task` trait, `Handler<T>` trait. Payload and result are Rust
//!   types, decoded and encoded by `PayloadCodec`.
//! - **Dyn**: `DynHandler`, object-safe, JSON in and JSON out. This is what
//!   the registry stores and the runtime calls.

pub mod codec;
pub mod handler;
pub mod registry;
pub mod task;

pub use self::codec::{CodecError, PayloadCodec};
pub use self::handler::{DynHandler, FnHandler, Handler, TypedHandler};
pub use self::registry::{RegistryError, TypedRegistry};
pub use self::task::Task;
