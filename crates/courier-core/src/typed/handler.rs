//! Handler traits - the routines that run a task body.
//!
//! Two layers:
//! - `Handler<T>`: typed, one impl per [`Task`] type.
//! - `DynHandler`: object-safe, JSON in and JSON out, what the registry stores.
//!
//! `TypedHandler<T, H>` bridges the two; `FnHandler` wraps a plain async
//! closure for routines that want the raw payload.

use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::marker::PhantomData;

use super::codec::PayloadCodec;
use super::task::Task;
use crate::domain::ExecutionError;

/// Runs one task of type `T`.
///
/// # Example
/// ```ignore
/// struct ResizeHandler;
///
/// #[async_trait]
/// impl Handler<Resize> for ResizeHandler {
///     async fn handle(&self, task: Resize) -> Result<ResizeReport, ExecutionError> {
///         resize(&task.url, task.width).await.map_err(ExecutionError::failed)
///     }
/// }
/// ```
#[async_trait]
pub trait Handler<T: Task>: Send + Sync {
    async fn handle(&self, task: T) -> Result<T::Output, ExecutionError>;
}

/// Object-safe handler, stored as `Arc<dyn DynHandler>`.
#[async_trait]
pub trait DynHandler: Send + Sync {
    async fn handle_dyn(&self, payload: Value) -> Result<Value, ExecutionError>;
    fn task_type(&self) -> &str;
}

pub struct TypedHandler<T: Task, H: Handler<T>> {
    handler: H,
    _marker: PhantomData<T>,
}

impl<T: Task, H: Handler<T>> TypedHandler<T, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T: Task, H: Handler<T>> DynHandler for TypedHandler<T, H> {
    async fn handle_dyn(&self, payload: Value) -> Result<Value, ExecutionError> {
        let task: T = PayloadCodec::decode(payload)?;
        let output = self.handler.handle(task).await?;
        Ok(PayloadCodec::encode::<T>(&output)?)
    }

    fn task_type(&self) -> &str {
        T::TYPE
    }
}

/// Closure-backed handler working on the raw JSON payload.
pub struct FnHandler<F> {
    task_type: String,
    f: F,
}

impl<F> FnHandler<F> {
    pub fn new(task_type: impl Into<String>, f: F) -> Self {
        Self {
            task_type: task_type.into(),
            f,
        }
    }
}

#[async_trait]
impl<F, Fut> DynHandler for FnHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, ExecutionError>> + Send + 'static,
{
    async fn handle_dyn(&self, payload: Value) -> Result<Value, ExecutionError> {
        (self.f)(payload).await
    }

    fn task_type(&self) -> &str {
        &self.task_type
    }
}
