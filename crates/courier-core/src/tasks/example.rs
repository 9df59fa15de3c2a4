//! `example_task`: echoes its payload back with a success flag and a
//! timestamp.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::domain::ExecutionError;
use crate::typed::{Handler, Task};

/// Accepts any JSON object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExampleTask {
    pub fields: Map<String, Value>,
}

impl Task for ExampleTask {
    const TYPE: &'static str = "example_task";
    type Output = ExampleOutput;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleOutput {
    pub success: bool,
    pub processed: Map<String, Value>,
    /// Unix seconds at completion.
    pub timestamp: i64,
}

/// Handler for [`ExampleTask`], with an optional simulated latency.
#[derive(Debug, Clone, Default)]
pub struct ExampleTaskHandler {
    delay: Duration,
}

impl ExampleTaskHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Handler<ExampleTask> for ExampleTaskHandler {
    async fn handle(&self, task: ExampleTask) -> Result<ExampleOutput, ExecutionError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(ExampleOutput {
            success: true,
            processed: task.fields,
            timestamp: Utc::now().timestamp(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typed::{DynHandler, TypedHandler};
    use serde_json::json;

    #[tokio::test]
    async fn echoes_payload_with_success_and_timestamp() {
        let handler = TypedHandler::<ExampleTask, _>::new(ExampleTaskHandler::new());
        let before = Utc::now().timestamp();

        let out = handler.handle_dyn(json!({"x": 1})).await.unwrap();

        assert_eq!(out["success"], json!(true));
        assert_eq!(out["processed"], json!({"x": 1}));
        assert!(out["timestamp"].as_i64().unwrap() >= before);
    }

    #[tokio::test]
    async fn rejects_non_object_payload() {
        let handler = TypedHandler::<ExampleTask, _>::new(ExampleTaskHandler::new());
        assert!(handler.handle_dyn(json!([1, 2, 3])).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn honours_configured_delay() {
        let handler = ExampleTaskHandler::with_delay(Duration::from_secs(10));
        let started = tokio::time::Instant::now();

        handler
            .handle(ExampleTask { fields: Map::new() })
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_secs(10));
    }
}
