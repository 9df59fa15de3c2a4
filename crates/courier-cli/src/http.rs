//! HTTP transport over [`TaskService`].

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use courier_core::app::TaskService;
use courier_core::domain::{CourierError, TaskId, TaskResult, TaskStatus};
use courier_core::observability::EngineStats;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

#[derive(Debug, Deserialize)]
pub struct SubmitTaskRequest {
    #[serde(rename = "type")]
    pub task_type: String,
    #[serde(default)]
    pub payload: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize)]
pub struct SubmitTaskResponse {
    pub task_id: TaskId,
}

#[derive(Debug, Serialize)]
pub struct TaskStatusResponse {
    pub status: TaskStatus,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// A status code plus a `{"error": ...}` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<CourierError> for ApiError {
    fn from(err: CourierError) -> Self {
        match err {
            CourierError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "task not found"),
            CourierError::NotCompleted(_) => {
                Self::new(StatusCode::NOT_FOUND, "task not completed")
            }
            CourierError::QueueFull { .. } | CourierError::EngineStopped => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, err.to_string())
            }
            CourierError::InvalidInput(_) => Self::new(StatusCode::BAD_REQUEST, err.to_string()),
            other => {
                tracing::error!(error = %other, "request failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

pub fn router(service: TaskService, request_timeout: Duration) -> Router {
    Router::new()
        .route("/tasks", post(submit_task))
        .route("/tasks/{id}", get(task_status))
        .route("/tasks/{id}/result", get(task_result))
        .route("/stats", get(stats))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(service)
}

async fn submit_task(
    State(service): State<TaskService>,
    body: Result<Json<SubmitTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitTaskResponse>), ApiError> {
    let Json(req) = body.map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected submission body");
        ApiError::new(StatusCode::BAD_REQUEST, "invalid request")
    })?;

    let task_id = service
        .submit(req.task_type, req.payload.unwrap_or_default())
        .await?;
    Ok((StatusCode::ACCEPTED, Json(SubmitTaskResponse { task_id })))
}

async fn task_status(
    State(service): State<TaskService>,
    Path(id): Path<String>,
) -> Result<Json<TaskStatusResponse>, ApiError> {
    let status = service.get_status(&id).await?;
    Ok(Json(TaskStatusResponse { status }))
}

async fn task_result(
    State(service): State<TaskService>,
    Path(id): Path<String>,
) -> Result<Json<TaskResult>, ApiError> {
    Ok(Json(service.get_result(&id).await?))
}

async fn stats(State(service): State<TaskService>) -> Result<Json<EngineStats>, ApiError> {
    Ok(Json(service.stats().await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use courier_core::app::{App, AppBuilder};
    use courier_core::config::EngineConfig;
    use courier_core::tasks::{ExampleTask, ExampleTaskHandler};
    use serde_json::json;
    use tower::ServiceExt;

    fn app(capacity: usize) -> App {
        AppBuilder::new()
            .register::<ExampleTask, _>(ExampleTaskHandler::new())
            .unwrap()
            .config(EngineConfig::default().with_queue_capacity(capacity))
            .build()
            .unwrap()
    }

    fn routes(app: &App) -> Router {
        router(app.service(), Duration::from_secs(5))
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn submit_returns_accepted_with_id() {
        let app = app(4);
        let router = routes(&app);

        let (status, body) = send(
            &router,
            post_json("/tasks", r#"{"type": "example_task", "payload": {"x": 1}}"#),
        )
        .await;

        assert_eq!(status, StatusCode::ACCEPTED);
        let id = body["task_id"].as_str().unwrap();
        assert!(id.starts_with("task-"));

        let (status, body) = send(&router, get(&format!("/tasks/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "pending"}));
    }

    #[tokio::test]
    async fn payload_is_optional() {
        let app = app(4);
        let body = r#"{"type": "example_task"}"#;
        let (status, _) = send(&routes(&app), post_json("/tasks", body)).await;
        assert_eq!(status, StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn malformed_bodies_are_bad_requests() {
        let app = app(4);
        let router = routes(&app);

        for body in [
            "not json",
            r#"{"payload": {}}"#,
            r#"{"type": "example_task", "payload": [1, 2]}"#,
        ] {
            let (status, body) = send(&router, post_json("/tasks", body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, json!({"error": "invalid request"}));
        }

        let (status, _) = send(&router, post_json("/tasks", r#"{"type": "  "}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn full_queue_is_service_unavailable() {
        let app = app(1);
        let router = routes(&app);
        let submit = r#"{"type": "example_task"}"#;

        assert_eq!(send(&router, post_json("/tasks", submit)).await.0, StatusCode::ACCEPTED);
        let (status, body) = send(&router, post_json("/tasks", submit)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].as_str().unwrap().contains("full"));
    }

    #[tokio::test]
    async fn unknown_and_unfinished_tasks_are_not_found() {
        let app = app(4);
        let router = routes(&app);

        let (status, body) = send(&router, get("/tasks/task-01ARZ3NDEKTSV4RRFFQ69G5FAV")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "task not found"}));

        let (status, _) = send(&router, get("/tasks/garbage/result")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = send(&router, post_json("/tasks", r#"{"type": "example_task"}"#)).await;
        let id = body["task_id"].as_str().unwrap().to_string();
        let (status, body) = send(&router, get(&format!("/tasks/{id}/result"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "task not completed"}));
    }

    #[tokio::test]
    async fn completed_task_result_is_served() {
        let app = app(4);
        app.start().unwrap();
        let router = routes(&app);

        let (_, body) = send(
            &router,
            post_json("/tasks", r#"{"type": "example_task", "payload": {"key": "value"}}"#),
        )
        .await;
        let id = body["task_id"].as_str().unwrap().to_string();

        let mut done = false;
        for _ in 0..200 {
            let (_, body) = send(&router, get(&format!("/tasks/{id}"))).await;
            if body["status"] == "completed" {
                done = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(done);

        let (status, body) = send(&router, get(&format!("/tasks/{id}/result"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], json!(id));
        assert_eq!(body["result"]["success"], json!(true));
        assert_eq!(body["result"]["processed"], json!({"key": "value"}));

        let (status, body) = send(&router, get("/stats")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tasks"]["completed"], json!(1));

        app.shutdown().await;
    }

    #[tokio::test]
    async fn stopped_engine_is_service_unavailable() {
        let app = app(4);
        app.start().unwrap();
        app.shutdown().await;

        let body = r#"{"type": "example_task"}"#;
        let (status, _) = send(&routes(&app), post_json("/tasks", body)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
