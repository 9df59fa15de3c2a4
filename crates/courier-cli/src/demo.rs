//! `courier demo`: submit a few tasks in process and print what happens.

use anyhow::Context;
use courier_core::app::{App, TaskService};
use courier_core::domain::{TaskId, TaskStatus};
use serde_json::json;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const POLL_ATTEMPTS: usize = 1000;

pub async fn run(app: &App) -> anyhow::Result<()> {
    app.start().context("starting dispatch engine")?;
    let service = app.service();

    let payload = json!({"x": 1})
        .as_object()
        .cloned()
        .unwrap_or_default();

    let completed = service.submit("example_task", payload.clone()).await?;
    println!("submitted example_task as {completed}");
    let failed = service.submit("unknown_type", payload).await?;
    println!("submitted unknown_type as {failed}");

    for id in [completed, failed] {
        let seen = follow(&service, id).await?;
        let trail: Vec<&str> = seen.iter().map(|s| s.as_str()).collect();
        println!("{id}: {}", trail.join(" -> "));

        match service.get_result(&id.to_string()).await {
            Ok(result) => println!("  result: {}", serde_json::to_string(&result.result)?),
            Err(err) => {
                let task = service.get_task(&id.to_string()).await?;
                println!("  no result ({err}); error: {}", task.error().unwrap_or("-"));
            }
        }
    }

    let missing = "task-01ARZ3NDEKTSV4RRFFQ69G5FAV";
    if let Err(err) = service.get_status(missing).await {
        println!("{missing}: {err}");
    }

    let stats = service.stats().await?;
    println!("stats: {}", serde_json::to_string(&stats)?);

    app.shutdown().await;
    Ok(())
}

/// Poll until terminal, recording each distinct status observed.
async fn follow(service: &TaskService, id: TaskId) -> anyhow::Result<Vec<TaskStatus>> {
    let id_str = id.to_string();
    let mut seen: Vec<TaskStatus> = Vec::new();
    for _ in 0..POLL_ATTEMPTS {
        let status = service.get_status(&id_str).await?;
        if seen.last() != Some(&status) {
            seen.push(status);
        }
        if status.is_terminal() {
            return Ok(seen);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    anyhow::bail!("task {id} did not finish in time")
}
