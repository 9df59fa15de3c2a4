mod config;
mod demo;
mod http;
mod logging;

use anyhow::Context;
use clap::{Parser, Subcommand};
use courier_core::app::{App, AppBuilder};
use courier_core::tasks::{ExampleTask, ExampleTaskHandler};
use courier_core::typed::Task;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::config::{ConfigLoader, CourierConfig};

#[derive(Parser)]
#[command(name = "courier", version, about = "In-process async task queue")]
struct Cli {
    /// TOML config file; `COURIER_*` variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API
    Serve {
        /// Overrides `server.bind`
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Run a short end-to-end scenario and print the results
    Demo,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::new()
        .load(cli.config.as_ref())
        .context("loading configuration")?;
    logging::init(&config.logging);

    let app = build_app(&config)?;
    match cli.command {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            serve(app, &config).await
        }
        Command::Demo => demo::run(&app).await,
    }
}

fn build_app(config: &CourierConfig) -> anyhow::Result<App> {
    let app = AppBuilder::new()
        .register::<ExampleTask, _>(ExampleTaskHandler::with_delay(config.example_task.delay()))?
        .expect_tasks(&[ExampleTask::TYPE])
        .config(config.engine.clone())
        .build()?;
    Ok(app)
}

async fn serve(app: App, config: &CourierConfig) -> anyhow::Result<()> {
    app.start().context("starting dispatch engine")?;

    let router = http::router(app.service(), config.server.request_timeout());
    let listener = tokio::net::TcpListener::bind(config.server.bind)
        .await
        .with_context(|| format!("binding {}", config.server.bind))?;
    tracing::info!(bind = %config.server.bind, "courier listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server")?;

    tracing::info!("http server stopped; draining engine");
    app.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
