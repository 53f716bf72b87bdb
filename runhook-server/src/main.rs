//! Runhook
//!
//! Webhook server that validates run task requests, queues them and runs
//! their scripts one at a time, reporting each verdict back to the
//! orchestrator.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use runhook_client::OrchestratorClient;
use runhook_runner::{JobQueue, Worker};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;
pub mod service;

use api::AppState;
use config::ServeArgs;
use service::ChecksumValidator;

/// Connect timeout for every orchestrator request
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "runhook")]
#[command(about = "Run task webhook server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Accept webhooks and process queued jobs
    Serve(ServeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "runhook=info,runhook_runner=info,runhook_client=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => serve(args).await,
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    args.validate().context("Invalid configuration")?;
    let worker_config = args.worker_config();

    tracing::info!("Starting Runhook...");
    tracing::info!(
        "Scripts under {}, workspaces under {}",
        args.base_dir.join(&args.script_root).display(),
        worker_config.workspace_root.display()
    );

    let (queue, jobs) = JobQueue::bounded(worker_config.queue_capacity);
    let http_client = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")?;
    let client = OrchestratorClient::with_client(http_client);
    let worker = Arc::new(Worker::new(worker_config, client));
    let worker_handle = tokio::spawn(worker.run(jobs));

    let validator = ChecksumValidator::new(args.base_dir.clone(), &args.script_root);
    let app = api::create_router(AppState::new(validator, queue));

    let listener = tokio::net::TcpListener::bind(&args.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", args.bind_addr))?;

    tracing::info!("Listening on {}", args.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Queued jobs are in memory only and are dropped here
    worker_handle.abort();
    tracing::info!("Runhook stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
