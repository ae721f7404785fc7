//! taskpipe - Main Entry Point
//!
//! Serves a sample record-enrichment pipeline over HTTP. The pipeline
//! definition lives here; the engine, cache, and adapter live in the library.

use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use taskpipe::config::PipelineConfig;
use taskpipe::observability::init_default_logging;
use taskpipe::pipeline::{task_fn, TaskFailure, TaskSpec};
use taskpipe::server::PipelineServer;
use tokio::signal;
use tracing::{error, info};

/// Linear task-sequencing pipeline server
#[derive(Parser)]
#[command(name = "taskpipe")]
#[command(about = "Linear task-sequencing pipeline with cached data handoff")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline server
    Run,
    /// Validate configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging();

    info!("Starting taskpipe v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run => run_server(config).await,
        Commands::Config { show } => handle_config_command(config, show),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }

    info!("Application shutdown complete");
}

fn load_configuration(
    config_path: &Option<PathBuf>,
) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Ok(PipelineConfig::load_from_file(path)?)
        }
        None => {
            // Try default locations
            let default_paths = vec!["taskpipe.toml", "config/taskpipe.toml"];

            for path_str in default_paths {
                let path = PathBuf::from(path_str);
                if path.exists() {
                    info!("Loading configuration from: {}", path.display());
                    return Ok(PipelineConfig::load_from_file(&path)?);
                }
            }

            error!(
                "No configuration file found. Please provide one with -c/--config or create taskpipe.toml"
            );
            process::exit(1);
        }
    }
}

async fn run_server(config: PipelineConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        "Serving pipeline '{}' ({})",
        config.pipeline.id, config.pipeline.description
    );

    let port = std::env::var("SERVER_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(config.server.port);

    let server = Arc::new(PipelineServer::new(
        config.pipeline.id.clone(),
        port,
        sample_pipeline(),
    ));

    let server_task = server.clone();
    tokio::spawn(async move {
        if let Err(e) = server_task.start().await {
            error!("Pipeline server error: {}", e);
        }
    });

    // Graceful shutdown on SIGINT/SIGTERM
    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())?;
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;

    info!("Pipeline server is running; POST /invoke to drive a step");

    tokio::select! {
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down gracefully...");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }

    Ok(())
}

/// Sample two-step pipeline: load a record by id, then summarize it using the
/// cached output of step 1.
fn sample_pipeline() -> Vec<TaskSpec> {
    vec![
        TaskSpec::new(
            1,
            "load-record",
            task_fn(|args| async move {
                let record_id = args.first().cloned().unwrap_or(serde_json::Value::Null);
                if record_id.is_null() {
                    return Err(TaskFailure::new("LookupError", "recordId is required"));
                }
                Ok(json!({
                    "record": {
                        "id": record_id,
                        "status": "loaded",
                    }
                }))
            }),
        )
        .with_request_args(["recordId"])
        .with_cached_output(),
        TaskSpec::new(
            2,
            "summarize-record",
            task_fn(|args| async move {
                // Request-sourced arguments precede previous-task data.
                Ok(json!({
                    "summary": {
                        "note": args.first().cloned(),
                        "record": args.get(1).cloned(),
                    }
                }))
            }),
        )
        .with_request_args(["note"])
        .with_prev_task_data(1, ["record"]),
    ]
}

fn handle_config_command(
    config: PipelineConfig,
    show: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if show {
        println!("Current configuration:");
        println!("{}", toml::to_string_pretty(&config)?);
    }

    info!("Configuration validation complete");
    Ok(())
}
