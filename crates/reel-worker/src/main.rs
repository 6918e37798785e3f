//! Pipeline worker binary.
//!
//! Reads one JSON command from the file named by the first argument, or
//! from stdin, runs it and prints the JSON result on stdout. Logs go to
//! stderr.

use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reel_models::UnitResult;
use reel_storage::{DisabledStore, ObjectStore, R2Client};
use reel_worker::{Orchestrator, WorkerCommand, WorkerConfig};

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();
    init_tracing();

    // Install rustls crypto provider (required for TLS/HTTPS)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("A rustls crypto provider was already installed");
    }

    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!("reel-worker failed: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let mut env_filter = EnvFilter::from_default_env();
    for directive in ["reel=info", "aws_config=warn", "aws_smithy_runtime=warn"] {
        if let Ok(directive) = directive.parse() {
            env_filter = env_filter.add_directive(directive);
        }
    }

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

/// Returns whether the command succeeded.
async fn run() -> anyhow::Result<bool> {
    let input = read_input()?;
    let command = match WorkerCommand::parse(&input) {
        Ok(command) => command,
        Err(e) => {
            let failed = UnitResult::failed("command", e.kind(), e.to_string());
            println!("{}", serde_json::to_string_pretty(&failed)?);
            return Ok(false);
        }
    };

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let store: Arc<dyn ObjectStore> = match R2Client::from_env() {
        Ok(client) => Arc::new(client),
        Err(e) => {
            warn!("Object storage not configured, publishing will fail: {}", e);
            Arc::new(DisabledStore::new(e.to_string()))
        }
    };
    let orchestrator = Orchestrator::new(config, store)?;

    info!(operation = command.name(), "Running command");
    let output = command.execute(&orchestrator).await;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(output.get("success").and_then(|v| v.as_bool()).unwrap_or(false))
}

fn read_input() -> anyhow::Result<String> {
    match std::env::args().nth(1).filter(|arg| arg != "-") {
        Some(path) => {
            std::fs::read_to_string(&path).with_context(|| format!("failed to read {path}"))
        }
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("failed to read command from stdin")?;
            Ok(input)
        }
    }
}
