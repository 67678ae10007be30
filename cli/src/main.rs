// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # mobu
//!
//! The `mobu` binary runs flocks of monkeys generating continuous synthetic
//! load against the target platform.
//!
//! On startup it loads the YAML configuration, creates and starts every
//! configured flock, and serves the HTTP control API until it receives a
//! shutdown signal, at which point all monkeys are stopped cleanly.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use mobu_core::application::{FlockContext, FlockManager};
use mobu_core::config::AppConfig;
use mobu_core::infrastructure::{
    AlertSink, NullAlertSink, Scheduler, StandardBusinessFactory, StaticTokenProvider,
    WebhookAlertSink,
};
use mobu_core::presentation::app;

/// mobu - continuous synthetic load for the 100monkeys platform
#[derive(Parser)]
#[command(name = "mobu")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "MOBU_CONFIG_PATH", value_name = "FILE")]
    config: Option<PathBuf>,

    /// HTTP API port (default: 8000)
    #[arg(long, env = "MOBU_PORT", default_value = "8000")]
    port: u16,

    /// HTTP API host (default: 127.0.0.1)
    #[arg(long, env = "MOBU_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "MOBU_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    let config = AppConfig::load(cli.config)?;
    let replica = config.replica_info()?;
    info!(
        replica = replica.index,
        replicas = replica.count,
        flocks = config.autostart.len(),
        "starting mobu"
    );

    let client = reqwest::Client::new();
    let alerts: Arc<dyn AlertSink> = match &config.alert_hook {
        Some(url) => Arc::new(WebhookAlertSink::new(url.clone(), client.clone())),
        None => Arc::new(NullAlertSink),
    };
    let manager = Arc::new(FlockManager::new(FlockContext {
        replica,
        scheduler: Arc::new(Scheduler::new()),
        tokens: Arc::new(StaticTokenProvider),
        factory: Arc::new(StandardBusinessFactory::new(client)),
        alerts,
    }));

    manager
        .autostart(config.autostart.clone())
        .await
        .context("failed to autostart configured flocks")?;

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "serving flock API");

    axum::serve(listener, app(manager.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutting down all flocks");
    manager.aclose().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received");
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
