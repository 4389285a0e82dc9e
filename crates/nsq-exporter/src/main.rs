//! nsq-exporter — Prometheus exporter for nsqd.
//!
//! Every scrape of the metrics path triggers one request to nsqd's stats
//! endpoint; there is no background polling and nothing is cached between
//! scrapes.
//!
//! # Usage
//!
//! ```text
//! nsq-exporter --web.listen :9117 --web.path /metrics --nsqd.addr http://localhost:4151/stats
//! ```

mod config;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use nsq_metrics::Collector;
use nsq_stats::StatsClient;

use crate::config::{Cli, ExporterConfig, LogFormat};

const DEFAULT_LOG_FILTER: &str = "info,nsq_exporter=debug,nsq_metrics=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ExporterConfig::resolve(Cli::parse())?;
    init_tracing(config.log_format);
    run(config).await
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
    }
}

async fn run(config: ExporterConfig) -> anyhow::Result<()> {
    info!("nsq exporter starting");

    let client = StatsClient::new(&config.nsqd_addr)
        .context("invalid nsqd address")?
        .with_timeout(config.nsqd_timeout);
    info!(nsqd = %client.uri(), timeout = ?config.nsqd_timeout, "stats client initialized");

    let collector = Arc::new(Collector::new(client, config.namespace.clone()));
    let router = nsq_api::build_router(collector, &config.metrics_path)?;

    // A bind failure is the only fatal runtime error.
    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;

    info!(addr = %config.listen, path = %config.metrics_path, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("nsq exporter stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            error!(error = %e, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
