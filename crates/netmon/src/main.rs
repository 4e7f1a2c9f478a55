//! netmon - network throughput monitor
//!
//! Measures upload/download throughput every cycle, alerts when the
//! default interface is down or the rates leave the configured band,
//! and renders each window as a graph.

use anyhow::{Context, Result};
use netmon_lib::{
    api,
    health::{components, HealthRegistry},
    network::LinuxHostNetwork,
    observability::{MonitorMetrics, StructuredLogger},
    probe::HttpSpeedProbe,
    report::SvgGraphRenderer,
    MonitorConfig, MonitorLoopBuilder,
};
use std::fs::OpenOptions;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const MONITOR_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    let config = MonitorConfig::load().context("Failed to load configuration")?;

    init_tracing(&config)?;
    info!(
        low_limit = config.thresholds.low_limit,
        high_limit = config.thresholds.high_limit,
        time_interval_secs = config.time_interval_secs,
        "Monitor configured"
    );

    let host = std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
    let logger = StructuredLogger::new(host);
    let metrics = MonitorMetrics::new();

    let health = HealthRegistry::new();
    health.register(components::SAMPLER).await;
    health.register(components::LIVENESS).await;
    health.register(components::RENDERER).await;

    let renderer = SvgGraphRenderer::new(
        &config.graphs_dir,
        config.show_graphs,
        config.save_graphs,
    );
    renderer.prepare()?;

    let probe = HttpSpeedProbe::new(config.probe.clone())?;

    let monitor = MonitorLoopBuilder::new()
        .config(&config)
        .probe(Arc::new(probe))
        .host(Arc::new(LinuxHostNetwork::new()))
        .renderer(Arc::new(renderer))
        .logger(logger.clone())
        .metrics(metrics)
        .health(health.clone())
        .build()?;

    logger.log_startup(MONITOR_VERSION, monitor.interface(), &config.thresholds);

    if let Some(port) = config.metrics_port {
        let registry = health.clone();
        tokio::spawn(async move {
            if let Err(e) = api::serve(port, registry).await {
                error!(error = %e, "Health/metrics server failed");
            }
        });
    }

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let mut monitor_handle = tokio::spawn(monitor.run(shutdown_rx));

    tokio::select! {
        result = &mut monitor_handle => {
            result.context("Monitor task panicked")??;
        }
        _ = tokio::signal::ctrl_c() => {
            logger.log_shutdown("SIGINT received");
            let _ = shutdown_tx.send(());
            monitor_handle.abort();
        }
    }

    Ok(())
}

/// JSON logs to stderr, and to `log_file` when configured
fn init_tracing(config: &MonitorConfig) -> Result<()> {
    let default_level = if config.dev_mode { "debug" } else { "info" };

    let file_layer = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(fmt::layer().json().with_ansi(false).with_writer(Arc::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(fmt::layer().json().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(())
}
