//! Sampling and alerting loop
//!
//! Runs cycles back to back until the shutdown channel fires. A failed
//! cycle ends the loop with a [`CycleError`]; there is no cycle retry.

use crate::alert::{evaluate, AlertTracker};
use crate::config::MonitorConfig;
use crate::error::CycleError;
use crate::health::{components, HealthRegistry};
use crate::models::{AlertState, InterfaceState, Sample, SampleWindow, Thresholds};
use crate::network::{HostNetwork, InterfaceLivenessCheck};
use crate::observability::{MonitorMetrics, StructuredLogger};
use crate::probe::SpeedProbe;
use crate::report::{ConsoleEcho, GraphRenderer};
use crate::sampler::{SamplingSummary, ThroughputSampler};
use anyhow::Result;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info, warn};

/// Where the loop currently is within a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Idle,
    Sampling,
    Evaluating,
    Reporting,
}

/// Outcome of one cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub interface: InterfaceState,
    pub representative: Sample,
    pub alert: AlertState,
    pub samples: usize,
    /// Graph file written this cycle, if any
    pub graph: Option<PathBuf>,
}

/// The monitor daemon's main loop
pub struct MonitorLoop {
    liveness: InterfaceLivenessCheck,
    /// Resolved once when the loop is built
    interface: Option<String>,
    sampler: ThroughputSampler,
    renderer: Arc<dyn GraphRenderer>,
    thresholds: Thresholds,
    window_duration: Duration,
    /// Developer-mode echo target; `None` outside developer mode
    echo: Option<Box<dyn Write + Send + Sync>>,
    logger: StructuredLogger,
    metrics: Option<MonitorMetrics>,
    health: Option<HealthRegistry>,
    window: SampleWindow,
    alerts: AlertTracker,
    phase: LoopPhase,
}

impl MonitorLoop {
    /// Interface the loop checks every cycle
    pub fn interface(&self) -> Option<&str> {
        self.interface.as_deref()
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    /// Run cycles until `shutdown` receives a message or its sender is dropped
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> Result<(), CycleError> {
        info!(
            interface = ?self.interface,
            window_secs = self.window_duration.as_secs(),
            "Starting monitor loop"
        );

        loop {
            match shutdown.try_recv() {
                Err(TryRecvError::Empty) => {}
                _ => {
                    info!("Shutting down monitor loop");
                    return Ok(());
                }
            }

            if let Err(e) = self.run_cycle().await {
                self.logger.log_cycle_failure(&e);
                return Err(e);
            }
        }
    }

    /// Run a single cycle
    ///
    /// On failure the phase is left where the cycle stopped.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, CycleError> {
        self.enter(LoopPhase::Sampling);
        self.window.clear();

        let interface = match self.liveness.status(self.interface.as_deref()) {
            Ok(state) => state,
            Err(e) => {
                self.mark_unhealthy(components::LIVENESS, e.to_string()).await;
                return Err(e.into());
            }
        };

        let summary = self
            .sampler
            .sample_into(self.window_duration, &mut self.window)
            .await;

        self.enter(LoopPhase::Evaluating);
        let representative = self.window.representative();
        let alert = evaluate(
            representative.sent_rate,
            representative.recv_rate,
            &self.thresholds,
            interface.is_up(),
        );

        self.enter(LoopPhase::Reporting);
        self.logger.log_cycle(representative, alert);

        let previous = self.alerts.record(alert);
        if let Some(out) = &mut self.echo {
            if let Err(e) = ConsoleEcho.echo_to(out, representative, alert, previous) {
                warn!(error = %e, "Failed to echo cycle to the console");
            }
        }

        if let Some(metrics) = &self.metrics {
            metrics.inc_cycles();
            metrics.observe_sampling_duration(summary.elapsed.as_secs_f64());
            metrics.record_cycle(representative, self.window.len(), interface.is_up(), alert);
        }
        self.update_health(&interface, &summary).await;

        let graph = match self.renderer.render(&self.window, alert) {
            Ok(graph) => graph,
            Err(e) => {
                self.mark_unhealthy(components::RENDERER, e.to_string()).await;
                return Err(e.into());
            }
        };

        if let Some(health) = &self.health {
            health.set_healthy(components::RENDERER).await;
            health.set_ready(true).await;
        }

        self.enter(LoopPhase::Idle);

        Ok(CycleReport {
            interface,
            representative,
            alert,
            samples: self.window.len(),
            graph,
        })
    }

    fn enter(&mut self, phase: LoopPhase) {
        debug!(from = ?self.phase, to = ?phase, "Monitor phase change");
        self.phase = phase;
    }

    async fn update_health(&self, interface: &InterfaceState, summary: &SamplingSummary) {
        let Some(health) = &self.health else {
            return;
        };

        match (&summary.aborted, summary.probes) {
            (Some(reason), _) => health.set_degraded(components::SAMPLER, reason.clone()).await,
            (None, 0) => {
                health
                    .set_degraded(components::SAMPLER, "window too short for any probe")
                    .await
            }
            (None, _) => health.set_healthy(components::SAMPLER).await,
        }

        match interface.name() {
            Some(_) if interface.is_up() => health.set_healthy(components::LIVENESS).await,
            Some(name) => {
                health
                    .set_degraded(components::LIVENESS, format!("interface {name} is down"))
                    .await
            }
            None => {
                health
                    .set_degraded(components::LIVENESS, "no default interface")
                    .await
            }
        }
    }

    async fn mark_unhealthy(&self, component: &str, message: String) {
        if let Some(health) = &self.health {
            health.set_unhealthy(component, message).await;
        }
    }
}

/// Builder for the monitor loop
pub struct MonitorLoopBuilder {
    probe: Option<Arc<dyn SpeedProbe>>,
    host: Option<Arc<dyn HostNetwork>>,
    renderer: Option<Arc<dyn GraphRenderer>>,
    thresholds: Option<Thresholds>,
    window_duration: Duration,
    dev_mode: bool,
    echo: Option<Box<dyn Write + Send + Sync>>,
    logger: Option<StructuredLogger>,
    metrics: Option<MonitorMetrics>,
    health: Option<HealthRegistry>,
}

impl MonitorLoopBuilder {
    pub fn new() -> Self {
        Self {
            probe: None,
            host: None,
            renderer: None,
            thresholds: None,
            window_duration: Duration::from_secs(60),
            dev_mode: false,
            echo: None,
            logger: None,
            metrics: None,
            health: None,
        }
    }

    /// Take thresholds, window length and developer mode from `config`
    pub fn config(self, config: &MonitorConfig) -> Self {
        self.thresholds(config.thresholds)
            .window_duration(config.window_duration())
            .dev_mode(config.dev_mode)
    }

    pub fn probe(mut self, probe: Arc<dyn SpeedProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn host(mut self, host: Arc<dyn HostNetwork>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn GraphRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = Some(thresholds);
        self
    }

    pub fn window_duration(mut self, duration: Duration) -> Self {
        self.window_duration = duration;
        self
    }

    pub fn dev_mode(mut self, enabled: bool) -> Self {
        self.dev_mode = enabled;
        self
    }

    /// Send the developer-mode echo here instead of stdout
    pub fn echo_writer(mut self, out: Box<dyn Write + Send + Sync>) -> Self {
        self.echo = Some(out);
        self
    }

    pub fn logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn metrics(mut self, metrics: MonitorMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    /// Build the loop, resolving the default interface once
    pub fn build(self) -> Result<MonitorLoop> {
        let probe = self
            .probe
            .ok_or_else(|| anyhow::anyhow!("Probe is required"))?;
        let host = self
            .host
            .ok_or_else(|| anyhow::anyhow!("Host network is required"))?;
        let renderer = self
            .renderer
            .ok_or_else(|| anyhow::anyhow!("Graph renderer is required"))?;
        let thresholds = self
            .thresholds
            .ok_or_else(|| anyhow::anyhow!("Thresholds are required"))?;

        let liveness = InterfaceLivenessCheck::new(host);
        let interface = liveness.resolve_default_interface();

        let echo = if self.dev_mode {
            Some(
                self.echo
                    .unwrap_or_else(|| Box::new(io::stdout()) as Box<dyn Write + Send + Sync>),
            )
        } else {
            None
        };

        let mut sampler = ThroughputSampler::new(probe);
        if let Some(metrics) = &self.metrics {
            sampler = sampler.with_metrics(metrics.clone());
        }

        Ok(MonitorLoop {
            liveness,
            interface,
            sampler,
            renderer,
            thresholds,
            window_duration: self.window_duration,
            echo,
            logger: self
                .logger
                .unwrap_or_else(|| StructuredLogger::new("localhost")),
            metrics: self.metrics,
            health: self.health,
            window: SampleWindow::new(),
            alerts: AlertTracker::new(),
            phase: LoopPhase::Idle,
        })
    }
}

impl Default for MonitorLoopBuilder {
    fn default() -> Self {
        Self::new()
    }
}
