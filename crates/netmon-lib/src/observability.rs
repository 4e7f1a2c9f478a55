//! Observability infrastructure for the monitor
//!
//! Provides:
//! - Prometheus metrics (rates, alert state, probe failures, sampling time)
//! - Structured JSON logging with tracing

use crate::models::{AlertState, Sample, Thresholds};
use prometheus::{
    register_gauge, register_histogram, register_int_counter, register_int_gauge,
    register_int_gauge_vec, Gauge, Histogram, IntCounter, IntGauge, IntGaugeVec,
};
use std::sync::OnceLock;
use tracing::{error, info, warn};

/// Histogram buckets for sampling window duration (in seconds)
const WINDOW_BUCKETS: &[f64] = &[1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<MonitorMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct MonitorMetricsInner {
    cycles: IntCounter,
    probe_failures: IntCounter,
    samples_per_window: IntGauge,
    sent_rate_mbps: Gauge,
    recv_rate_mbps: Gauge,
    interface_up: IntGauge,
    alert_state: IntGaugeVec,
    sampling_duration_seconds: Histogram,
}

impl MonitorMetricsInner {
    fn new() -> Self {
        Self {
            cycles: register_int_counter!(
                "netmon_cycles_total",
                "Number of completed monitor cycles"
            )
            .expect("Failed to register cycles_total"),

            probe_failures: register_int_counter!(
                "netmon_probe_failures_total",
                "Number of probes that failed and ended a sampling window"
            )
            .expect("Failed to register probe_failures_total"),

            samples_per_window: register_int_gauge!(
                "netmon_samples_per_window",
                "Samples collected in the last sampling window"
            )
            .expect("Failed to register samples_per_window"),

            sent_rate_mbps: register_gauge!(
                "netmon_sent_rate_mbps",
                "Representative upload rate of the last cycle"
            )
            .expect("Failed to register sent_rate_mbps"),

            recv_rate_mbps: register_gauge!(
                "netmon_recv_rate_mbps",
                "Representative download rate of the last cycle"
            )
            .expect("Failed to register recv_rate_mbps"),

            interface_up: register_int_gauge!(
                "netmon_interface_up",
                "Whether the default interface was up in the last cycle"
            )
            .expect("Failed to register interface_up"),

            alert_state: register_int_gauge_vec!(
                "netmon_alert_state",
                "Current alert state (1 for the active state)",
                &["state"]
            )
            .expect("Failed to register alert_state"),

            sampling_duration_seconds: register_histogram!(
                "netmon_sampling_duration_seconds",
                "Wall time spent in each sampling window",
                WINDOW_BUCKETS.to_vec()
            )
            .expect("Failed to register sampling_duration_seconds"),
        }
    }
}

/// Monitor metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct MonitorMetrics {
    _private: (),
}

impl Default for MonitorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(MonitorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &MonitorMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn inc_cycles(&self) {
        self.inner().cycles.inc();
    }

    pub fn inc_probe_failures(&self) {
        self.inner().probe_failures.inc();
    }

    pub fn observe_sampling_duration(&self, duration_secs: f64) {
        self.inner()
            .sampling_duration_seconds
            .observe(duration_secs);
    }

    /// Record the outcome of one cycle
    pub fn record_cycle(&self, sample: Sample, samples: usize, interface_up: bool, alert: AlertState) {
        let inner = self.inner();
        inner.sent_rate_mbps.set(sample.sent_rate);
        inner.recv_rate_mbps.set(sample.recv_rate);
        inner.samples_per_window.set(samples as i64);
        inner.interface_up.set(i64::from(interface_up));

        for state in AlertState::ALL {
            inner
                .alert_state
                .with_label_values(&[state.as_str()])
                .set(i64::from(state == alert));
        }
    }
}

/// Structured logger for monitor events
///
/// Provides consistent JSON-formatted logging for cycles, alerts
/// and lifecycle events.
#[derive(Clone)]
pub struct StructuredLogger {
    host: String,
}

impl StructuredLogger {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    /// Log monitor startup
    pub fn log_startup(&self, version: &str, interface: Option<&str>, thresholds: &Thresholds) {
        info!(
            event = "monitor_started",
            host = %self.host,
            version = %version,
            interface = ?interface,
            low_limit = thresholds.low_limit,
            high_limit = thresholds.high_limit,
            "Network monitor started"
        );

        if !thresholds.is_ordered() {
            warn!(
                event = "thresholds_inverted",
                host = %self.host,
                low_limit = thresholds.low_limit,
                high_limit = thresholds.high_limit,
                "low_limit is above high_limit"
            );
        }
    }

    /// Log the per-cycle record
    pub fn log_cycle(&self, sample: Sample, alert: AlertState) {
        let upload = format_rate(sample.sent_rate);
        let download = format_rate(sample.recv_rate);

        if alert.is_ok() {
            info!(
                event = "cycle_complete",
                host = %self.host,
                upload = %upload,
                download = %download,
                alert = %alert,
                "Connection rate measured"
            );
        } else {
            warn!(
                event = "cycle_complete",
                host = %self.host,
                upload = %upload,
                download = %download,
                alert = %alert,
                alert_message = alert.message(),
                "Connection rate measured"
            );
        }
    }

    /// Log a fatal cycle failure
    pub fn log_cycle_failure(&self, error: &dyn std::error::Error) {
        error!(
            event = "cycle_failed",
            host = %self.host,
            error = %error,
            "Monitor cycle failed"
        );
    }

    /// Log monitor shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "monitor_shutdown",
            host = %self.host,
            reason = %reason,
            "Network monitor shutting down"
        );
    }
}

/// Format a rate the way the cycle record and console show it
pub fn format_rate(mbps: f64) -> String {
    format!("{:.2} Mbps", mbps)
}
