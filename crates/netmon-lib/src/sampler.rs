//! Fixed-window throughput sampling
//!
//! Probes back to back until the window elapses. The first probe failure ends
//! the window early; whatever was collected is kept.

use crate::models::{Sample, SampleWindow};
use crate::observability::MonitorMetrics;
use crate::probe::{RawProbe, SpeedProbe};
use crate::units::{bits_to_bytes, to_reporting_unit};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Outcome of one sampling window
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingSummary {
    pub probes: usize,
    pub elapsed: Duration,
    /// Message of the probe failure that ended the window early
    pub aborted: Option<String>,
}

/// Collects samples from a [`SpeedProbe`] for a bounded window
pub struct ThroughputSampler {
    probe: Arc<dyn SpeedProbe>,
    metrics: Option<MonitorMetrics>,
}

impl ThroughputSampler {
    pub fn new(probe: Arc<dyn SpeedProbe>) -> Self {
        Self {
            probe,
            metrics: None,
        }
    }

    /// Count probe failures in `metrics`
    pub fn with_metrics(mut self, metrics: MonitorMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Sample into a fresh window
    pub async fn sample(&self, window_duration: Duration) -> SampleWindow {
        let mut window = SampleWindow::new();
        self.sample_into(window_duration, &mut window).await;
        window
    }

    /// Append samples to `window` until `window_duration` has elapsed
    pub async fn sample_into(
        &self,
        window_duration: Duration,
        window: &mut SampleWindow,
    ) -> SamplingSummary {
        let start = Instant::now();
        let mut probes = 0;
        let mut aborted = None;

        while start.elapsed() < window_duration {
            match self.probe.probe().await {
                Ok(raw) => {
                    let sample = convert(raw);
                    debug!(
                        sent_mbps = sample.sent_rate,
                        recv_mbps = sample.recv_rate,
                        "Probe complete"
                    );
                    window.push(sample);
                    probes += 1;
                }
                Err(e) => {
                    warn!(error = %e, collected = probes, "Probe failed, ending sampling window");
                    if let Some(metrics) = &self.metrics {
                        metrics.inc_probe_failures();
                    }
                    aborted = Some(e.to_string());
                    break;
                }
            }
        }

        SamplingSummary {
            probes,
            elapsed: start.elapsed(),
            aborted,
        }
    }
}

/// Bits per second to an Mbps sample
fn convert(raw: RawProbe) -> Sample {
    Sample::new(
        to_reporting_unit(bits_to_bytes(raw.upload_bps)),
        to_reporting_unit(bits_to_bytes(raw.download_bps)),
    )
}
