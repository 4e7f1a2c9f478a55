//! Core data models for the network monitor

use serde::{Deserialize, Serialize};
use std::fmt;

/// One probe's rates in Mbps
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Sample {
    pub sent_rate: f64,
    pub recv_rate: f64,
}

impl Sample {
    pub fn new(sent_rate: f64, recv_rate: f64) -> Self {
        Self {
            sent_rate,
            recv_rate,
        }
    }
}

/// Samples collected during one cycle, in probe order
///
/// Both sequences only grow together through [`SampleWindow::push`], so they
/// always have the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SampleWindow {
    sent_rates: Vec<f64>,
    recv_rates: Vec<f64>,
}

impl SampleWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: Sample) {
        self.sent_rates.push(sample.sent_rate);
        self.recv_rates.push(sample.recv_rate);
    }

    pub fn clear(&mut self) {
        self.sent_rates.clear();
        self.recv_rates.clear();
    }

    pub fn len(&self) -> usize {
        self.sent_rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent_rates.is_empty()
    }

    pub fn sent_rates(&self) -> &[f64] {
        &self.sent_rates
    }

    pub fn recv_rates(&self) -> &[f64] {
        &self.recv_rates
    }

    /// The first probe of the window, or 0.0/0.0 when nothing was collected
    pub fn representative(&self) -> Sample {
        match (self.sent_rates.first(), self.recv_rates.first()) {
            (Some(&sent), Some(&recv)) => Sample::new(sent, recv),
            _ => Sample::default(),
        }
    }

    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        self.sent_rates
            .iter()
            .zip(&self.recv_rates)
            .map(|(&sent, &recv)| Sample::new(sent, recv))
    }
}

impl FromIterator<Sample> for SampleWindow {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        let mut window = SampleWindow::new();
        for sample in iter {
            window.push(sample);
        }
        window
    }
}

/// Alerting limits in Mbps
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub low_limit: f64,
    pub high_limit: f64,
}

impl Thresholds {
    pub fn new(low_limit: f64, high_limit: f64) -> Self {
        Self {
            low_limit,
            high_limit,
        }
    }

    pub fn is_ordered(&self) -> bool {
        self.low_limit <= self.high_limit
    }
}

/// Default interface and whether it reports up
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceState {
    name: Option<String>,
    is_up: bool,
}

impl InterfaceState {
    pub fn new(name: impl Into<String>, is_up: bool) -> Self {
        Self {
            name: Some(name.into()),
            is_up,
        }
    }

    /// No default route could be resolved
    pub fn unresolved() -> Self {
        Self {
            name: None,
            is_up: false,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_up(&self) -> bool {
        self.is_up
    }
}

/// Link health classification for one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertState {
    InterfaceDown,
    LowSpeed,
    HighSpeed,
    Ok,
}

impl AlertState {
    pub const ALL: [AlertState; 4] = [
        AlertState::InterfaceDown,
        AlertState::LowSpeed,
        AlertState::HighSpeed,
        AlertState::Ok,
    ];

    /// Human-readable alert text, also used as the graph title
    pub fn message(&self) -> &'static str {
        match self {
            AlertState::InterfaceDown => "ALERT: Interface is down!!!",
            AlertState::LowSpeed => "ALERT: Low Internet Speed Detected",
            AlertState::HighSpeed => "ALERT: High Internet Speed Detected",
            AlertState::Ok => "ALERT: Speed is OK",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertState::InterfaceDown => "interface_down",
            AlertState::LowSpeed => "low_speed",
            AlertState::HighSpeed => "high_speed",
            AlertState::Ok => "ok",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, AlertState::Ok)
    }
}

impl fmt::Display for AlertState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
