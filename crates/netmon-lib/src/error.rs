//! Error types for the monitor
//!
//! Probe failures are contained by the sampler. Everything else surfaces to
//! the loop and from there to the binary.

use std::path::PathBuf;
use thiserror::Error;

/// Bad or missing configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("invalid value {value} for `{key}`: expected the string \"true\" or \"false\"")]
    InvalidFlag { key: &'static str, value: String },

    #[error("invalid value for `{key}`: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// A single probe failed
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("no probe servers configured")]
    NoServers,

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("no probe server reachable")]
    NoReachableServer,

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("probe task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("probe measured zero elapsed time")]
    ZeroElapsed,
}

/// The host network-state query itself could not be performed
#[derive(Debug, Error)]
pub enum LivenessError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
}

/// Graph rendering or persistence failed
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("failed to create graphs directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to save graph to {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to draw graph: {0}")]
    Draw(String),

    #[error("failed to display graph: {0}")]
    Display(#[source] std::io::Error),
}

/// Unrecovered failure inside a monitor cycle; fatal for the daemon
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("monitor cycle failed: {0}")]
    Liveness(#[from] LivenessError),

    #[error("monitor cycle failed: {0}")]
    Graph(#[from] GraphError),
}
