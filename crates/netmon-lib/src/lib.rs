//! Network throughput monitor library
//!
//! This crate provides the core functionality for:
//! - Throughput sampling against an external speed probe
//! - Default-interface liveness checks
//! - Threshold alerting
//! - Graph rendering, health checks and observability

pub mod alert;
pub mod api;
pub mod config;
pub mod error;
pub mod health;
pub mod models;
pub mod monitor;
pub mod network;
pub mod observability;
pub mod probe;
pub mod report;
pub mod sampler;
pub mod units;

pub use alert::{evaluate, AlertTracker};
pub use config::MonitorConfig;
pub use error::{ConfigError, CycleError, GraphError, LivenessError, ProbeError};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use monitor::{CycleReport, LoopPhase, MonitorLoop, MonitorLoopBuilder};
pub use observability::{MonitorMetrics, StructuredLogger};
