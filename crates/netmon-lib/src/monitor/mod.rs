//! Monitor loop
//!
//! Each cycle checks liveness, samples a window, evaluates the first sample
//! against the thresholds and reports. Cycles never overlap.

mod r#loop;

pub use r#loop::{CycleReport, LoopPhase, MonitorLoop, MonitorLoopBuilder};
