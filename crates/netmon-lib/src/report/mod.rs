//! Reporting sinks
//!
//! Graph rendering sits behind [`GraphRenderer`] so the loop can be tested
//! without touching the filesystem. [`ConsoleEcho`] formats the
//! developer-mode echo; the loop decides where it goes.

mod svg;

pub use svg::{render_sparkline, render_svg, SvgGraphRenderer};

use crate::error::GraphError;
use crate::models::{AlertState, Sample, SampleWindow};
use crate::observability::format_rate;
use colored::Colorize;
use std::io::{self, Write};
use std::path::PathBuf;

/// Renders one window of samples with its alert as the title
pub trait GraphRenderer: Send + Sync {
    /// Returns the saved file, if the renderer persisted one
    fn render(&self, window: &SampleWindow, alert: AlertState) -> Result<Option<PathBuf>, GraphError>;
}

/// Developer-mode echo of each cycle to the terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleEcho;

impl ConsoleEcho {
    /// Write the cycle's rates, its alert and any alert change to `out`
    pub fn echo_to<W: Write>(
        &self,
        out: &mut W,
        sample: Sample,
        alert: AlertState,
        previous: Option<AlertState>,
    ) -> io::Result<()> {
        writeln!(
            out,
            "Upload: {} | Download: {}",
            format_rate(sample.sent_rate),
            format_rate(sample.recv_rate)
        )?;

        let message = if alert.is_ok() {
            alert.message().green()
        } else {
            alert.message().red().bold()
        };
        writeln!(out, "{}", message)?;

        if let Some(previous) = previous {
            writeln!(out, "{}", format!("alert changed: {} -> {}", previous, alert).yellow())?;
        }

        Ok(())
    }
}
