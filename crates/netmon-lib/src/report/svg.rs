//! SVG connection-rate graphs
//!
//! Charts are drawn with plotters onto its SVG backend. Each saved file name
//! carries a millisecond timestamp and a per-renderer sequence number so
//! cycles that end within the same second keep their own graph.

use super::GraphRenderer;
use crate::error::GraphError;
use crate::models::{AlertState, SampleWindow};
use chrono::{DateTime, Local};
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

const WIDTH: u32 = 640;
const HEIGHT: u32 = 400;

const UPLOAD_COLOR: RGBColor = RGBColor(0x1f, 0x77, 0xb4);
const DOWNLOAD_COLOR: RGBColor = RGBColor(0xff, 0x7f, 0x0e);
const TITLE_COLOR: RGBColor = RGBColor(0xff, 0x00, 0x80);

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Draws connection-rate graphs, optionally printing and saving them
pub struct SvgGraphRenderer {
    graphs_dir: PathBuf,
    show: bool,
    save: bool,
    saved: AtomicU64,
}

impl SvgGraphRenderer {
    pub fn new(graphs_dir: impl Into<PathBuf>, show: bool, save: bool) -> Self {
        Self {
            graphs_dir: graphs_dir.into(),
            show,
            save,
            saved: AtomicU64::new(0),
        }
    }

    /// Create the graphs directory when saving is enabled
    pub fn prepare(&self) -> Result<(), GraphError> {
        if self.save {
            fs::create_dir_all(&self.graphs_dir).map_err(|source| GraphError::CreateDir {
                path: self.graphs_dir.clone(),
                source,
            })?;
        }
        Ok(())
    }

    fn show(&self, window: &SampleWindow, alert: AlertState) -> Result<(), GraphError> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        write_sparklines(&mut out, window, alert).map_err(GraphError::Display)
    }

    fn next_path(&self, now: DateTime<Local>) -> PathBuf {
        let seq = self.saved.fetch_add(1, Ordering::Relaxed);
        self.graphs_dir.join(format!(
            "connection_rate_{}_{:04}.svg",
            now.format("%Y-%m-%d_%H-%M-%S-%3f"),
            seq
        ))
    }
}

impl GraphRenderer for SvgGraphRenderer {
    fn render(&self, window: &SampleWindow, alert: AlertState) -> Result<Option<PathBuf>, GraphError> {
        if self.show {
            self.show(window, alert)?;
        }

        if !self.save {
            return Ok(None);
        }

        let now = Local::now();
        let svg = render_svg(window, alert, now)?;
        let path = self.next_path(now);

        fs::write(&path, svg).map_err(|source| GraphError::Save {
            path: path.clone(),
            source,
        })?;

        info!(path = %path.display(), "Saved connection rate graph");
        Ok(Some(path))
    }
}

fn write_sparklines<W: Write>(out: &mut W, window: &SampleWindow, alert: AlertState) -> io::Result<()> {
    writeln!(out, "{}", alert.message())?;
    writeln!(out, "Upload   {}", render_sparkline(window.sent_rates(), window))?;
    writeln!(out, "Download {}", render_sparkline(window.recv_rates(), window))
}

/// One line of block characters scaled to the window's peak rate
pub fn render_sparkline(series: &[f64], window: &SampleWindow) -> String {
    let peak = peak_rate(window);
    series
        .iter()
        .map(|&rate| {
            let level = ((rate / peak) * (SPARK_LEVELS.len() - 1) as f64).round();
            SPARK_LEVELS[(level.max(0.0) as usize).min(SPARK_LEVELS.len() - 1)]
        })
        .collect()
}

/// Render upload and download series as an SVG line chart titled with the alert
pub fn render_svg(
    window: &SampleWindow,
    alert: AlertState,
    taken_at: DateTime<Local>,
) -> Result<String, GraphError> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area();
        draw_chart(&root, window, alert, taken_at)
            .and_then(|()| root.present())
            .map_err(|e| GraphError::Draw(e.to_string()))?;
    }
    Ok(svg)
}

fn draw_chart(
    root: &DrawingArea<SVGBackend<'_>, Shift>,
    window: &SampleWindow,
    alert: AlertState,
    taken_at: DateTime<Local>,
) -> Result<(), DrawingAreaErrorKind<io::Error>> {
    root.fill(&WHITE)?;

    let last_probe = window.len().saturating_sub(1).max(1) as f64;
    let mut chart = ChartBuilder::on(root)
        .caption(
            alert.message(),
            ("sans-serif", 20).into_font().color(&TITLE_COLOR),
        )
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..last_probe, 0f64..peak_rate(window) * 1.1)?;

    chart
        .configure_mesh()
        .x_desc(format!("Time : {}", taken_at.format("%Y-%m-%d %H:%M:%S")))
        .y_desc("Connection Rate (Mbps)")
        .x_label_formatter(&|probe| format!("{:.0}", probe))
        .draw()?;

    for (series, color, label) in [
        (window.sent_rates(), UPLOAD_COLOR, "Upload"),
        (window.recv_rates(), DOWNLOAD_COLOR, "Download"),
    ] {
        let points: Vec<(f64, f64)> = series
            .iter()
            .enumerate()
            .filter(|(_, rate)| rate.is_finite())
            .map(|(i, &rate)| (i as f64, rate))
            .collect();

        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        chart.draw_series(
            points
                .iter()
                .map(|&point| Circle::new(point, 3, color.filled())),
        )?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

/// Highest rate in either series, at least 1 Mbps so empty windows still scale
fn peak_rate(window: &SampleWindow) -> f64 {
    window
        .sent_rates()
        .iter()
        .chain(window.recv_rates())
        .copied()
        .filter(|rate| rate.is_finite())
        .fold(1.0, f64::max)
}
