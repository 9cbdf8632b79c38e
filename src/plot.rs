//! SVG comparison charts
//!
//! A figure is a grid of panels sharing the same time axis. Each panel holds
//! one or more named series drawn as lines with a legend.

use anyhow::{ensure, Context, Result};
use ndarray::ArrayView1;
use plotters::prelude::*;
use std::fs;
use std::ops::Range;
use std::path::Path;

pub const CPN_CONSTANT: RGBColor = RGBColor(0xE0, 0xE0, 0xE0);
pub const CPN_RANDOM: RGBColor = RGBColor(0x72, 0xCA, 0xFF);
pub const MFA: RGBColor = RGBColor(0x5C, 0x71, 0x40);

/// Colours assigned to counting-based runs, in order: the constant-lifetime
/// run comes first, then the random one.
pub const RUN_PALETTE: [RGBColor; 4] = [CPN_CONSTANT, CPN_RANDOM, RGBColor(0xF2, 0x8E, 0x2B), RED];

/// Dash length and gap, in pixels.
const DASH: (u32, u32) = (5, 5);

#[derive(Clone)]
pub struct Line<'a> {
    pub label: String,
    pub values: ArrayView1<'a, f64>,
    pub color: RGBColor,
    pub dashed: bool,
}

#[derive(Clone)]
pub struct Panel<'a> {
    pub x_label: String,
    pub y_label: String,
    pub lines: Vec<Line<'a>>,
}

impl<'a> Panel<'a> {
    pub fn new(x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        Self {
            x_label: x_label.into(),
            y_label: y_label.into(),
            lines: Vec::new(),
        }
    }

    pub fn with_line(
        self,
        label: impl Into<String>,
        values: ArrayView1<'a, f64>,
        color: RGBColor,
    ) -> Self {
        self.push(label.into(), values, color, false)
    }

    pub fn with_dashed_line(
        self,
        label: impl Into<String>,
        values: ArrayView1<'a, f64>,
        color: RGBColor,
    ) -> Self {
        self.push(label.into(), values, color, true)
    }

    fn push(
        mut self,
        label: String,
        values: ArrayView1<'a, f64>,
        color: RGBColor,
        dashed: bool,
    ) -> Self {
        self.lines.push(Line {
            label,
            values,
            color,
            dashed,
        });
        self
    }

    /// Value range covering every finite point, padded by 5%.
    fn y_range(&self) -> Range<f64> {
        let (lo, hi) = self
            .lines
            .iter()
            .flat_map(|line| line.values.iter().copied())
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        if !lo.is_finite() || !hi.is_finite() {
            return 0.0..1.0;
        }
        let lo = lo.min(0.0);
        let span = if hi > lo { hi - lo } else { 1.0 };
        lo..hi + 0.05 * span
    }
}

/// Render `panels` on a `rows` x `cols` grid into an SVG file.
pub fn render(
    path: &Path,
    times: ArrayView1<f64>,
    panels: &[Panel],
    (rows, cols): (usize, usize),
) -> Result<()> {
    ensure!(
        panels.len() <= rows * cols,
        "{} panels do not fit a {rows}x{cols} layout",
        panels.len()
    );
    ensure!(times.len() >= 2, "at least two time points are needed to plot");
    for panel in panels {
        for line in &panel.lines {
            ensure!(
                line.values.len() == times.len(),
                "series {} has {} values for {} time points",
                line.label,
                line.values.len(),
                times.len()
            );
        }
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }

    let size = (500 * cols as u32, 350 * rows as u32);
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let x_range = times[0]..times[times.len() - 1];
    for (area, panel) in root.split_evenly((rows, cols)).iter().zip(panels) {
        let mut chart = ChartBuilder::on(area)
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(x_range.clone(), panel.y_range())?;

        chart
            .configure_mesh()
            .x_desc(panel.x_label.as_str())
            .y_desc(panel.y_label.as_str())
            .draw()?;

        for line in &panel.lines {
            let color = line.color;
            let points = times.iter().copied().zip(line.values.iter().copied());
            let series = if line.dashed {
                chart.draw_series(DashedLineSeries::new(
                    points,
                    DASH.0,
                    DASH.1,
                    color.stroke_width(2),
                ))?
            } else {
                chart.draw_series(LineSeries::new(points, color.stroke_width(2)))?
            };
            series
                .label(line.label.as_str())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    root.present()
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
