//! Chart rendering with the [`plotters`] bitmap backend.
//!
//! Every chart is written as a PNG at a fixed path. Inputs are validated
//! before a drawing area is created; any backend failure is returned as a
//! [`PlotError`] and is not retried.

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::f64::consts::PI;
use std::path::Path;
use thiserror::Error;

use crate::stats::density::{histogram, kde_curve};

/// Errors that can occur during chart generation
#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Failed to create drawing area: {0}")]
    DrawingArea(String),

    #[error("Failed to configure chart: {0}")]
    ChartConfig(String),

    #[error("Failed to draw chart elements: {0}")]
    Drawing(String),

    #[error("Failed to write chart file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

type Result<T> = core::result::Result<T, PlotError>;

const FONT: &str = "sans-serif";

/// Title and axis captions of one chart.
#[derive(Debug, Clone, Default)]
pub struct ChartText {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
}

impl ChartText {
    pub fn new(title: &str, x_label: &str, y_label: &str) -> Self {
        Self {
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
        }
    }

    pub fn titled(title: &str) -> Self {
        Self::new(title, "", "")
    }
}

/// One pie slice: share in percent and its angular extent in radians.
#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub percent: f64,
    pub start: f64,
    pub sweep: f64,
}

/// Splits a circle proportionally to `values`, starting at 12 o'clock and
/// running counter-clockwise.
pub fn pie_slices(values: &[(String, f64)]) -> Result<Vec<PieSlice>> {
    let total: f64 = values.iter().map(|(_, v)| *v).sum();
    if values.is_empty() || total <= 0.0 || values.iter().any(|(_, v)| *v < 0.0) {
        return Err(PlotError::InvalidData(
            "Pie values must be non-negative with a positive total".to_string(),
        ));
    }

    let mut start = PI / 2.0;
    Ok(values
        .iter()
        .map(|(label, v)| {
            let sweep = v / total * 2.0 * PI;
            let slice = PieSlice {
                label: label.clone(),
                percent: v / total * 100.0,
                start,
                sweep,
            };
            start += sweep;
            slice
        })
        .collect())
}

fn area_for(path: &Path, size: (u32, u32)) -> Result<DrawingArea<BitMapBackend<'_>, Shift>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;
    Ok(root)
}

fn present(root: &DrawingArea<BitMapBackend<'_>, Shift>) -> Result<()> {
    root.present().map_err(|e| PlotError::Drawing(e.to_string()))
}

/// Diverging blue-white-red colormap; `t` in `[0, 1]`.
pub fn coolwarm(t: f64) -> RGBColor {
    const LOW: (f64, f64, f64) = (59.0, 76.0, 192.0);
    const MID: (f64, f64, f64) = (221.0, 221.0, 221.0);
    const HIGH: (f64, f64, f64) = (180.0, 4.0, 38.0);

    let t = if t.is_nan() { 0.5 } else { t.clamp(0.0, 1.0) };
    let (a, b, u) = if t < 0.5 {
        (LOW, MID, t * 2.0)
    } else {
        (MID, HIGH, (t - 0.5) * 2.0)
    };
    let lerp = |x: f64, y: f64| (x + (y - x) * u).round() as u8;
    RGBColor(lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
}

/// Pie chart with percentage labels.
pub fn pie_chart(values: &[(String, f64)], title: &str, output_path: &Path) -> Result<()> {
    let slices = pie_slices(values)?;

    let root = area_for(output_path, (800, 800))?;
    let area = root
        .titled(title, (FONT, 32))
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let (w, h) = area.dim_in_pixel();
    let center = (w as f64 / 2.0, h as f64 / 2.0);
    let radius = (w.min(h) as f64) * 0.35;

    for (i, slice) in slices.iter().enumerate() {
        let steps = ((slice.sweep / (2.0 * PI)) * 180.0).ceil().max(2.0) as usize;
        let mut points = vec![(center.0 as i32, center.1 as i32)];
        for s in 0..=steps {
            let angle = slice.start + slice.sweep * s as f64 / steps as f64;
            points.push((
                (center.0 + radius * angle.cos()) as i32,
                (center.1 - radius * angle.sin()) as i32,
            ));
        }

        area.draw(&Polygon::new(points, Palette99::pick(i).filled()))
            .map_err(|e| PlotError::Drawing(e.to_string()))?;

        let mid = slice.start + slice.sweep / 2.0;
        let style = TextStyle::from((FONT, 20).into_font()).pos(Pos::new(HPos::Center, VPos::Center));
        let label_at = |r: f64| {
            (
                (center.0 + r * mid.cos()) as i32,
                (center.1 - r * mid.sin()) as i32,
            )
        };

        area.draw(&Text::new(slice.label.clone(), label_at(radius * 1.15), style.clone()))
            .map_err(|e| PlotError::Drawing(e.to_string()))?;
        area.draw(&Text::new(
            format!("{:.1}%", slice.percent),
            label_at(radius * 0.6),
            style,
        ))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;
    }

    present(&root)
}

/// Upper end of the segmented category axis for `n` categories.
fn segment_end(n: usize) -> i32 {
    (n as i32 - 1).max(1)
}

fn segment_label(labels: &[String], value: &SegmentValue<i32>) -> String {
    match value {
        SegmentValue::CenterOf(i) if *i >= 0 => labels.get(*i as usize).cloned().unwrap_or_default(),
        _ => String::new(),
    }
}

/// Vertical bar chart over categories.
pub fn bar_chart(labels: &[String], values: &[f64], text: &ChartText, output_path: &Path) -> Result<()> {
    stacked_bar_chart(labels, &[("", values)], text, output_path)
}

/// Bars made of stacked series, drawn bottom-up in the order given.
///
/// A legend is drawn when any series has a non-empty name.
pub fn stacked_bar_chart(
    labels: &[String],
    series: &[(&str, &[f64])],
    text: &ChartText,
    output_path: &Path,
) -> Result<()> {
    if labels.is_empty() || series.is_empty() {
        return Err(PlotError::InvalidData("Bar data cannot be empty".to_string()));
    }
    if series.iter().any(|(_, v)| v.len() != labels.len()) {
        return Err(PlotError::InvalidData(
            "Every series needs one value per label".to_string(),
        ));
    }

    let totals: Vec<f64> = (0..labels.len())
        .map(|i| series.iter().map(|(_, v)| v[i].max(0.0)).sum())
        .collect();
    let y_max = totals.iter().copied().fold(0.0, f64::max).max(1.0) * 1.1;

    let root = area_for(output_path, (1200, 700))?;
    let mut chart = ChartBuilder::on(&root)
        .caption(&text.title, (FONT, 32))
        .margin(20)
        .x_label_area_size(80)
        .y_label_area_size(80)
        .build_cartesian_2d((0..segment_end(labels.len())).into_segmented(), 0.0..y_max)
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&|v| segment_label(labels, v))
        .x_desc(text.x_label.as_str())
        .y_desc(text.y_label.as_str())
        .label_style((FONT, 16))
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    let mut base = vec![0.0; labels.len()];
    let mut legend = false;
    for (s, (name, values)) in series.iter().enumerate() {
        let color: RGBAColor = Palette99::pick(s).to_rgba();
        let rects: Vec<Rectangle<(SegmentValue<i32>, f64)>> = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let lo = base[i];
                let hi = lo + v.max(0.0);
                base[i] = hi;
                let mut rect = Rectangle::new(
                    [
                        (SegmentValue::Exact(i as i32), lo),
                        (SegmentValue::Exact(i as i32 + 1), hi),
                    ],
                    color.filled(),
                );
                rect.set_margin(0, 0, 6, 6);
                rect
            })
            .collect();

        let drawn = chart
            .draw_series(rects)
            .map_err(|e| PlotError::Drawing(e.to_string()))?;
        if !name.is_empty() {
            legend = true;
            drawn.label(*name).legend(move |(x, y)| {
                Rectangle::new([(x, y - 6), (x + 12, y + 6)], color.filled())
            });
        }
    }

    if legend {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .label_font((FONT, 18))
            .draw()
            .map_err(|e| PlotError::Drawing(e.to_string()))?;
    }

    present(&root)
}

/// Histogram of `values` with a kernel density curve scaled to counts.
pub fn histogram_chart(values: &[f64], bins: usize, text: &ChartText, output_path: &Path) -> Result<()> {
    let bins = histogram(values, bins);
    if bins.is_empty() {
        return Err(PlotError::InvalidData("Histogram data cannot be empty".to_string()));
    }

    let x_min = bins[0].lo;
    let x_max = bins[bins.len() - 1].hi;
    let width = bins[0].hi - bins[0].lo;
    let curve = kde_curve(values, 200, values.len() as f64 * width);

    let y_top = bins
        .iter()
        .map(|b| b.count as f64)
        .chain(curve.iter().map(|(_, y)| *y))
        .fold(0.0, f64::max)
        .max(1.0)
        * 1.1;

    let root = area_for(output_path, (1200, 600))?;
    let mut chart = ChartBuilder::on(&root)
        .caption(&text.title, (FONT, 32))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d(x_min..x_max, 0.0..y_top)
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    chart
        .configure_mesh()
        .x_desc(text.x_label.as_str())
        .y_desc(text.y_label.as_str())
        .label_style((FONT, 16))
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    chart
        .draw_series(bins.iter().map(|b| {
            Rectangle::new([(b.lo, 0.0), (b.hi, b.count as f64)], BLUE.mix(0.45).filled())
        }))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    if !curve.is_empty() {
        chart
            .draw_series(LineSeries::new(curve, BLUE.stroke_width(2)))
            .map_err(|e| PlotError::Drawing(e.to_string()))?;
    }

    present(&root)
}

/// Annotated heatmap; the first row is drawn at the top.
///
/// Colours span `range` when given, otherwise the finite min/max of `cells`.
/// NaN cells are left white.
pub fn heatmap_chart(
    rows: &[String],
    cols: &[String],
    cells: &[Vec<f64>],
    decimals: usize,
    range: Option<(f64, f64)>,
    text: &ChartText,
    output_path: &Path,
) -> Result<()> {
    if rows.is_empty() || cols.is_empty() {
        return Err(PlotError::InvalidData("Heatmap needs rows and columns".to_string()));
    }
    if cells.len() != rows.len() || cells.iter().any(|r| r.len() != cols.len()) {
        return Err(PlotError::InvalidData(
            "Heatmap cells do not match its labels".to_string(),
        ));
    }

    let (lo, hi) = range.unwrap_or_else(|| {
        cells
            .iter()
            .flatten()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)))
    });
    let span = if hi > lo { hi - lo } else { 1.0 };

    let nrows = rows.len();
    let flipped: Vec<String> = rows.iter().rev().cloned().collect();

    let root = area_for(output_path, (1200, 800))?;
    let mut chart = ChartBuilder::on(&root)
        .caption(&text.title, (FONT, 30))
        .margin(20)
        .x_label_area_size(70)
        .y_label_area_size(160)
        .build_cartesian_2d(
            (0..segment_end(cols.len())).into_segmented(),
            (0..segment_end(nrows)).into_segmented(),
        )
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(cols.len())
        .y_labels(nrows)
        .x_label_formatter(&|v| segment_label(cols, v))
        .y_label_formatter(&|v| segment_label(&flipped, v))
        .x_desc(text.x_label.as_str())
        .y_desc(text.y_label.as_str())
        .label_style((FONT, 14))
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    let annotation =
        TextStyle::from((FONT, 13).into_font()).pos(Pos::new(HPos::Center, VPos::Center));

    for (r, row) in cells.iter().enumerate() {
        let y = (nrows - 1 - r) as i32;
        for (c, value) in row.iter().enumerate() {
            let x = c as i32;
            let fill = if value.is_finite() {
                coolwarm((value - lo) / span)
            } else {
                WHITE
            };

            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [
                        (SegmentValue::Exact(x), SegmentValue::Exact(y)),
                        (SegmentValue::Exact(x + 1), SegmentValue::Exact(y + 1)),
                    ],
                    fill.filled(),
                )))
                .map_err(|e| PlotError::Drawing(e.to_string()))?;

            chart
                .draw_series(std::iter::once(Text::new(
                    crate::report::format_float(*value, decimals),
                    (SegmentValue::CenterOf(x), SegmentValue::CenterOf(y)),
                    annotation.clone(),
                )))
                .map_err(|e| PlotError::Drawing(e.to_string()))?;
        }
    }

    present(&root)
}
