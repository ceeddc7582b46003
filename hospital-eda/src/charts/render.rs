//! SVG rendering with plotters.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::Palette;
use tracing::{info, instrument};

use super::{CategorySeries, Chart, ChartData, CorrelationMatrix, HistogramBin, ScatterPoint};
use crate::error::{EdaError, Result};
use crate::stats::BoxStats;

type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;
type DrawResult = std::result::Result<(), Box<dyn std::error::Error>>;

const CAPTION_FONT: (&str, u32) = ("sans-serif", 26);
const AXIS_FONT: (&str, u32) = ("sans-serif", 16);
const ANNOTATION_FONT: (&str, u32) = ("sans-serif", 14);
const MAX_LEGEND_ENTRIES: usize = 20;

/// Renders every chart into `dir`, creating it if needed.
///
/// Returns the written paths in chart order.
#[instrument(skip(charts), fields(charts = charts.len()))]
pub fn render_charts(charts: &[Chart], dir: &Path, size: (u32, u32)) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|e| EdaError::write(dir, e.to_string()))?;
    charts
        .iter()
        .map(|chart| render_chart(chart, dir, size))
        .collect()
}

/// Renders one chart to `<dir>/<file name>`.
pub fn render_chart(chart: &Chart, dir: &Path, size: (u32, u32)) -> Result<PathBuf> {
    let path = dir.join(chart.kind.file_name());
    draw(chart, &path, size).map_err(|e| EdaError::write(&path, e.to_string()))?;
    info!(chart = %chart.kind, path = %path.display(), "rendered chart");
    Ok(path)
}

fn draw(chart: &Chart, path: &Path, size: (u32, u32)) -> DrawResult {
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    match &chart.data {
        ChartData::Histogram { bins } => draw_histogram(&root, chart, bins)?,
        ChartData::Bar(series) => draw_bars(&root, chart, series)?,
        ChartData::Scatter { points } => draw_scatter(&root, chart, points)?,
        ChartData::Box { groups } => draw_boxes(&root, chart, groups)?,
        ChartData::Line(series) => draw_line(&root, chart, series)?,
        ChartData::Heatmap(matrix) => draw_heatmap(&root, chart, matrix)?,
    }
    root.present()?;
    Ok(())
}

/// Upper bound of a category axis holding `n` segments.
fn last_index(n: usize) -> u32 {
    (n as u32).saturating_sub(1).max(1)
}

fn segment_label(labels: &[String], value: &SegmentValue<u32>) -> String {
    match value {
        SegmentValue::CenterOf(i) => labels.get(*i as usize).cloned().unwrap_or_default(),
        _ => String::new(),
    }
}

/// Padded `(min, max)` of `values`.
fn value_range(values: impl Iterator<Item = f64>, pad: f64) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if min.is_finite() && max.is_finite() {
        (min - pad, max + pad)
    } else {
        (0.0, 1.0)
    }
}

fn draw_histogram(root: &Area, chart: &Chart, bins: &[HistogramBin]) -> DrawResult {
    let (x_desc, y_desc) = chart.kind.axis_labels();
    let x_min = bins.first().map_or(0.0, |b| b.start);
    let x_max = bins.last().map_or(1.0, |b| b.end);
    let y_max = bins.iter().map(|b| b.count).max().unwrap_or(0) as f64 * 1.1 + 1.0;

    let mut ctx = ChartBuilder::on(root)
        .caption(&chart.title, CAPTION_FONT)
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max, 0f64..y_max)?;
    ctx.configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .axis_desc_style(AXIS_FONT)
        .x_label_formatter(&|v: &f64| format!("{v:.0}"))
        .y_label_formatter(&|v: &f64| format!("{v:.0}"))
        .draw()?;

    ctx.draw_series(bins.iter().map(|b| {
        Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], BLUE.mix(0.6).filled())
    }))?;
    ctx.draw_series(bins.iter().map(|b| {
        Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], BLACK.stroke_width(1))
    }))?;
    Ok(())
}

fn draw_bars(root: &Area, chart: &Chart, series: &CategorySeries) -> DrawResult {
    let (x_desc, y_desc) = chart.kind.axis_labels();
    let y_max = series.values.iter().copied().fold(0.0, f64::max) * 1.1 + 1.0;

    let mut ctx = ChartBuilder::on(root)
        .caption(&chart.title, CAPTION_FONT)
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d((0u32..last_index(series.labels.len())).into_segmented(), 0f64..y_max)?;
    ctx.configure_mesh()
        .disable_x_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .axis_desc_style(AXIS_FONT)
        .x_labels(series.labels.len())
        .x_label_formatter(&|v: &SegmentValue<u32>| segment_label(&series.labels, v))
        .draw()?;

    ctx.draw_series(series.values.iter().enumerate().map(|(i, v)| {
        let i = i as u32;
        let mut bar = Rectangle::new(
            [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), *v)],
            BLUE.mix(0.7).filled(),
        );
        bar.set_margin(0, 0, 8, 8);
        bar
    }))?;
    Ok(())
}

fn draw_scatter(root: &Area, chart: &Chart, points: &[ScatterPoint]) -> DrawResult {
    let (x_desc, y_desc) = chart.kind.axis_labels();
    let (x_min, x_max) = value_range(points.iter().map(|p| p.x), 0.5);
    let groups: BTreeSet<&str> = points.iter().map(|p| p.group.as_str()).collect();

    let mut ctx = ChartBuilder::on(root)
        .caption(&chart.title, CAPTION_FONT)
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max, -0.25f64..1.25f64)?;
    ctx.configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .axis_desc_style(AXIS_FONT)
        .draw()?;

    for (i, group) in groups.iter().enumerate() {
        let style = Palette99::pick(i).filled();
        ctx.draw_series(
            points
                .iter()
                .filter(|p| p.group == *group)
                .map(|p| Circle::new((p.x, p.y), 4, style)),
        )?
        .label(*group)
        .legend(move |(x, y)| Circle::new((x, y), 4, style));
    }

    if groups.len() <= MAX_LEGEND_ENTRIES {
        ctx.configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }
    Ok(())
}

fn draw_boxes(root: &Area, chart: &Chart, groups: &[(String, BoxStats)]) -> DrawResult {
    let (x_desc, y_desc) = chart.kind.axis_labels();
    let labels: Vec<String> = groups.iter().map(|(name, _)| name.clone()).collect();
    let (y_min, y_max) = value_range(
        groups.iter().flat_map(|(_, s)| {
            s.outliers
                .iter()
                .copied()
                .chain([s.lower_whisker, s.upper_whisker])
        }),
        0.5,
    );

    let mut ctx = ChartBuilder::on(root)
        .caption(&chart.title, CAPTION_FONT)
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d((0u32..last_index(labels.len())).into_segmented(), y_min..y_max)?;
    ctx.configure_mesh()
        .disable_x_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .axis_desc_style(AXIS_FONT)
        .x_labels(labels.len())
        .x_label_formatter(&|v: &SegmentValue<u32>| segment_label(&labels, v))
        .draw()?;

    for (i, (_, stats)) in groups.iter().enumerate() {
        let i = i as u32;
        let (left, right) = (SegmentValue::Exact(i), SegmentValue::Exact(i + 1));
        let center = SegmentValue::CenterOf(i);
        let color = Palette99::pick(i as usize);

        let mut body = Rectangle::new(
            [(left.clone(), stats.q1), (right.clone(), stats.q3)],
            color.mix(0.5).filled(),
        );
        body.set_margin(0, 0, 25, 25);
        let mut outline = Rectangle::new(
            [(left.clone(), stats.q1), (right.clone(), stats.q3)],
            BLACK.stroke_width(1),
        );
        outline.set_margin(0, 0, 25, 25);
        let mut median = Rectangle::new(
            [(left, stats.median), (right, stats.median)],
            BLACK.stroke_width(2),
        );
        median.set_margin(0, 0, 25, 25);
        ctx.draw_series([body, outline, median])?;

        ctx.draw_series([
            PathElement::new(
                vec![(center.clone(), stats.lower_whisker), (center.clone(), stats.q1)],
                BLACK.stroke_width(1),
            ),
            PathElement::new(
                vec![(center.clone(), stats.q3), (center.clone(), stats.upper_whisker)],
                BLACK.stroke_width(1),
            ),
        ])?;
        ctx.draw_series(
            stats
                .outliers
                .iter()
                .map(|v| Circle::new((center.clone(), *v), 3, BLACK.stroke_width(1))),
        )?;
    }
    Ok(())
}

fn draw_line(root: &Area, chart: &Chart, series: &CategorySeries) -> DrawResult {
    let (x_desc, y_desc) = chart.kind.axis_labels();
    let (y_min, y_max) = value_range(series.values.iter().copied(), 0.25);
    let points: Vec<(SegmentValue<u32>, f64)> = series
        .values
        .iter()
        .enumerate()
        .map(|(i, v)| (SegmentValue::CenterOf(i as u32), *v))
        .collect();

    let mut ctx = ChartBuilder::on(root)
        .caption(&chart.title, CAPTION_FONT)
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d((0u32..last_index(series.labels.len())).into_segmented(), y_min..y_max)?;
    ctx.configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .axis_desc_style(AXIS_FONT)
        .x_labels(series.labels.len())
        .x_label_formatter(&|v: &SegmentValue<u32>| segment_label(&series.labels, v))
        .y_label_formatter(&|v: &f64| format!("{v:.2}"))
        .draw()?;

    ctx.draw_series(LineSeries::new(points.clone(), BLUE.stroke_width(2)))?;
    ctx.draw_series(points.into_iter().map(|p| Circle::new(p, 5, BLUE.filled())))?;
    Ok(())
}

/// Diverging blue-white-red color for a correlation in `[-1, 1]`.
fn heat_color(value: Option<f64>) -> RGBColor {
    const NEGATIVE: (f64, f64, f64) = (59.0, 76.0, 192.0);
    const NEUTRAL: (f64, f64, f64) = (221.0, 221.0, 221.0);
    const POSITIVE: (f64, f64, f64) = (180.0, 4.0, 38.0);

    let Some(v) = value else {
        return RGBColor(240, 240, 240);
    };
    let t = v.clamp(-1.0, 1.0);
    let (from, to, w) = if t < 0.0 {
        (NEUTRAL, NEGATIVE, -t)
    } else {
        (NEUTRAL, POSITIVE, t)
    };
    let mix = |a: f64, b: f64| (a + (b - a) * w).round() as u8;
    RGBColor(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}

fn draw_heatmap(root: &Area, chart: &Chart, matrix: &CorrelationMatrix) -> DrawResult {
    let n = matrix.labels.len();
    let top = last_index(n);
    let reversed: Vec<String> = matrix.labels.iter().rev().cloned().collect();

    let mut ctx = ChartBuilder::on(root)
        .caption(&chart.title, CAPTION_FONT)
        .margin(20)
        .x_label_area_size(80)
        .y_label_area_size(180)
        .build_cartesian_2d((0u32..top).into_segmented(), (0u32..top).into_segmented())?;
    ctx.configure_mesh()
        .disable_mesh()
        .x_labels(n)
        .y_labels(n)
        .x_label_formatter(&|v: &SegmentValue<u32>| segment_label(&matrix.labels, v))
        .y_label_formatter(&|v: &SegmentValue<u32>| segment_label(&reversed, v))
        .draw()?;

    let text = TextStyle::from(ANNOTATION_FONT.into_font()).pos(Pos::new(HPos::Center, VPos::Center));
    for (i, row) in matrix.values.iter().enumerate() {
        // First row at the top
        let y = (n - 1 - i) as u32;
        ctx.draw_series(row.iter().enumerate().map(|(j, v)| {
            let x = j as u32;
            Rectangle::new(
                [
                    (SegmentValue::Exact(x), SegmentValue::Exact(y)),
                    (SegmentValue::Exact(x + 1), SegmentValue::Exact(y + 1)),
                ],
                heat_color(*v).filled(),
            )
        }))?;
        ctx.draw_series(row.iter().enumerate().map(|(j, v)| {
            let label = v.map_or_else(|| "nan".to_string(), |c| format!("{c:.2}"));
            Text::new(
                label,
                (SegmentValue::CenterOf(j as u32), SegmentValue::CenterOf(y)),
                text.clone(),
            )
        }))?;
    }
    Ok(())
}
