//! Descriptive charts.
//!
//! Each chart is first computed into plain data ([`ChartData`]) and then
//! rendered to an SVG file by [`render`]. Every chart filters its own rows:
//! a row missing a field one chart needs is excluded from that chart only.
//!
//! | Chart | File |
//! |-------|------|
//! | ZIP code histogram | `zip_code_histogram.svg` |
//! | Top states by hospital count | `top_states_bar.svg` |
//! | Rating vs emergency services | `rating_vs_emergency_scatter.svg` |
//! | Rating by ownership | `rating_by_ownership_box.svg` |
//! | Mean rating of the top states | `avg_rating_top_states_line.svg` |
//! | Correlation of numeric columns | `correlation_heatmap.svg` |

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::columns;
use crate::config::AnalysisConfig;
use crate::error::{EdaError, Result};
use crate::session::QuerySession;
use crate::stats::BoxStats;
use crate::table::Table;

pub mod render;

pub use render::{render_chart, render_charts};

/// The six charts of an analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    ZipCodeHistogram,
    TopStatesBar,
    RatingVsEmergencyScatter,
    RatingByOwnershipBox,
    AverageRatingTopStatesLine,
    CorrelationHeatmap,
}

impl ChartKind {
    /// All charts in rendering order.
    pub const ALL: [ChartKind; 6] = [
        ChartKind::ZipCodeHistogram,
        ChartKind::TopStatesBar,
        ChartKind::RatingVsEmergencyScatter,
        ChartKind::RatingByOwnershipBox,
        ChartKind::AverageRatingTopStatesLine,
        ChartKind::CorrelationHeatmap,
    ];

    /// Output file name.
    pub fn file_name(&self) -> &'static str {
        match self {
            ChartKind::ZipCodeHistogram => "zip_code_histogram.svg",
            ChartKind::TopStatesBar => "top_states_bar.svg",
            ChartKind::RatingVsEmergencyScatter => "rating_vs_emergency_scatter.svg",
            ChartKind::RatingByOwnershipBox => "rating_by_ownership_box.svg",
            ChartKind::AverageRatingTopStatesLine => "avg_rating_top_states_line.svg",
            ChartKind::CorrelationHeatmap => "correlation_heatmap.svg",
        }
    }

    /// Axis labels as `(x, y)`; empty for the heatmap.
    pub fn axis_labels(&self) -> (&'static str, &'static str) {
        match self {
            ChartKind::ZipCodeHistogram => ("ZIP Code", "Frequency"),
            ChartKind::TopStatesBar => ("State", "Number of Hospitals"),
            ChartKind::RatingVsEmergencyScatter => (
                "Hospital Overall Rating",
                "Emergency Services (1 = Yes, 0 = No)",
            ),
            ChartKind::RatingByOwnershipBox => ("Hospital Ownership", "Hospital Overall Rating"),
            ChartKind::AverageRatingTopStatesLine => ("State", "Average Hospital Overall Rating"),
            ChartKind::CorrelationHeatmap => ("", ""),
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name().trim_end_matches(".svg"))
    }
}

/// One equal-width histogram bin; `end` is inclusive only for the last bin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// A value per category, in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl CategorySeries {
    fn from_pairs<V: Into<f64>>(pairs: Vec<(String, V)>) -> Self {
        let (labels, values) = pairs.into_iter().map(|(l, v)| (l, v.into())).unzip();
        Self { labels, values }
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// A scatter point colored by `group`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub group: String,
}

/// A square matrix of correlations; `None` where undefined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

/// Computed chart contents.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartData {
    Histogram { bins: Vec<HistogramBin> },
    Bar(CategorySeries),
    Scatter { points: Vec<ScatterPoint> },
    Box { groups: Vec<(String, BoxStats)> },
    Line(CategorySeries),
    Heatmap(CorrelationMatrix),
}

/// A chart ready to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub kind: ChartKind,
    pub title: String,
    pub data: ChartData,
}

/// A chart left out of the run and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedChart {
    pub kind: ChartKind,
    pub reason: String,
}

/// Chart settings taken from the run configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartOptions {
    pub histogram_bins: usize,
    pub top_n_states: usize,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            histogram_bins: 20,
            top_n_states: 10,
        }
    }
}

impl From<&AnalysisConfig> for ChartOptions {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            histogram_bins: config.histogram_bins,
            top_n_states: config.top_n_states,
        }
    }
}

/// Computes every chart from the table registered in `session`.
///
/// The table is expected to have its rating column already coerced to
/// numbers. Charts without usable data, or whose columns are absent, are
/// returned as skipped instead of failing.
#[instrument(skip_all, fields(rows = session.table().num_rows()))]
pub async fn build_charts(
    session: &QuerySession,
    options: ChartOptions,
) -> Result<(Vec<Chart>, Vec<SkippedChart>)> {
    let mut charts = Vec::new();
    let mut skipped = Vec::new();

    for kind in ChartKind::ALL {
        let built = match kind {
            ChartKind::ZipCodeHistogram => zip_histogram(session.table(), options.histogram_bins),
            ChartKind::TopStatesBar => top_states(session, options.top_n_states).await,
            ChartKind::RatingVsEmergencyScatter => rating_vs_emergency(session.table()),
            ChartKind::RatingByOwnershipBox => rating_by_ownership(session.table()),
            ChartKind::AverageRatingTopStatesLine => {
                average_rating_top_states(session, options.top_n_states).await
            }
            ChartKind::CorrelationHeatmap => correlation_matrix(session).await,
        };

        let reason = match built {
            Ok(Some(data)) => {
                debug!(chart = %kind, "computed chart data");
                charts.push(Chart {
                    kind,
                    title: chart_title(kind, options.top_n_states),
                    data,
                });
                continue;
            }
            Ok(None) => "no usable data".to_string(),
            Err(EdaError::ColumnNotFound { column }) => format!("column '{column}' not found"),
            Err(e) => return Err(e),
        };
        warn!(chart = %kind, %reason, "skipping chart");
        skipped.push(SkippedChart { kind, reason });
    }

    Ok((charts, skipped))
}

/// Chart title; the state charts name how many states they show.
pub fn chart_title(kind: ChartKind, top_n: usize) -> String {
    match kind {
        ChartKind::ZipCodeHistogram => "Histogram of ZIP Codes".to_string(),
        ChartKind::TopStatesBar => format!("Top {top_n} States by Number of Hospitals"),
        ChartKind::RatingVsEmergencyScatter => {
            "Scatter Plot of Rating vs Emergency Services".to_string()
        }
        ChartKind::RatingByOwnershipBox => {
            "Box Plot of Hospital Ratings by Ownership Type".to_string()
        }
        ChartKind::AverageRatingTopStatesLine => {
            format!("Average Hospital Rating by Top {top_n} States")
        }
        ChartKind::CorrelationHeatmap => "Correlation Heatmap of Numeric Features".to_string(),
    }
}

fn numeric_cells(table: &Table, name: &str) -> Result<Vec<Option<f64>>> {
    let (coerced, _) = table.coerce_numeric(name)?;
    let data = coerced.require_column(name)?.data();
    Ok((0..data.len()).map(|row| data.f64_value(row)).collect())
}

/// Equal-width bins over `[min, max]` of the present values.
///
/// A single distinct value gets the range `[v - 0.5, v + 0.5]`.
pub fn histogram_bins(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        return Vec::new();
    }
    let mut min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let mut max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        min -= 0.5;
        max += 0.5;
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in finite {
        let index = (((v - min) / width) as usize).min(bins - 1);
        counts[index] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: min + width * i as f64,
            end: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count,
        })
        .collect()
}

fn zip_histogram(table: &Table, bins: usize) -> Result<Option<ChartData>> {
    let zips: Vec<f64> = numeric_cells(table, columns::ZIP_CODE)?
        .into_iter()
        .flatten()
        .map(f64::trunc)
        .collect();
    let bins = histogram_bins(&zips, bins);
    Ok((!bins.is_empty()).then_some(ChartData::Histogram { bins }))
}

async fn top_states(session: &QuerySession, top_n: usize) -> Result<Option<ChartData>> {
    let counts = session.value_counts(columns::STATE, top_n).await?;
    let series = CategorySeries::from_pairs(
        counts
            .into_iter()
            .map(|(state, n)| (state, n as f64))
            .collect(),
    );
    Ok((!series.is_empty()).then_some(ChartData::Bar(series)))
}

fn rating_vs_emergency(table: &Table) -> Result<Option<ChartData>> {
    let ratings = numeric_cells(table, columns::OVERALL_RATING)?;
    let emergency = table.require_column(columns::EMERGENCY_SERVICES)?.data();
    let state = table.require_column(columns::STATE)?.data();

    let points: Vec<ScatterPoint> = (0..table.num_rows())
        .filter_map(|row| {
            let x = ratings[row]?;
            let y = match emergency.str_value(row)? {
                columns::YES => 1.0,
                columns::NO => 0.0,
                _ => return None,
            };
            let group = state.value(row)?.to_string();
            Some(ScatterPoint { x, y, group })
        })
        .collect();
    Ok((!points.is_empty()).then_some(ChartData::Scatter { points }))
}

fn rating_by_ownership(table: &Table) -> Result<Option<ChartData>> {
    let ratings = numeric_cells(table, columns::OVERALL_RATING)?;
    let ownership = table.require_column(columns::OWNERSHIP)?.data();

    let mut by_owner: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (row, rating) in ratings.iter().enumerate() {
        if let (Some(r), Some(owner)) = (rating, ownership.value(row)) {
            by_owner.entry(owner.to_string()).or_default().push(*r);
        }
    }

    let groups: Vec<(String, BoxStats)> = by_owner
        .into_iter()
        .filter_map(|(owner, values)| Some((owner, BoxStats::from_values(&values)?)))
        .collect();
    Ok((!groups.is_empty()).then_some(ChartData::Box { groups }))
}

async fn average_rating_top_states(
    session: &QuerySession,
    top_n: usize,
) -> Result<Option<ChartData>> {
    session.table().require_column(columns::OVERALL_RATING)?;
    let states: Vec<String> = session
        .value_counts(columns::STATE, top_n)
        .await?
        .into_iter()
        .map(|(state, _)| state)
        .collect();
    let means = session
        .group_means(columns::STATE, columns::OVERALL_RATING, &states)
        .await?;
    let series = CategorySeries::from_pairs(means);
    Ok((!series.is_empty()).then_some(ChartData::Line(series)))
}

/// Pairwise Pearson correlations of every numeric column.
///
/// Each pair is aggregated in SQL over its complete rows; the matrix is
/// mirrored from the upper triangle.
pub async fn correlation_matrix(session: &QuerySession) -> Result<Option<ChartData>> {
    let labels: Vec<String> = session
        .table()
        .numeric_column_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    if labels.is_empty() {
        return Ok(None);
    }

    let mut values = vec![vec![None; labels.len()]; labels.len()];
    for i in 0..labels.len() {
        for j in i..labels.len() {
            let r = session.pair_moments(&labels[i], &labels[j]).await?.pearson();
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(Some(ChartData::Heatmap(CorrelationMatrix { labels, values })))
}
