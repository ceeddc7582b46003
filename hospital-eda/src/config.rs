//! Run configuration.
//!
//! [`AnalysisConfig::default`] reproduces the standard run: read
//! `Hospital_General_Information.xlsx` from the working directory, write
//! `Hospital_Cleaned.xlsx` and the charts under `charts/`, and test at the
//! 0.05 significance level.

use std::path::{Path, PathBuf};

use crate::clean::FillDefaults;
use crate::error::{EdaError, Result};
use crate::session::{is_valid_table_name, DEFAULT_TABLE_NAME};

/// Configuration for an analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Spreadsheet to analyze
    pub input_path: PathBuf,
    /// Where the fill-variant cleaned table is written
    pub cleaned_output_path: PathBuf,
    /// Directory receiving the chart files
    pub chart_dir: PathBuf,
    /// Whether charts are rendered at all
    pub render_charts: bool,
    /// Chart canvas size in pixels (width, height)
    pub chart_size: (u32, u32),
    /// Name under which the table is registered for SQL aggregation
    pub table_name: String,
    /// Threshold below which a p-value is reported as significant
    pub significance_level: f64,
    /// Number of equal-width histogram bins
    pub histogram_bins: usize,
    /// How many of the most frequent states are charted
    pub top_n_states: usize,
    /// Apply Yates' continuity correction to 2x2 chi-square tests
    pub chi_square_correction: bool,
    /// Defaults used by the fill cleaning variant
    pub fill_defaults: FillDefaults,
    /// Optional machine-readable summary of the run
    pub json_report: Option<PathBuf>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("Hospital_General_Information.xlsx"),
            cleaned_output_path: PathBuf::from("Hospital_Cleaned.xlsx"),
            chart_dir: PathBuf::from("charts"),
            render_charts: true,
            chart_size: (1000, 600),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            significance_level: 0.05,
            histogram_bins: 20,
            top_n_states: 10,
            chi_square_correction: true,
            fill_defaults: FillDefaults::hospital(),
            json_report: None,
        }
    }
}

impl AnalysisConfig {
    /// Creates a configuration reading the given spreadsheet.
    pub fn new(input_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            ..Self::default()
        }
    }

    /// Places every output (cleaned workbook, charts, JSON report) under `dir`.
    pub fn with_output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        self.cleaned_output_path = dir.join("Hospital_Cleaned.xlsx");
        self.chart_dir = dir.join("charts");
        if self.json_report.is_some() {
            self.json_report = Some(dir.join("analysis_report.json"));
        }
        self
    }

    /// Sets the cleaned workbook destination.
    pub fn with_cleaned_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cleaned_output_path = path.into();
        self
    }

    /// Sets the chart directory.
    pub fn with_chart_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.chart_dir = dir.into();
        self
    }

    /// Enables or disables chart rendering.
    pub fn with_charts(mut self, enabled: bool) -> Self {
        self.render_charts = enabled;
        self
    }

    /// Sets the significance level.
    pub fn with_significance_level(mut self, alpha: f64) -> Self {
        self.significance_level = alpha;
        self
    }

    /// Sets the number of histogram bins.
    pub fn with_histogram_bins(mut self, bins: usize) -> Self {
        self.histogram_bins = bins;
        self
    }

    /// Sets how many states the top-N charts show.
    pub fn with_top_n_states(mut self, n: usize) -> Self {
        self.top_n_states = n;
        self
    }

    /// Enables or disables Yates' correction for 2x2 tables.
    pub fn with_chi_square_correction(mut self, enabled: bool) -> Self {
        self.chi_square_correction = enabled;
        self
    }

    /// Replaces the fill defaults.
    pub fn with_fill_defaults(mut self, defaults: FillDefaults) -> Self {
        self.fill_defaults = defaults;
        self
    }

    /// Writes a JSON summary of the run to `path`.
    pub fn with_json_report(mut self, path: impl Into<PathBuf>) -> Self {
        self.json_report = Some(path.into());
        self
    }

    /// Checks that the numeric settings are usable.
    pub fn validate(&self) -> Result<()> {
        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(EdaError::Configuration(format!(
                "significance level must be in (0, 1), got {}",
                self.significance_level
            )));
        }
        if self.histogram_bins == 0 {
            return Err(EdaError::Configuration(
                "histogram needs at least one bin".to_string(),
            ));
        }
        if self.top_n_states == 0 {
            return Err(EdaError::Configuration(
                "top-N state charts need N >= 1".to_string(),
            ));
        }
        if !is_valid_table_name(&self.table_name) {
            return Err(EdaError::Configuration(format!(
                "table name '{}' must be a lower-case SQL identifier",
                self.table_name
            )));
        }
        Ok(())
    }
}
