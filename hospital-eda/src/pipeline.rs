//! The end-to-end analysis run.
//!
//! Stages run strictly in order: load, inspect, clean (and persist the fill
//! variant), chart, test. Read and write failures abort the run; a
//! statistical procedure that cannot be computed is reported and the other
//! procedure still runs.

use std::io::{self, Write};
use std::path::PathBuf;

use tracing::{info, instrument, warn};

use crate::charts::{build_charts, render_charts, ChartOptions, SkippedChart};
use crate::clean::{clean_all, TableShape};
use crate::columns;
use crate::config::AnalysisConfig;
use crate::error::{EdaError, Result};
use crate::inspect::{summarize, DatasetSummary};
use crate::report::{format_chi_square, format_t_test, AnalysisReport};
use crate::session::QuerySession;
use crate::sources::{write_excel, DataSource, ExcelSource};
use crate::stats::{
    chi_square_test, emergency_rating_t_test, ChiSquareResult, ContingencyTable, TTestResult,
};
use crate::table::{CoercionReport, Table};

/// Everything a run produced.
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub summary: DatasetSummary,
    pub cleaned_shapes: Vec<(&'static str, TableShape)>,
    pub cleaned_output: PathBuf,
    pub charts: Vec<PathBuf>,
    pub skipped_charts: Vec<SkippedChart>,
    pub coercion: CoercionReport,
    pub contingency: Option<ContingencyTable>,
    pub t_test: Result<TTestResult>,
    pub chi_square: Result<ChiSquareResult>,
}

impl AnalysisOutcome {
    /// Whether both statistical procedures were computed.
    pub fn is_success(&self) -> bool {
        self.t_test.is_ok() && self.chi_square.is_ok()
    }
}

/// Runs the analysis, printing the report to stdout.
///
/// Stdout is locked per write, so the returned future is `Send`.
pub async fn run(config: &AnalysisConfig) -> Result<AnalysisOutcome> {
    let mut out = io::stdout();
    run_with_output(config, &mut out).await
}

/// Runs the analysis, printing the report to `out`.
#[instrument(skip_all, fields(input = %config.input_path.display()))]
pub async fn run_with_output<W: Write>(
    config: &AnalysisConfig,
    out: &mut W,
) -> Result<AnalysisOutcome> {
    config.validate()?;

    let source = ExcelSource::new(&config.input_path);
    info!(source = %source.description(), "loading dataset");
    let table = source.load()?;

    let session = QuerySession::new(table.clone(), &config.table_name)?;
    let summary = summarize(&session).await?;
    writeln!(out, "{summary}")?;

    let variants = clean_all(&table, &config.fill_defaults)?;
    for (name, shape) in variants.shapes() {
        info!(variant = name, rows = shape.rows, columns = shape.columns, "cleaned variant");
    }
    write_excel(&variants.filled, &config.cleaned_output_path)?;
    writeln!(
        out,
        "Cleaned data saved as '{}'\n",
        config.cleaned_output_path.display()
    )?;

    let (coerced, coercion) = coerce_rating(&table)?;

    let (charts, skipped_charts) = if config.render_charts {
        let session = QuerySession::new(coerced.clone(), &config.table_name)?;
        let (charts, skipped) = build_charts(&session, ChartOptions::from(config)).await?;
        let paths = render_charts(&charts, &config.chart_dir, config.chart_size)?;
        info!(written = paths.len(), skipped = skipped.len(), dir = %config.chart_dir.display(), "charts done");
        (paths, skipped)
    } else {
        (Vec::new(), Vec::new())
    };

    let t_test = emergency_rating_t_test(&coerced);
    if let Err(e) = &t_test {
        warn!(error = %e, "t-test not computed");
    }
    writeln!(out, "{}", format_t_test(&t_test, config.significance_level))?;

    let (contingency, chi_square) =
        match ContingencyTable::from_columns(&table, columns::OWNERSHIP, columns::EMERGENCY_SERVICES)
        {
            Ok(ct) => {
                let result = chi_square_test(&ct, config.chi_square_correction);
                (Some(ct), result)
            }
            Err(e) => (None, Err(e)),
        };
    if let Err(e) = &chi_square {
        warn!(error = %e, "chi-square test not computed");
    }
    write!(
        out,
        "{}",
        format_chi_square(contingency.as_ref(), &chi_square, config.significance_level)
    )?;

    let outcome = AnalysisOutcome {
        summary,
        cleaned_shapes: variants.shapes(),
        cleaned_output: config.cleaned_output_path.clone(),
        charts,
        skipped_charts,
        coercion,
        contingency,
        t_test,
        chi_square,
    };

    if let Some(path) = &config.json_report {
        AnalysisReport::from_outcome(&outcome, &config.input_path, config.significance_level)
            .write_json(path)?;
        info!(path = %path.display(), "wrote JSON report");
    }

    info!(success = outcome.is_success(), "analysis finished");
    Ok(outcome)
}

/// Coerces the rating column, leaving tables without one unchanged.
fn coerce_rating(table: &Table) -> Result<(Table, CoercionReport)> {
    match table.coerce_numeric(columns::OVERALL_RATING) {
        Err(EdaError::ColumnNotFound { column }) => {
            warn!(%column, "rating column absent, nothing to coerce");
            Ok((table.clone(), CoercionReport::default()))
        }
        other => other,
    }
}
