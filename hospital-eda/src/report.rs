//! Console and JSON reporting of test results.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::charts::SkippedChart;
use crate::clean::TableShape;
use crate::error::{EdaError, ErrorContext, Result};
use crate::inspect::DatasetSummary;
use crate::stats::{ChiSquareResult, ContingencyTable, TTestResult, CHI_SQUARE_NAME, T_TEST_NAME};
use crate::table::CoercionReport;

/// Human-readable reason a procedure failed.
pub fn failure_reason(err: &EdaError) -> String {
    match err {
        EdaError::InsufficientData { reason, .. } => reason.clone(),
        other => other.to_string(),
    }
}

/// `<test> could not be computed: <reason>`
pub fn format_failure(test: &str, err: &EdaError) -> String {
    format!("{test} could not be computed: {}", failure_reason(err))
}

/// The t-test section of the console report.
pub fn format_t_test(outcome: &Result<TTestResult>, alpha: f64) -> String {
    let result = match outcome {
        Ok(result) => result,
        Err(err) => return format!("{}\n", format_failure(T_TEST_NAME, err)),
    };

    let verdict = if result.is_significant(alpha) {
        format!("Result: Significant difference in ratings (p < {alpha})")
    } else {
        format!("Result: No significant difference in ratings (p ≥ {alpha})")
    };
    format!(
        "T-test comparing hospital ratings between Emergency vs Non-Emergency hospitals:\n\
         T-statistic: {:.4}\n\
         P-value: {:.4}\n\
         {verdict}\n",
        result.statistic, result.p_value
    )
}

/// The contingency table and chi-square sections of the console report.
pub fn format_chi_square(
    contingency: Option<&ContingencyTable>,
    outcome: &Result<ChiSquareResult>,
    alpha: f64,
) -> String {
    let mut out = String::new();
    if let Some(table) = contingency {
        out.push_str(&format!("Contingency Table:\n{table}\n"));
    }

    let result = match outcome {
        Ok(result) => result,
        Err(err) => {
            out.push_str(&format_failure(CHI_SQUARE_NAME, err));
            out.push('\n');
            return out;
        }
    };

    let verdict = if result.is_significant(alpha) {
        format!("Result: Significant association between variables (p < {alpha})")
    } else {
        format!("Result: No significant association between variables (p ≥ {alpha})")
    };
    out.push_str(&format!(
        "Chi-Square Test between '{}' and '{}':\n\
         Chi-square Statistic: {:.4}\n\
         P-value: {:.4}\n\
         Degrees of Freedom: {}\n\
         Expected Frequencies Table:\n\
         {}\
         {verdict}\n",
        result.row_variable,
        result.column_variable,
        result.statistic,
        result.p_value,
        result.dof,
        result.expected_table()
    ));
    out
}

/// Status of one statistical procedure in the JSON report.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TestReport<T> {
    Computed { result: T, significant: bool },
    Failed { reason: String },
}

impl<T: Clone> TestReport<T> {
    fn new(outcome: &Result<T>, significant: impl Fn(&T) -> bool) -> Self {
        match outcome {
            Ok(result) => TestReport::Computed {
                significant: significant(result),
                result: result.clone(),
            },
            Err(err) => TestReport::Failed {
                reason: failure_reason(err),
            },
        }
    }
}

/// Machine-readable summary of a run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub input: String,
    pub cleaned_output: String,
    pub significance_level: f64,
    pub summary: DatasetSummary,
    pub cleaned_shapes: BTreeMap<String, TableShape>,
    pub charts: Vec<String>,
    pub skipped_charts: Vec<SkippedChart>,
    pub rating_coercion: CoercionReport,
    pub contingency: Option<ContingencyTable>,
    pub t_test: TestReport<TTestResult>,
    pub chi_square: TestReport<ChiSquareResult>,
}

impl AnalysisReport {
    /// Builds the report from a finished run.
    pub fn from_outcome(
        outcome: &crate::pipeline::AnalysisOutcome,
        input: &Path,
        alpha: f64,
    ) -> Self {
        Self {
            generated_at: Utc::now(),
            input: input.display().to_string(),
            cleaned_output: outcome.cleaned_output.display().to_string(),
            significance_level: alpha,
            summary: outcome.summary.clone(),
            cleaned_shapes: outcome
                .cleaned_shapes
                .iter()
                .map(|(name, shape)| (name.to_string(), *shape))
                .collect(),
            charts: outcome
                .charts
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            skipped_charts: outcome.skipped_charts.clone(),
            rating_coercion: outcome.coercion.clone(),
            contingency: outcome.contingency.clone(),
            t_test: TestReport::new(&outcome.t_test, |r| r.is_significant(alpha)),
            chi_square: TestReport::new(&outcome.chi_square, |r| r.is_significant(alpha)),
        }
    }

    /// Writes the report as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("serializing analysis report")?;
        std::fs::write(path, json).map_err(|e| EdaError::write(path, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{chi_square_test, welch_t_test};

    fn contingency() -> ContingencyTable {
        ContingencyTable::new(
            "Hospital Ownership",
            "Emergency Services",
            vec!["Government".into(), "Proprietary".into()],
            vec!["No".into(), "Yes".into()],
            vec![vec![10, 5], vec![3, 12]],
        )
        .unwrap()
    }

    #[test]
    fn test_t_test_section() {
        let outcome = welch_t_test(&[4.0, 5.0], &[2.0, 3.0]);
        let text = format_t_test(&outcome, 0.05);
        assert_eq!(
            text,
            "T-test comparing hospital ratings between Emergency vs Non-Emergency hospitals:\n\
             T-statistic: 2.8284\n\
             P-value: 0.1056\n\
             Result: No significant difference in ratings (p ≥ 0.05)\n"
        );
    }

    #[test]
    fn test_t_test_failure_line() {
        let outcome = welch_t_test(&[4.0], &[2.0, 3.0]);
        assert_eq!(
            format_t_test(&outcome, 0.05),
            "T-test could not be computed: first group has a single observation\n"
        );
    }

    #[test]
    fn test_chi_square_section() {
        let table = contingency();
        let outcome = chi_square_test(&table, true);
        let text = format_chi_square(Some(&table), &outcome, 0.05);
        assert!(text.starts_with("Contingency Table:\n"));
        assert!(text.contains(
            "Chi-Square Test between 'Hospital Ownership' and 'Emergency Services':\n"
        ));
        assert!(text.contains("Chi-square Statistic: 4.8869\n"));
        assert!(text.contains("P-value: 0.0271\n"));
        assert!(text.contains("Degrees of Freedom: 1\n"));
        assert!(text.contains("Expected Frequencies Table:\n"));
        assert!(text.ends_with("Result: Significant association between variables (p < 0.05)\n"));
    }

    #[test]
    fn test_chi_square_section_is_complete() {
        let table = contingency();
        let outcome = chi_square_test(&table, true);
        let expected_table = outcome.as_ref().unwrap().expected_table().to_string();
        assert_eq!(
            format_chi_square(Some(&table), &outcome, 0.05),
            format!(
                "Contingency Table:\n{table}\n\
                 Chi-Square Test between 'Hospital Ownership' and 'Emergency Services':\n\
                 Chi-square Statistic: 4.8869\n\
                 P-value: 0.0271\n\
                 Degrees of Freedom: 1\n\
                 Expected Frequencies Table:\n\
                 {expected_table}\
                 Result: Significant association between variables (p < 0.05)\n"
            )
        );
    }

    #[test]
    fn test_chi_square_failure_keeps_contingency() {
        let table = ContingencyTable::new(
            "r",
            "c",
            vec!["a".into()],
            vec!["x".into(), "y".into()],
            vec![vec![1, 2]],
        )
        .unwrap();
        let outcome = chi_square_test(&table, true);
        let text = format_chi_square(Some(&table), &outcome, 0.05);
        assert!(text.starts_with("Contingency Table:"));
        assert!(text.contains("Chi-square test could not be computed: "));
    }

    #[test]
    fn test_test_report_serialization() {
        let ok: TestReport<TTestResult> =
            TestReport::new(&welch_t_test(&[4.0, 5.0], &[2.0, 3.0]), |r| r.is_significant(0.05));
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["status"], "computed");
        assert_eq!(json["significant"], false);

        let failed: TestReport<TTestResult> =
            TestReport::new(&welch_t_test(&[], &[]), |r| r.is_significant(0.05));
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "first group is empty");
    }
}
