//! Chi-square test of independence between two categorical columns.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;
use tracing::{debug, info, instrument};

use super::distributions::chi_square_sf;
use super::write_grid;
use crate::error::{EdaError, Result};
use crate::table::Table;

/// Name used in failure messages and reports.
pub const CHI_SQUARE_NAME: &str = "Chi-square test";

/// Observed counts of two categorical variables.
///
/// Labels are sorted lexicographically.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContingencyTable {
    pub row_variable: String,
    pub column_variable: String,
    pub row_labels: Vec<String>,
    pub column_labels: Vec<String>,
    /// `counts[i][j]` is the number of rows with row label `i` and column label `j`
    pub counts: Vec<Vec<u64>>,
}

impl ContingencyTable {
    /// Builds a table from explicit counts, checking the shape.
    pub fn new(
        row_variable: impl Into<String>,
        column_variable: impl Into<String>,
        row_labels: Vec<String>,
        column_labels: Vec<String>,
        counts: Vec<Vec<u64>>,
    ) -> Result<Self> {
        if counts.len() != row_labels.len()
            || counts.iter().any(|row| row.len() != column_labels.len())
        {
            return Err(EdaError::Internal(format!(
                "contingency counts do not match {}x{} labels",
                row_labels.len(),
                column_labels.len()
            )));
        }
        Ok(Self {
            row_variable: row_variable.into(),
            column_variable: column_variable.into(),
            row_labels,
            column_labels,
            counts,
        })
    }

    /// Cross-tabulates two columns of `table`.
    ///
    /// Rows missing either value are skipped. Numeric cells are labelled by
    /// their display text.
    #[instrument(skip(table), fields(rows = table.num_rows()))]
    pub fn from_columns(table: &Table, row_column: &str, column_column: &str) -> Result<Self> {
        let rows = table.require_column(row_column)?.data();
        let cols = table.require_column(column_column)?.data();

        let mut pairs: BTreeMap<(String, String), u64> = BTreeMap::new();
        let mut row_labels = BTreeSet::new();
        let mut column_labels = BTreeSet::new();
        for i in 0..table.num_rows() {
            let (Some(r), Some(c)) = (rows.value(i), cols.value(i)) else {
                continue;
            };
            let (r, c) = (r.to_string(), c.to_string());
            row_labels.insert(r.clone());
            column_labels.insert(c.clone());
            *pairs.entry((r, c)).or_default() += 1;
        }

        let row_labels: Vec<String> = row_labels.into_iter().collect();
        let column_labels: Vec<String> = column_labels.into_iter().collect();
        let counts = row_labels
            .iter()
            .map(|r| {
                column_labels
                    .iter()
                    .map(|c| pairs.get(&(r.clone(), c.clone())).copied().unwrap_or(0))
                    .collect()
            })
            .collect();

        debug!(
            rows = row_labels.len(),
            columns = column_labels.len(),
            "built contingency table"
        );
        Self::new(row_column, column_column, row_labels, column_labels, counts)
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    /// Per-row sums.
    pub fn row_totals(&self) -> Vec<u64> {
        self.counts.iter().map(|row| row.iter().sum()).collect()
    }

    /// Per-column sums.
    pub fn column_totals(&self) -> Vec<u64> {
        (0..self.column_labels.len())
            .map(|j| self.counts.iter().map(|row| row[j]).sum())
            .collect()
    }

    /// Whether the table holds no observations.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// `(rows - 1) * (columns - 1)`, zero for a degenerate table.
    pub fn degrees_of_freedom(&self) -> usize {
        self.row_labels.len().saturating_sub(1) * self.column_labels.len().saturating_sub(1)
    }
}

impl fmt::Display for ContingencyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells = self
            .counts
            .iter()
            .map(|row| row.iter().map(u64::to_string).collect())
            .collect::<Vec<Vec<String>>>();
        write_grid(
            f,
            &self.row_variable,
            &self.column_variable,
            &self.row_labels,
            &self.column_labels,
            &cells,
        )
    }
}

/// Outcome of [`chi_square_test`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChiSquareResult {
    pub statistic: f64,
    pub p_value: f64,
    pub dof: usize,
    /// Expected counts under independence, same layout as the observed table
    pub expected: Vec<Vec<f64>>,
    /// Whether Yates' continuity correction was applied
    pub corrected: bool,
    pub row_variable: String,
    pub column_variable: String,
    pub row_labels: Vec<String>,
    pub column_labels: Vec<String>,
}

impl ChiSquareResult {
    /// Whether the association is significant at `alpha`.
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }

    /// The expected frequencies as a displayable grid.
    pub fn expected_table(&self) -> ExpectedTable<'_> {
        ExpectedTable(self)
    }
}

/// Display adapter for [`ChiSquareResult::expected`].
pub struct ExpectedTable<'a>(&'a ChiSquareResult);

impl fmt::Display for ExpectedTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.0;
        let cells = result
            .expected
            .iter()
            .map(|row| row.iter().map(|e| format!("{e:.4}")).collect())
            .collect::<Vec<Vec<String>>>();
        write_grid(
            f,
            &result.row_variable,
            &result.column_variable,
            &result.row_labels,
            &result.column_labels,
            &cells,
        )
    }
}

/// Pearson's chi-square test of independence.
///
/// With one degree of freedom and `correction` enabled, each `|O - E|` is
/// reduced by `min(0.5, |O - E|)` (Yates).
///
/// # Errors
///
/// [`EdaError::InsufficientData`] when the table is empty, has zero degrees
/// of freedom, or an expected count is zero.
#[instrument(skip(table), fields(rows = table.row_labels.len(), cols = table.column_labels.len()))]
pub fn chi_square_test(table: &ContingencyTable, correction: bool) -> Result<ChiSquareResult> {
    if table.is_empty() {
        return Err(EdaError::insufficient_data(
            CHI_SQUARE_NAME,
            "contingency table is empty",
        ));
    }
    let dof = table.degrees_of_freedom();
    if dof == 0 {
        return Err(EdaError::insufficient_data(
            CHI_SQUARE_NAME,
            format!(
                "need at least two categories in each variable, got {}x{}",
                table.row_labels.len(),
                table.column_labels.len()
            ),
        ));
    }

    let total = table.total() as f64;
    let row_totals = table.row_totals();
    let column_totals = table.column_totals();
    let expected: Vec<Vec<f64>> = row_totals
        .iter()
        .map(|&r| {
            column_totals
                .iter()
                .map(|&c| r as f64 * c as f64 / total)
                .collect()
        })
        .collect();
    if expected.iter().flatten().any(|&e| e == 0.0) {
        return Err(EdaError::insufficient_data(
            CHI_SQUARE_NAME,
            "an expected frequency is zero",
        ));
    }

    let corrected = correction && dof == 1;
    let statistic: f64 = table
        .counts
        .iter()
        .flatten()
        .zip(expected.iter().flatten())
        .map(|(&observed, &e)| {
            let diff = (observed as f64 - e).abs();
            let diff = if corrected { diff - diff.min(0.5) } else { diff };
            diff * diff / e
        })
        .sum();
    let p_value = chi_square_sf(statistic, dof as f64);

    info!(statistic, p_value, dof, corrected, "computed chi-square test");
    Ok(ChiSquareResult {
        statistic,
        p_value,
        dof,
        expected,
        corrected,
        row_variable: table.row_variable.clone(),
        column_variable: table.column_variable.clone(),
        row_labels: table.row_labels.clone(),
        column_labels: table.column_labels.clone(),
    })
}
