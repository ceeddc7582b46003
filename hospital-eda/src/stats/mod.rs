//! Statistical procedures.
//!
//! - [`welch_t_test`]: do emergency and non-emergency hospitals differ in
//!   mean overall rating?
//! - [`chi_square_test`]: is hospital ownership associated with offering
//!   emergency services?
//!
//! Both are pure functions over in-memory values and fail with
//! [`EdaError::InsufficientData`](crate::error::EdaError::InsufficientData)
//! on degenerate input instead of producing NaN.

use std::fmt;

pub mod chi_square;
pub mod descriptive;
pub mod distributions;
pub mod ttest;

pub use chi_square::{chi_square_test, ChiSquareResult, ContingencyTable, CHI_SQUARE_NAME};
pub use descriptive::{mean, quantile_sorted, sample_variance, BoxStats, PairMoments};
pub use ttest::{
    emergency_rating_t_test, rating_groups, welch_t_test, RatingGroups, TTestResult, T_TEST_NAME,
};

/// Writes a labelled grid in cross-tabulation layout.
///
/// The column variable heads the first line, the row variable the second,
/// then one line per row label. Cells are right-aligned per column.
pub(crate) fn write_grid(
    f: &mut fmt::Formatter<'_>,
    row_variable: &str,
    column_variable: &str,
    row_labels: &[String],
    column_labels: &[String],
    cells: &[Vec<String>],
) -> fmt::Result {
    let label_width = row_labels
        .iter()
        .map(|l| l.chars().count())
        .chain([row_variable.chars().count(), column_variable.chars().count()])
        .max()
        .unwrap_or(0);
    let widths: Vec<usize> = column_labels
        .iter()
        .enumerate()
        .map(|(j, label)| {
            cells
                .iter()
                .filter_map(|row| row.get(j))
                .map(|c| c.chars().count())
                .chain([label.chars().count()])
                .max()
                .unwrap_or(0)
        })
        .collect();

    write!(f, "{column_variable:<label_width$}")?;
    for (label, width) in column_labels.iter().zip(widths.iter().copied()) {
        write!(f, "  {label:>width$}")?;
    }
    writeln!(f)?;
    writeln!(f, "{row_variable}")?;
    for (label, row) in row_labels.iter().zip(cells) {
        write!(f, "{label:<label_width$}")?;
        for (cell, width) in row.iter().zip(widths.iter().copied()) {
            write!(f, "  {cell:>width$}")?;
        }
        writeln!(f)?;
    }
    Ok(())
}
