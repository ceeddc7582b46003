//! Dataset structure and missing-value report.

use std::fmt;

use serde::Serialize;
use tracing::{info, instrument};

use crate::error::Result;
use crate::session::{QuerySession, DEFAULT_TABLE_NAME};
use crate::table::{ColumnKind, Table};

/// Per-column part of a [`DatasetSummary`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub kind: ColumnKind,
    pub dtype: &'static str,
    pub non_null: usize,
    pub missing: usize,
}

/// Row and column counts, inferred types, and missing counts of a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
}

impl DatasetSummary {
    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Looks up a column summary by name.
    pub fn column(&self, name: &str) -> Option<&ColumnSummary> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Missing cells across all columns.
    pub fn total_missing(&self) -> usize {
        self.columns.iter().map(|c| c.missing).sum()
    }

    /// Columns with at least one missing cell.
    pub fn columns_with_missing(&self) -> impl Iterator<Item = &ColumnSummary> {
        self.columns.iter().filter(|c| c.missing > 0)
    }
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .columns
            .iter()
            .map(|c| c.name.chars().count())
            .max()
            .unwrap_or(0)
            .max("Column".len());

        writeln!(f, "Initial Data Info:")?;
        writeln!(f, "RangeIndex: {} entries", self.rows)?;
        writeln!(f, "Data columns (total {} columns):", self.num_columns())?;
        writeln!(
            f,
            " {:<3} {:<width$}  {:<14}  {:<7}  Kind",
            "#", "Column", "Non-Null Count", "Dtype"
        )?;
        for (index, column) in self.columns.iter().enumerate() {
            writeln!(
                f,
                " {:<3} {:<width$}  {:<14}  {:<7}  {}",
                index,
                column.name,
                format!("{} non-null", column.non_null),
                column.dtype,
                column.kind.as_str()
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Missing Values per Column:")?;
        for column in &self.columns {
            writeln!(f, "{:<width$}    {}", column.name, column.missing)?;
        }
        Ok(())
    }
}

/// Summarizes `table` without modifying it.
pub async fn inspect(table: &Table) -> Result<DatasetSummary> {
    let session = QuerySession::new(table.clone(), DEFAULT_TABLE_NAME)?;
    summarize(&session).await
}

/// Summarizes the table registered in `session`.
///
/// Row and present-cell counts come from a single `COUNT` query.
#[instrument(skip(session), fields(table = session.table_name()))]
pub async fn summarize(session: &QuerySession) -> Result<DatasetSummary> {
    let table = session.table();
    let names = table.column_names();
    let (rows, non_null) = session.non_null_counts(&names).await?;

    let columns = table
        .columns()
        .iter()
        .zip(non_null)
        .map(|(column, non_null)| ColumnSummary {
            name: column.name().to_string(),
            kind: column.kind(),
            dtype: column.data().dtype(),
            non_null,
            missing: rows - non_null,
        })
        .collect();

    let summary = DatasetSummary { rows, columns };
    info!(
        rows = summary.rows,
        columns = summary.num_columns(),
        missing = summary.total_missing(),
        "inspected dataset"
    );
    Ok(summary)
}
