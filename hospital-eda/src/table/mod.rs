//! In-memory record table.
//!
//! A [`Table`] is an ordered list of equally long, typed [`Column`]s. Missing
//! cells are `None`; there is no sentinel value. Tables are never modified in
//! place: every transformation (cleaning, coercion, row selection) returns a
//! new table.

mod inference;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::error::{EdaError, Result};
use crate::logging::truncate_field;

pub use inference::{
    build_column_data, infer_column_data, infer_kind, ColumnKind, InferenceConfig,
};

/// A present cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A numeric cell
    Number(f64),
    /// A string cell
    Text(String),
}

impl Value {
    /// Creates a text value.
    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(value.into())
    }

    /// Whether this is a number.
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    /// Returns the number, if this is one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(_) => None,
        }
    }

    /// Returns the string, if this is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Number(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

/// Typed storage for a column's cells.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// Numeric cells
    Numeric(Vec<Option<f64>>),
    /// Low-cardinality strings
    Categorical(Vec<Option<String>>),
    /// Free-form strings
    Text(Vec<Option<String>>),
}

impl ColumnData {
    /// Number of cells.
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Categorical(v) | ColumnData::Text(v) => v.len(),
        }
    }

    /// Whether the column has no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The storage kind.
    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnData::Numeric(_) => ColumnKind::Numeric,
            ColumnData::Categorical(_) => ColumnKind::Categorical,
            ColumnData::Text(_) => ColumnKind::Text,
        }
    }

    /// Whether the cell at `row` is missing.
    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            ColumnData::Numeric(v) => v[row].is_none(),
            ColumnData::Categorical(v) | ColumnData::Text(v) => v[row].is_none(),
        }
    }

    /// Number of missing cells.
    pub fn missing_count(&self) -> usize {
        (0..self.len()).filter(|&row| self.is_missing(row)).count()
    }

    /// Returns the cell at `row` as an owned value.
    pub fn value(&self, row: usize) -> Option<Value> {
        match self {
            ColumnData::Numeric(v) => v[row].map(Value::Number),
            ColumnData::Categorical(v) | ColumnData::Text(v) => v[row].clone().map(Value::Text),
        }
    }

    /// Returns the string at `row` for textual columns.
    pub fn str_value(&self, row: usize) -> Option<&str> {
        match self {
            ColumnData::Numeric(_) => None,
            ColumnData::Categorical(v) | ColumnData::Text(v) => v[row].as_deref(),
        }
    }

    /// Returns the number at `row` for numeric columns.
    pub fn f64_value(&self, row: usize) -> Option<f64> {
        match self {
            ColumnData::Numeric(v) => v[row],
            ColumnData::Categorical(_) | ColumnData::Text(_) => None,
        }
    }

    /// All cells as owned values.
    pub fn cells(&self) -> Vec<Option<Value>> {
        (0..self.len()).map(|row| self.value(row)).collect()
    }

    /// Selects the given rows, in the given order.
    pub fn take(&self, rows: &[usize]) -> ColumnData {
        match self {
            ColumnData::Numeric(v) => ColumnData::Numeric(rows.iter().map(|&r| v[r]).collect()),
            ColumnData::Categorical(v) => {
                ColumnData::Categorical(rows.iter().map(|&r| v[r].clone()).collect())
            }
            ColumnData::Text(v) => ColumnData::Text(rows.iter().map(|&r| v[r].clone()).collect()),
        }
    }

    /// Storage type name reported by the inspector.
    ///
    /// Integral numeric columns without gaps are `int64`; a gap forces
    /// floating point. Strings are `object`.
    pub fn dtype(&self) -> &'static str {
        match self {
            ColumnData::Numeric(v) => {
                let integral = v.iter().all(|c| matches!(c, Some(n) if n.fract() == 0.0));
                if integral && !v.is_empty() {
                    "int64"
                } else {
                    "float64"
                }
            }
            ColumnData::Categorical(_) | ColumnData::Text(_) => "object",
        }
    }

    fn arrow_array(&self) -> ArrayRef {
        match self {
            ColumnData::Numeric(v) => Arc::new(Float64Array::from(v.clone())),
            ColumnData::Categorical(v) | ColumnData::Text(v) => {
                Arc::new(StringArray::from(v.clone()))
            }
        }
    }

    fn arrow_type(&self) -> DataType {
        match self {
            ColumnData::Numeric(_) => DataType::Float64,
            ColumnData::Categorical(_) | ColumnData::Text(_) => DataType::Utf8,
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    /// Creates a column from typed storage.
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Creates a column from raw cells, inferring its kind.
    pub fn from_cells(
        name: impl Into<String>,
        cells: Vec<Option<Value>>,
        config: &InferenceConfig,
    ) -> Self {
        Self::new(name, infer_column_data(cells, config))
    }

    /// Creates a numeric column.
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self::new(name, ColumnData::Numeric(values))
    }

    /// Creates a categorical column.
    pub fn categorical<S: Into<String>>(name: impl Into<String>, values: Vec<Option<S>>) -> Self {
        Self::new(
            name,
            ColumnData::Categorical(values.into_iter().map(|v| v.map(Into::into)).collect()),
        )
    }

    /// Creates a free-text column.
    pub fn text<S: Into<String>>(name: impl Into<String>, values: Vec<Option<S>>) -> Self {
        Self::new(
            name,
            ColumnData::Text(values.into_iter().map(|v| v.map(Into::into)).collect()),
        )
    }

    /// The column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The typed storage.
    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    /// The storage kind.
    pub fn kind(&self) -> ColumnKind {
        self.data.kind()
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the column has no cells.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of missing cells.
    pub fn missing_count(&self) -> usize {
        self.data.missing_count()
    }
}

/// Outcome of coercing a textual column to numbers.
///
/// Each present value that failed to parse is a non-fatal coercion warning:
/// the cell becomes missing in the coerced table and the run continues.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoercionReport {
    /// Column that was coerced
    pub column: String,
    /// Number of present values that could not be parsed
    pub coerced_to_missing: usize,
    /// Up to five distinct unparseable values, for diagnostics
    pub sample_values: Vec<String>,
}

impl CoercionReport {
    /// Whether any value was turned into a missing cell.
    pub fn has_warnings(&self) -> bool {
        self.coerced_to_missing > 0
    }
}

/// An ordered collection of rows stored column-wise.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    num_rows: usize,
}

impl Table {
    /// Creates a table, checking that all columns have the same length.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let num_rows = columns.first().map(Column::len).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.len() != num_rows) {
            return Err(EdaError::Internal(format!(
                "column '{}' has {} rows, expected {num_rows}",
                bad.name(),
                bad.len()
            )));
        }
        Ok(Self { columns, num_rows })
    }

    /// Builds a table from a header and row-major cells, inferring column kinds.
    ///
    /// Rows shorter than the header are padded with missing cells; extra
    /// trailing cells are ignored.
    pub fn from_rows(
        header: Vec<String>,
        rows: Vec<Vec<Option<Value>>>,
        config: &InferenceConfig,
    ) -> Result<Self> {
        let mut cells: Vec<Vec<Option<Value>>> = vec![Vec::with_capacity(rows.len()); header.len()];
        for row in rows {
            let mut row = row.into_iter();
            for column in cells.iter_mut() {
                column.push(row.next().flatten());
            }
        }

        let columns = header
            .into_iter()
            .zip(cells)
            .map(|(name, cells)| Column::from_cells(name, cells, config))
            .collect();
        Self::new(columns)
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// All columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Looks up a column by name, failing if it is absent.
    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| EdaError::column_not_found(name))
    }

    /// Whether any cell in `row` is missing.
    pub fn row_has_missing(&self, row: usize) -> bool {
        self.columns.iter().any(|c| c.data().is_missing(row))
    }

    /// Total number of missing cells.
    pub fn missing_cells(&self) -> usize {
        self.columns.iter().map(Column::missing_count).sum()
    }

    /// Returns a new table with only the given rows, in the given order.
    pub fn take_rows(&self, rows: &[usize]) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name(), c.data().take(rows)))
                .collect(),
            num_rows: rows.len(),
        }
    }

    /// Returns a new table where the column with the same name is replaced.
    ///
    /// The column is appended when no column of that name exists.
    pub fn with_column(&self, column: Column) -> Result<Table> {
        let mut columns = self.columns.clone();
        match columns.iter_mut().find(|c| c.name() == column.name()) {
            Some(slot) => *slot = column,
            None => columns.push(column),
        }
        Table::new(columns)
    }

    /// Returns a new table whose named column is numeric.
    ///
    /// Text that does not parse as a finite number becomes missing; the
    /// returned [`CoercionReport`] counts those cells. A column that is
    /// already numeric is returned unchanged with an empty report.
    #[instrument(skip(self), fields(rows = self.num_rows))]
    pub fn coerce_numeric(&self, name: &str) -> Result<(Table, CoercionReport)> {
        let column = self.require_column(name)?;
        let mut report = CoercionReport {
            column: name.to_string(),
            ..Default::default()
        };

        let values: Vec<Option<f64>> = match column.data() {
            ColumnData::Numeric(_) => return Ok((self.clone(), report)),
            ColumnData::Categorical(v) | ColumnData::Text(v) => v
                .iter()
                .map(|cell| {
                    let raw = cell.as_deref()?;
                    match parse_number(raw) {
                        Some(n) => Some(n),
                        None => {
                            report.coerced_to_missing += 1;
                            if report.sample_values.len() < 5
                                && !report.sample_values.iter().any(|s| s == raw)
                            {
                                report.sample_values.push(truncate_field(raw, 64));
                            }
                            None
                        }
                    }
                })
                .collect(),
        };

        if report.has_warnings() {
            warn!(
                column = name,
                coerced = report.coerced_to_missing,
                samples = ?report.sample_values,
                "non-numeric values treated as missing"
            );
        }

        let table = self.with_column(Column::numeric(name, values))?;
        Ok((table, report))
    }

    /// Converts the table to an Arrow record batch.
    ///
    /// Numeric columns map to nullable `Float64`, textual columns to nullable `Utf8`.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let fields: Vec<Field> = self
            .columns
            .iter()
            .map(|c| Field::new(c.name(), c.data().arrow_type(), true))
            .collect();
        let arrays: Vec<ArrayRef> = self.columns.iter().map(|c| c.data().arrow_array()).collect();

        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
    }

    /// Names of numeric columns, in table order.
    pub fn numeric_column_names(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.kind() == ColumnKind::Numeric)
            .map(Column::name)
            .collect()
    }

    /// Whether column names are unique.
    pub fn has_unique_column_names(&self) -> bool {
        let mut seen = HashSet::new();
        self.columns.iter().all(|c| seen.insert(c.name()))
    }
}

/// Parses a cell as a finite number the way a lenient numeric coercion would.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;

    fn sample() -> Table {
        Table::new(vec![
            Column::categorical("State", vec![Some("AL"), Some("AK"), None]),
            Column::numeric("ZIP Code", vec![Some(36301.0), None, Some(99501.0)]),
            Column::categorical(
                "Hospital overall rating",
                vec![Some("3"), Some("Not Available"), Some("5")],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_shape_and_lookup() {
        let table = sample();
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.num_columns(), 3);
        assert!(table.column("State").is_some());
        assert!(matches!(
            table.require_column("City"),
            Err(EdaError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let result = Table::new(vec![
            Column::numeric("a", vec![Some(1.0)]),
            Column::numeric("b", vec![Some(1.0), Some(2.0)]),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_rows_pads_short_rows() {
        let table = Table::from_rows(
            vec!["State".to_string(), "ZIP Code".to_string()],
            vec![
                vec![Some(Value::text("AL")), Some(Value::Number(36301.0))],
                vec![Some(Value::text("AK"))],
            ],
            &InferenceConfig::default(),
        )
        .unwrap();

        assert_eq!(table.num_rows(), 2);
        let zip = table.column("ZIP Code").unwrap();
        assert_eq!(zip.kind(), ColumnKind::Numeric);
        assert_eq!(zip.missing_count(), 1);
    }

    #[test]
    fn test_coerce_numeric_counts_warnings() {
        let (coerced, report) = sample().coerce_numeric("Hospital overall rating").unwrap();
        let rating = coerced.column("Hospital overall rating").unwrap();

        assert_eq!(rating.kind(), ColumnKind::Numeric);
        assert_eq!(rating.data().f64_value(0), Some(3.0));
        assert_eq!(rating.data().f64_value(1), None);
        assert_eq!(report.coerced_to_missing, 1);
        assert_eq!(report.sample_values, vec!["Not Available".to_string()]);

        // The source table is untouched.
        assert_eq!(
            sample().column("Hospital overall rating").unwrap().kind(),
            ColumnKind::Categorical
        );
    }

    #[test]
    fn test_take_rows() {
        let table = sample().take_rows(&[2, 0]);
        assert_eq!(table.num_rows(), 2);
        assert_eq!(
            table.column("State").unwrap().data().str_value(1),
            Some("AL")
        );
    }

    #[test]
    fn test_dtype_names() {
        assert_eq!(ColumnData::Numeric(vec![Some(1.0), Some(2.0)]).dtype(), "int64");
        assert_eq!(ColumnData::Numeric(vec![Some(1.0), None]).dtype(), "float64");
        assert_eq!(ColumnData::Numeric(vec![Some(1.5)]).dtype(), "float64");
        assert_eq!(ColumnData::Text(vec![None]).dtype(), "object");
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Number(36301.0).to_string(), "36301");
        assert_eq!(Value::Number(3.5).to_string(), "3.5");
        assert_eq!(Value::text("Yes").to_string(), "Yes");
    }

    #[test]
    fn test_record_batch_schema() {
        let batch = sample().to_record_batch().unwrap();
        assert_eq!(batch.num_rows(), 3);
        assert_eq!(batch.schema().field(0).data_type(), &DataType::Utf8);
        assert_eq!(batch.schema().field(1).data_type(), &DataType::Float64);
        assert_eq!(batch.column(1).null_count(), 1);
    }
}
