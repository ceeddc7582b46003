//! Missing-value cleaning strategies.
//!
//! Four independent strategies each derive a new [`Table`] from the original:
//!
//! - [`drop_missing`]: keep only fully populated rows,
//! - [`fill_missing`]: replace gaps in selected columns with fixed defaults,
//! - [`forward_fill`]: carry the last present value down each column,
//! - [`backward_fill`]: carry the next present value up each column.
//!
//! # Example
//!
//! ```rust
//! use hospital_eda::clean::{fill_missing, FillDefaults};
//! use hospital_eda::table::{Column, Table};
//!
//! let table = Table::new(vec![
//!     Column::text("City", vec![Some("Dothan"), None]),
//!     Column::numeric("ZIP Code", vec![None, Some(35957.0)]),
//! ])
//! .unwrap();
//!
//! let filled = fill_missing(&table, &FillDefaults::hospital()).unwrap();
//! assert_eq!(filled.column("City").unwrap().missing_count(), 0);
//! assert_eq!(filled.column("ZIP Code").unwrap().data().f64_value(0), Some(0.0));
//! ```

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::columns;
use crate::error::Result;
use crate::table::{infer_column_data, Column, ColumnData, InferenceConfig, Table, Value};

/// Per-column replacement values for [`fill_missing`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FillDefaults {
    entries: Vec<(String, Value)>,
}

impl FillDefaults {
    /// Creates an empty set of defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// The defaults for the hospital dataset.
    pub fn hospital() -> Self {
        Self::new()
            .with(columns::HOSPITAL_NAME, "Unknown")
            .with(columns::CITY, "Unknown")
            .with(columns::ZIP_CODE, 0.0)
            .with(columns::PHONE_NUMBER, "Not Available")
    }

    /// Adds or replaces the default for a column.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        let column = column.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| *name == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column, value)),
        }
        self
    }

    /// The default for `column`, if any.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Columns that have a default, in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }
}

/// Rows and columns of a derived table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TableShape {
    pub rows: usize,
    pub columns: usize,
}

impl From<&Table> for TableShape {
    fn from(table: &Table) -> Self {
        Self {
            rows: table.num_rows(),
            columns: table.num_columns(),
        }
    }
}

/// The four cleaned versions of a table.
#[derive(Debug, Clone)]
pub struct CleanedVariants {
    /// Rows with any missing cell removed
    pub dropped: Table,
    /// Defaults applied to the configured columns
    pub filled: Table,
    /// Gaps filled from the preceding row
    pub forward_filled: Table,
    /// Gaps filled from the following row
    pub backward_filled: Table,
}

impl CleanedVariants {
    /// Shapes of the variants as `(name, shape)` pairs.
    pub fn shapes(&self) -> Vec<(&'static str, TableShape)> {
        vec![
            ("dropped", TableShape::from(&self.dropped)),
            ("filled", TableShape::from(&self.filled)),
            ("forward_filled", TableShape::from(&self.forward_filled)),
            ("backward_filled", TableShape::from(&self.backward_filled)),
        ]
    }
}

/// Produces all four cleaned variants.
#[instrument(skip_all, fields(rows = table.num_rows()))]
pub fn clean_all(table: &Table, defaults: &FillDefaults) -> Result<CleanedVariants> {
    Ok(CleanedVariants {
        dropped: drop_missing(table),
        filled: fill_missing(table, defaults)?,
        forward_filled: forward_fill(table)?,
        backward_filled: backward_fill(table)?,
    })
}

/// Removes every row that has a missing cell in any column.
pub fn drop_missing(table: &Table) -> Table {
    let keep: Vec<usize> = (0..table.num_rows())
        .filter(|&row| !table.row_has_missing(row))
        .collect();
    info!(
        kept = keep.len(),
        dropped = table.num_rows() - keep.len(),
        "dropped rows with missing values"
    );
    table.take_rows(&keep)
}

/// Replaces missing cells in the columns named by `defaults`.
///
/// Columns without a default are copied unchanged. Defaults for columns
/// the table does not have are ignored.
pub fn fill_missing(table: &Table, defaults: &FillDefaults) -> Result<Table> {
    for name in defaults.columns() {
        if table.column(name).is_none() {
            debug!(column = name, "fill default for absent column ignored");
        }
    }

    let columns = table
        .columns()
        .iter()
        .map(|column| match defaults.get(column.name()) {
            Some(fill) => fill_column(column, fill),
            None => column.clone(),
        })
        .collect();
    Table::new(columns)
}

/// Fills each gap with the nearest preceding present value of its column.
///
/// Gaps before the first present value stay missing.
pub fn forward_fill(table: &Table) -> Result<Table> {
    Table::new(
        table
            .columns()
            .iter()
            .map(|c| Column::new(c.name(), map_cells(c.data(), Direction::Forward)))
            .collect(),
    )
}

/// Fills each gap with the nearest following present value of its column.
///
/// Gaps after the last present value stay missing.
pub fn backward_fill(table: &Table) -> Result<Table> {
    Table::new(
        table
            .columns()
            .iter()
            .map(|c| Column::new(c.name(), map_cells(c.data(), Direction::Backward)))
            .collect(),
    )
}

fn fill_column(column: &Column, fill: &Value) -> Column {
    let data = match (column.data(), fill) {
        (ColumnData::Numeric(values), Value::Number(n)) => {
            ColumnData::Numeric(values.iter().map(|v| Some(v.unwrap_or(*n))).collect())
        }
        // A text default turns a numeric column into a textual one.
        (ColumnData::Numeric(values), Value::Text(s)) => {
            let cells = values
                .iter()
                .map(|v| match v {
                    Some(n) => Some(Value::Number(*n)),
                    None => Some(Value::Text(s.clone())),
                })
                .collect();
            infer_column_data(cells, &InferenceConfig::default())
        }
        (ColumnData::Categorical(values), fill) => {
            ColumnData::Categorical(fill_strings(values, &fill.to_string()))
        }
        (ColumnData::Text(values), fill) => ColumnData::Text(fill_strings(values, &fill.to_string())),
    };
    Column::new(column.name(), data)
}

fn fill_strings(values: &[Option<String>], fill: &str) -> Vec<Option<String>> {
    values
        .iter()
        .map(|v| Some(v.clone().unwrap_or_else(|| fill.to_string())))
        .collect()
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Forward,
    Backward,
}

impl Direction {
    fn apply<T: Clone>(self, cells: &[Option<T>]) -> Vec<Option<T>> {
        let mut last: Option<T> = None;
        let mut carry = |cell: &Option<T>| {
            if cell.is_some() {
                last = cell.clone();
            }
            last.clone()
        };
        match self {
            Direction::Forward => cells.iter().map(&mut carry).collect(),
            Direction::Backward => {
                let mut out: Vec<Option<T>> = cells.iter().rev().map(&mut carry).collect();
                out.reverse();
                out
            }
        }
    }
}

fn map_cells(data: &ColumnData, direction: Direction) -> ColumnData {
    match data {
        ColumnData::Numeric(v) => ColumnData::Numeric(direction.apply(v)),
        ColumnData::Categorical(v) => ColumnData::Categorical(direction.apply(v)),
        ColumnData::Text(v) => ColumnData::Text(direction.apply(v)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ColumnKind;

    fn gappy() -> Table {
        Table::new(vec![
            Column::text(
                columns::HOSPITAL_NAME,
                vec![Some("Alpha"), None, Some("Gamma"), Some("Delta")],
            ),
            Column::text(columns::CITY, vec![None, Some("Dothan"), None, Some("Boaz")]),
            Column::numeric(
                columns::ZIP_CODE,
                vec![Some(36301.0), Some(35957.0), None, Some(35216.0)],
            ),
            Column::numeric(
                columns::OVERALL_RATING,
                vec![Some(3.0), None, Some(4.0), None],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_drop_missing_keeps_complete_rows_in_order() {
        let table = Table::new(vec![
            Column::numeric("a", vec![Some(1.0), None, Some(3.0), Some(4.0)]),
            Column::text("b", vec![Some("x"), Some("y"), None, Some("z")]),
        ])
        .unwrap();
        let dropped = drop_missing(&table);
        assert_eq!(dropped.num_rows(), 2);
        assert_eq!(dropped.column("a").unwrap().data().f64_value(0), Some(1.0));
        assert_eq!(dropped.column("a").unwrap().data().f64_value(1), Some(4.0));
        assert_eq!(dropped.missing_cells(), 0);
    }

    #[test]
    fn test_drop_missing_can_empty_the_table() {
        let dropped = drop_missing(&gappy());
        assert_eq!(dropped.num_rows(), 0);
        assert_eq!(dropped.num_columns(), 4);
    }

    #[test]
    fn test_fill_missing_only_touches_configured_columns() {
        let filled = fill_missing(&gappy(), &FillDefaults::hospital()).unwrap();
        assert_eq!(filled.num_rows(), 4);

        let name = filled.column(columns::HOSPITAL_NAME).unwrap();
        assert_eq!(name.data().str_value(1), Some("Unknown"));
        let city = filled.column(columns::CITY).unwrap();
        assert_eq!(city.data().str_value(0), Some("Unknown"));
        assert_eq!(city.data().str_value(2), Some("Unknown"));
        let zip = filled.column(columns::ZIP_CODE).unwrap();
        assert_eq!(zip.data().f64_value(2), Some(0.0));
        assert_eq!(zip.kind(), ColumnKind::Numeric);

        let rating = filled.column(columns::OVERALL_RATING).unwrap();
        assert_eq!(rating.missing_count(), 2);
    }

    #[test]
    fn test_fill_text_into_numeric_column_makes_it_textual() {
        let table = Table::new(vec![Column::numeric(
            columns::PHONE_NUMBER,
            vec![Some(2567938701.0), None],
        )])
        .unwrap();
        let filled = fill_missing(&table, &FillDefaults::hospital()).unwrap();
        let phone = filled.column(columns::PHONE_NUMBER).unwrap();
        assert!(phone.kind().is_textual());
        assert_eq!(phone.data().str_value(0), Some("2567938701"));
        assert_eq!(phone.data().str_value(1), Some("Not Available"));
    }

    #[test]
    fn test_fill_number_into_text_column() {
        let table = Table::new(vec![Column::text(columns::ZIP_CODE, vec![Some("N1"), None])])
            .unwrap();
        let filled = fill_missing(&table, &FillDefaults::hospital()).unwrap();
        assert_eq!(
            filled.column(columns::ZIP_CODE).unwrap().data().str_value(1),
            Some("0")
        );
    }

    #[test]
    fn test_fill_ignores_absent_columns() {
        let table = Table::new(vec![Column::numeric("other", vec![None])]).unwrap();
        let filled = fill_missing(&table, &FillDefaults::hospital()).unwrap();
        assert_eq!(filled.missing_cells(), 1);
    }

    #[test]
    fn test_forward_fill_leaves_leading_gaps() {
        let filled = forward_fill(&gappy()).unwrap();
        let city = filled.column(columns::CITY).unwrap();
        assert_eq!(city.data().str_value(0), None);
        assert_eq!(city.data().str_value(2), Some("Dothan"));
        let rating = filled.column(columns::OVERALL_RATING).unwrap();
        assert_eq!(rating.data().f64_value(1), Some(3.0));
        assert_eq!(rating.data().f64_value(3), Some(4.0));
    }

    #[test]
    fn test_backward_fill_leaves_trailing_gaps() {
        let filled = backward_fill(&gappy()).unwrap();
        let city = filled.column(columns::CITY).unwrap();
        assert_eq!(city.data().str_value(0), Some("Dothan"));
        assert_eq!(city.data().str_value(2), Some("Boaz"));
        let rating = filled.column(columns::OVERALL_RATING).unwrap();
        assert_eq!(rating.data().f64_value(1), Some(4.0));
        assert_eq!(rating.data().f64_value(3), None);
    }

    #[test]
    fn test_clean_all_preserves_original() {
        let table = gappy();
        let before = table.missing_cells();
        let variants = clean_all(&table, &FillDefaults::hospital()).unwrap();
        assert_eq!(table.missing_cells(), before);
        let shapes = variants.shapes();
        assert_eq!(shapes.len(), 4);
        assert_eq!(shapes[0].1, TableShape { rows: 0, columns: 4 });
        assert!(shapes[1..].iter().all(|(_, s)| s.rows == 4));
    }

    #[test]
    fn test_defaults_replace_existing_entry() {
        let defaults = FillDefaults::hospital().with(columns::CITY, "Nowhere");
        assert_eq!(defaults.get(columns::CITY), Some(&Value::text("Nowhere")));
        assert_eq!(defaults.columns().count(), 4);
    }
}
