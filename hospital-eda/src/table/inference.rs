//! Column type inference.
//!
//! Every column is classified exactly once, when the table is built, into one
//! of three storage kinds. Downstream code dispatches on [`ColumnKind`]
//! instead of probing cell values at runtime.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{ColumnData, Value};

/// Configuration for the type inference step.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Maximum number of distinct values for a text column to count as categorical (default: 100)
    pub categorical_threshold: usize,
    /// A text column is also categorical when distinct/present is at most this ratio (default: 0.5)
    pub categorical_ratio: f64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            categorical_threshold: 100,
            categorical_ratio: 0.5,
        }
    }
}

/// Storage kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Every present cell is a number
    Numeric,
    /// Text with a small set of repeated values
    Categorical,
    /// Free text
    Text,
}

impl ColumnKind {
    /// Returns the lowercase name used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Categorical => "categorical",
            ColumnKind::Text => "text",
        }
    }

    /// Whether the column holds strings.
    pub fn is_textual(&self) -> bool {
        !matches!(self, ColumnKind::Numeric)
    }
}

/// Decides the storage kind for a sequence of raw cells.
///
/// A column with no present cells is numeric, mirroring how spreadsheet
/// readers type an all-blank column as floating point.
pub fn infer_kind(cells: &[Option<Value>], config: &InferenceConfig) -> ColumnKind {
    let present = cells.iter().flatten().count();
    if cells.iter().flatten().all(Value::is_number) {
        return ColumnKind::Numeric;
    }

    let distinct: HashSet<String> = cells.iter().flatten().map(Value::to_string).collect();
    let ratio = distinct.len() as f64 / present.max(1) as f64;

    if distinct.len() <= config.categorical_threshold || ratio <= config.categorical_ratio {
        ColumnKind::Categorical
    } else {
        ColumnKind::Text
    }
}

/// Builds typed column storage for the given kind.
///
/// Numbers stored in a textual column are rendered with their display form.
/// Text cells in a numeric column never occur because [`infer_kind`] only
/// returns `Numeric` when every present cell is a number; should one appear
/// anyway it is stored as missing.
pub fn build_column_data(cells: Vec<Option<Value>>, kind: ColumnKind) -> ColumnData {
    match kind {
        ColumnKind::Numeric => ColumnData::Numeric(
            cells
                .into_iter()
                .map(|cell| cell.and_then(|v| v.as_f64()))
                .collect(),
        ),
        ColumnKind::Categorical => {
            ColumnData::Categorical(cells.into_iter().map(text_cell).collect())
        }
        ColumnKind::Text => ColumnData::Text(cells.into_iter().map(text_cell).collect()),
    }
}

/// Infers the kind and builds the storage in one step.
pub fn infer_column_data(cells: Vec<Option<Value>>, config: &InferenceConfig) -> ColumnData {
    let kind = infer_kind(&cells, config);
    build_column_data(cells, kind)
}

fn text_cell(cell: Option<Value>) -> Option<String> {
    cell.map(|v| match v {
        Value::Text(s) => s,
        number => number.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(values: &[&str]) -> Vec<Option<Value>> {
        values.iter().map(|v| Some(Value::text(*v))).collect()
    }

    #[test]
    fn test_all_numbers_is_numeric() {
        let cells = vec![Some(Value::Number(36301.0)), None, Some(Value::Number(35957.0))];
        assert_eq!(infer_kind(&cells, &InferenceConfig::default()), ColumnKind::Numeric);
    }

    #[test]
    fn test_all_missing_is_numeric() {
        let cells: Vec<Option<Value>> = vec![None, None];
        assert_eq!(infer_kind(&cells, &InferenceConfig::default()), ColumnKind::Numeric);
    }

    #[test]
    fn test_repeated_strings_are_categorical() {
        let cells = text(&["Yes", "No", "Yes", "Yes"]);
        assert_eq!(
            infer_kind(&cells, &InferenceConfig::default()),
            ColumnKind::Categorical
        );
    }

    #[test]
    fn test_high_cardinality_is_text() {
        let config = InferenceConfig {
            categorical_threshold: 2,
            categorical_ratio: 0.5,
        };
        let cells = text(&["a", "b", "c", "d"]);
        assert_eq!(infer_kind(&cells, &config), ColumnKind::Text);
    }

    #[test]
    fn test_mixed_numbers_and_text_stored_as_text() {
        let cells = vec![
            Some(Value::Number(3.0)),
            Some(Value::text("Not Available")),
            None,
        ];
        let data = infer_column_data(cells, &InferenceConfig::default());
        assert_eq!(data.kind(), ColumnKind::Categorical);
        assert_eq!(data.value(0), Some(Value::text("3")));
        assert_eq!(data.value(1), Some(Value::text("Not Available")));
        assert_eq!(data.value(2), None);
    }
}
