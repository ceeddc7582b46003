//! Small in-memory hospital datasets for tests.
//!
//! The main fixture mirrors the shape of the hospital general information
//! export: the columns the analysis relies on, a few gaps in the columns the
//! fill variant repairs, and ratings stored as text with `Not Available`
//! placeholders.

use std::path::Path;

use crate::columns;
use crate::error::Result;
use crate::sources::write_excel;
use crate::table::{Column, InferenceConfig, Table, Value};

type Row = (
    Option<&'static str>, // name
    Option<&'static str>, // city
    &'static str,         // state
    Option<f64>,          // zip
    Option<&'static str>, // phone
    &'static str,         // ownership
    &'static str,         // emergency
    &'static str,         // rating
);

const ROWS: [Row; 12] = [
    (Some("Southeast Health"), Some("Dothan"), "AL", Some(36301.0), Some("3347938701"), "Government", "Yes", "3"),
    (Some("Marshall Medical"), Some("Boaz"), "AL", Some(35957.0), Some("2565938310"), "Government", "Yes", "4"),
    (None, Some("Florence"), "AL", Some(35631.0), None, "Proprietary", "Yes", "2"),
    (Some("Crestwood"), None, "AL", None, Some("2568823100"), "Proprietary", "No", "Not Available"),
    (Some("Baylor Scott"), Some("Dallas"), "TX", Some(75246.0), Some("2148203151"), "Voluntary", "Yes", "5"),
    (Some("Methodist"), Some("Houston"), "TX", Some(77030.0), None, "Voluntary", "Yes", "4"),
    (Some("Shriners"), Some("Galveston"), "TX", None, Some("4097701600"), "Proprietary", "No", "1"),
    (Some("Kindred"), None, "TX", Some(75204.0), Some("2148263200"), "Proprietary", "No", "2"),
    (Some("Cedars-Sinai"), Some("Los Angeles"), "CA", Some(90048.0), Some("3104233277"), "Voluntary", "Yes", "5"),
    (None, Some("Oakland"), "CA", Some(94609.0), Some("5106554000"), "Government", "No", "3"),
    (Some("Scripps"), Some("La Jolla"), "CA", Some(92037.0), None, "Voluntary", "No", "Not Available"),
    (Some("Sutter"), Some("Sacramento"), "CA", Some(95816.0), Some("9164548230"), "Government", "No", "2"),
];

fn text_column(name: &str, values: impl Iterator<Item = Option<&'static str>>) -> Column {
    Column::from_cells(
        name,
        values.map(|v| v.map(Value::text)).collect(),
        &InferenceConfig::default(),
    )
}

/// Twelve hospitals across three states.
///
/// Two names, two cities, two ZIP codes and three phone numbers are missing;
/// two ratings are `Not Available`. Emergency hospitals rate higher on
/// average than non-emergency ones.
pub fn hospital_table() -> Table {
    let columns = vec![
        text_column(columns::HOSPITAL_NAME, ROWS.iter().map(|r| r.0)),
        text_column(columns::CITY, ROWS.iter().map(|r| r.1)),
        text_column(columns::STATE, ROWS.iter().map(|r| Some(r.2))),
        Column::numeric(columns::ZIP_CODE, ROWS.iter().map(|r| r.3).collect()),
        text_column(columns::PHONE_NUMBER, ROWS.iter().map(|r| r.4)),
        text_column(columns::OWNERSHIP, ROWS.iter().map(|r| Some(r.5))),
        text_column(columns::EMERGENCY_SERVICES, ROWS.iter().map(|r| Some(r.6))),
        text_column(columns::OVERALL_RATING, ROWS.iter().map(|r| Some(r.7))),
    ];
    Table::new(columns).expect("fixture columns have equal length")
}

/// A hospital table where every hospital offers emergency services.
pub fn emergency_only_table() -> Table {
    let table = hospital_table();
    let keep: Vec<usize> = (0..table.num_rows())
        .filter(|&row| ROWS[row].6 == columns::YES)
        .collect();
    table.take_rows(&keep)
}

/// Writes [`hospital_table`] as a workbook at `path`.
pub fn write_hospital_workbook(path: impl AsRef<Path>) -> Result<()> {
    write_excel(&hospital_table(), path)
}
