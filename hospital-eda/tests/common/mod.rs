//! Shared builders for the integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use hospital_eda::columns;
use hospital_eda::sources::write_excel;
use hospital_eda::table::{Column, Table};

/// Eight hospitals with gaps in name, city, ZIP and phone, and ratings
/// stored as text with one `Not Available`.
pub fn hospital_table() -> Table {
    Table::new(vec![
        Column::text(
            columns::HOSPITAL_NAME,
            vec![
                Some("Mercy"),
                None,
                Some("St. Luke"),
                Some("Good Samaritan"),
                Some("Memorial"),
                Some("Riverside"),
                None,
                Some("Lakeview"),
            ],
        ),
        Column::categorical(
            columns::CITY,
            vec![
                Some("Austin"),
                Some("Austin"),
                None,
                Some("Denver"),
                Some("Denver"),
                Some("Boise"),
                Some("Boise"),
                Some("Boise"),
            ],
        ),
        Column::categorical(
            columns::STATE,
            vec![
                Some("TX"),
                Some("TX"),
                Some("TX"),
                Some("CO"),
                Some("CO"),
                Some("ID"),
                Some("ID"),
                Some("ID"),
            ],
        ),
        Column::numeric(
            columns::ZIP_CODE,
            vec![
                Some(78701.0),
                None,
                Some(78702.0),
                Some(80202.0),
                None,
                Some(83702.0),
                Some(83703.0),
                Some(83704.0),
            ],
        ),
        Column::text(
            columns::PHONE_NUMBER,
            vec![
                Some("5125550100"),
                Some("5125550101"),
                None,
                Some("3035550100"),
                Some("3035550101"),
                None,
                Some("2085550100"),
                Some("2085550101"),
            ],
        ),
        Column::categorical(
            columns::OWNERSHIP,
            vec![
                Some("Government"),
                Some("Proprietary"),
                Some("Government"),
                Some("Proprietary"),
                Some("Government"),
                Some("Proprietary"),
                Some("Government"),
                Some("Proprietary"),
            ],
        ),
        Column::categorical(
            columns::EMERGENCY_SERVICES,
            vec![
                Some("Yes"),
                Some("Yes"),
                Some("No"),
                Some("No"),
                Some("Yes"),
                Some("No"),
                Some("Yes"),
                Some("No"),
            ],
        ),
        Column::text(
            columns::OVERALL_RATING,
            vec![
                Some("4"),
                Some("5"),
                Some("2"),
                Some("Not Available"),
                Some("4"),
                Some("3"),
                Some("5"),
                Some("2"),
            ],
        ),
    ])
    .unwrap()
}

/// Writes `table` to `dir/name` and returns the path.
pub fn write_workbook(dir: &Path, name: &str, table: &Table) -> PathBuf {
    let path = dir.join(name);
    write_excel(table, &path).unwrap();
    path
}

pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() < tolerance,
        "expected {expected}, got {actual}"
    );
}
