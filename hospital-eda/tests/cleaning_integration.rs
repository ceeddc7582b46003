//! Integration tests for the missing-value cleaning strategies.

mod common;

use hospital_eda::clean::{backward_fill, drop_missing, fill_missing, forward_fill};
use hospital_eda::columns;
use hospital_eda::prelude::*;

#[test]
fn test_drop_missing_keeps_complete_rows_in_order() {
    let table = common::hospital_table();
    let dropped = drop_missing(&table);

    assert_eq!(dropped.num_columns(), table.num_columns());
    assert_eq!(dropped.missing_cells(), 0);
    // Only rows 0, 3 and 7 are complete.
    let names: Vec<_> = (0..dropped.num_rows())
        .map(|row| {
            dropped
                .column(columns::HOSPITAL_NAME)
                .unwrap()
                .data()
                .str_value(row)
                .map(str::to_string)
        })
        .collect();
    assert_eq!(
        names,
        vec![
            Some("Mercy".to_string()),
            Some("Good Samaritan".to_string()),
            Some("Lakeview".to_string()),
        ]
    );
}

#[test]
fn test_fill_missing_only_touches_configured_columns() {
    let beds = Column::numeric(
        "Beds",
        vec![None, Some(10.0), None, None, None, None, None, None],
    );
    let table = common::hospital_table().with_column(beds).unwrap();
    let filled = fill_missing(&table, &FillDefaults::hospital()).unwrap();

    assert_eq!(filled.num_rows(), table.num_rows());
    for name in [
        columns::HOSPITAL_NAME,
        columns::CITY,
        columns::ZIP_CODE,
        columns::PHONE_NUMBER,
    ] {
        assert_eq!(filled.column(name).unwrap().missing_count(), 0, "{name}");
    }
    assert_eq!(filled.column("Beds").unwrap().missing_count(), 7);

    let name = filled.column(columns::HOSPITAL_NAME).unwrap().data();
    assert_eq!(name.str_value(1), Some("Unknown"));
    assert_eq!(name.str_value(0), Some("Mercy"));
    let zip = filled.column(columns::ZIP_CODE).unwrap().data();
    assert_eq!(zip.f64_value(1), Some(0.0));
    assert_eq!(zip.f64_value(0), Some(78701.0));
    let phone = filled.column(columns::PHONE_NUMBER).unwrap().data();
    assert_eq!(phone.str_value(2), Some("Not Available"));
}

#[test]
fn test_fill_missing_ignores_absent_columns() {
    let table = Table::new(vec![Column::numeric("x", vec![None, Some(1.0)])]).unwrap();
    let filled = fill_missing(&table, &FillDefaults::hospital()).unwrap();
    assert_eq!(filled, table);
}

#[test]
fn test_directional_fills_leave_edge_gaps() {
    let table = Table::new(vec![Column::numeric(
        "v",
        vec![None, Some(1.0), None, None, Some(4.0), None],
    )])
    .unwrap();

    let forward = forward_fill(&table).unwrap();
    let values: Vec<_> = (0..6)
        .map(|row| forward.column("v").unwrap().data().f64_value(row))
        .collect();
    assert_eq!(
        values,
        vec![None, Some(1.0), Some(1.0), Some(1.0), Some(4.0), Some(4.0)]
    );

    let backward = backward_fill(&table).unwrap();
    let values: Vec<_> = (0..6)
        .map(|row| backward.column("v").unwrap().data().f64_value(row))
        .collect();
    assert_eq!(
        values,
        vec![Some(1.0), Some(1.0), Some(4.0), Some(4.0), Some(4.0), None]
    );
}

#[test]
fn test_clean_all_leaves_original_untouched() {
    let table = common::hospital_table();
    let before = table.clone();
    let variants = clean_all(&table, &FillDefaults::hospital()).unwrap();

    assert_eq!(table, before);
    let shapes = variants.shapes();
    assert_eq!(shapes.len(), 4);
    assert_eq!(shapes[0].0, "dropped");
    assert_eq!(shapes[0].1.rows, 3);
    for (_, shape) in &shapes[1..] {
        assert_eq!(shape.rows, 8);
        assert_eq!(shape.columns, 8);
    }

    // Forward fill carries Austin into the missing city of row 2.
    let city = variants.forward_filled.column(columns::CITY).unwrap().data();
    assert_eq!(city.str_value(2), Some("Austin"));
    // Backward fill pulls Denver up instead.
    let city = variants.backward_filled.column(columns::CITY).unwrap().data();
    assert_eq!(city.str_value(2), Some("Denver"));
}

#[test]
fn test_empty_table_cleans_to_empty_tables() {
    let table = Table::new(vec![Column::numeric("x", vec![])]).unwrap();
    let variants = clean_all(&table, &FillDefaults::hospital()).unwrap();
    for (_, shape) in variants.shapes() {
        assert_eq!(shape.rows, 0);
        assert_eq!(shape.columns, 1);
    }
}
