//! Property-based tests for cleaning, inspection and the statistical procedures.
//!
//! Tables are generated with random gap patterns over a numeric and a
//! categorical column so every property is checked against both storage
//! kinds.

use hospital_eda::charts::histogram_bins;
use hospital_eda::clean::{backward_fill, drop_missing, fill_missing, forward_fill};
use hospital_eda::prelude::*;
use hospital_eda::stats::{chi_square_test, welch_t_test, ContingencyTable};
use proptest::prelude::*;

// ============================================================================
// Test Data Generation Utilities
// ============================================================================

fn arb_numbers(len: usize) -> impl Strategy<Value = Vec<Option<f64>>> {
    prop::collection::vec(prop::option::weighted(0.7, -1000.0..1000.0f64), len)
}

fn arb_labels(len: usize) -> impl Strategy<Value = Vec<Option<String>>> {
    let label = prop::sample::select(vec!["A", "B", "C"]).prop_map(String::from);
    prop::collection::vec(prop::option::weighted(0.7, label), len)
}

/// A two-column table of 0..40 rows with random gaps.
fn arb_table() -> impl Strategy<Value = Table> {
    (0usize..40).prop_flat_map(|len| {
        (arb_numbers(len), arb_labels(len)).prop_map(|(numbers, labels)| {
            Table::new(vec![
                Column::numeric("score", numbers),
                Column::categorical("group", labels),
            ])
            .unwrap()
        })
    })
}

fn leading_gaps(data: &ColumnData) -> usize {
    (0..data.len()).take_while(|&row| data.is_missing(row)).count()
}

fn trailing_gaps(data: &ColumnData) -> usize {
    (0..data.len())
        .rev()
        .take_while(|&row| data.is_missing(row))
        .count()
}

// ============================================================================
// Cleaning
// ============================================================================

proptest! {
    #[test]
    fn test_drop_missing_keeps_exactly_complete_rows(table in arb_table()) {
        let complete = (0..table.num_rows()).filter(|&r| !table.row_has_missing(r)).count();
        let dropped = drop_missing(&table);
        prop_assert_eq!(dropped.num_rows(), complete);
        prop_assert_eq!(dropped.num_columns(), table.num_columns());
        prop_assert_eq!(dropped.missing_cells(), 0);
    }

    #[test]
    fn test_fill_missing_removes_gaps_in_configured_columns(table in arb_table()) {
        let defaults = FillDefaults::new().with("score", 0.0).with("group", "Unknown");
        let filled = fill_missing(&table, &defaults).unwrap();
        prop_assert_eq!(filled.num_rows(), table.num_rows());
        prop_assert_eq!(filled.missing_cells(), 0);

        // Present cells are never changed.
        let before = table.column("score").unwrap().data();
        let after = filled.column("score").unwrap().data();
        for row in 0..table.num_rows() {
            if let Some(v) = before.f64_value(row) {
                prop_assert_eq!(after.f64_value(row), Some(v));
            }
        }
    }

    #[test]
    fn test_directional_fills_only_leave_edge_gaps(table in arb_table()) {
        let forward = forward_fill(&table).unwrap();
        let backward = backward_fill(&table).unwrap();
        prop_assert_eq!(forward.num_rows(), table.num_rows());
        prop_assert_eq!(backward.num_rows(), table.num_rows());

        for column in table.columns() {
            let original = column.data();
            let f = forward.column(column.name()).unwrap();
            let b = backward.column(column.name()).unwrap();
            prop_assert_eq!(f.kind(), column.kind());
            prop_assert_eq!(f.missing_count(), leading_gaps(original));
            prop_assert_eq!(b.missing_count(), trailing_gaps(original));
        }
    }

    #[test]
    fn test_cleaning_is_deterministic(table in arb_table()) {
        let first = clean_all(&table, &FillDefaults::hospital()).unwrap();
        let second = clean_all(&table, &FillDefaults::hospital()).unwrap();
        prop_assert_eq!(first.dropped, second.dropped);
        prop_assert_eq!(first.filled, second.filled);
        prop_assert_eq!(first.forward_filled, second.forward_filled);
        prop_assert_eq!(first.backward_filled, second.backward_filled);
    }
}

// ============================================================================
// Inspection
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// The SQL counts agree with the in-memory missing counts.
    #[test]
    fn test_inspect_counts_match_table(table in arb_table()) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let summary = inspect(&table).await.unwrap();
            prop_assert_eq!(summary.rows, table.num_rows());
            for column in table.columns() {
                let s = summary.column(column.name()).unwrap();
                prop_assert_eq!(s.missing, column.missing_count());
                prop_assert_eq!(s.non_null + s.missing, table.num_rows());
            }
            prop_assert_eq!(summary.total_missing(), table.missing_cells());
            Ok(())
        })?;
    }
}

// ============================================================================
// Statistics
// ============================================================================

proptest! {
    #[test]
    fn test_contingency_conserves_counts(table in arb_table()) {
        let labelled = table
            .with_column(Column::categorical(
                "flag",
                (0..table.num_rows())
                    .map(|r| Some(if r % 2 == 0 { "Yes" } else { "No" }))
                    .collect(),
            ))
            .unwrap();
        let ct = ContingencyTable::from_columns(&labelled, "group", "flag").unwrap();

        let present = labelled.column("group").unwrap().len()
            - labelled.column("group").unwrap().missing_count();
        prop_assert_eq!(ct.total(), present as u64);
        prop_assert_eq!(ct.row_totals().iter().sum::<u64>(), ct.total());
        prop_assert_eq!(ct.column_totals().iter().sum::<u64>(), ct.total());
    }

    #[test]
    fn test_chi_square_outputs_are_valid(
        counts in prop::collection::vec(prop::collection::vec(1u64..50, 3), 2..5),
        correction in any::<bool>(),
    ) {
        let rows = counts.len();
        let table = ContingencyTable::new(
            "r",
            "c",
            (0..rows).map(|i| format!("r{i}")).collect(),
            vec!["x".into(), "y".into(), "z".into()],
            counts,
        )
        .unwrap();
        let result = chi_square_test(&table, correction).unwrap();
        prop_assert!(result.statistic >= 0.0);
        prop_assert!((0.0..=1.0).contains(&result.p_value));
        prop_assert_eq!(result.dof, (rows - 1) * 2);
        // Yates applies only to one degree of freedom.
        prop_assert!(!result.corrected);

        let expected_total: f64 = result.expected.iter().flatten().sum();
        prop_assert!((expected_total - table.total() as f64).abs() < 1e-6);
    }

    #[test]
    fn test_welch_swapping_groups_negates_statistic(
        a in prop::collection::vec(0.0..5.0f64, 2..30),
        b in prop::collection::vec(0.0..5.0f64, 2..30),
    ) {
        let (Ok(ab), Ok(ba)) = (welch_t_test(&a, &b), welch_t_test(&b, &a)) else {
            // Both groups constant: neither direction is computable.
            return Ok(());
        };
        prop_assert!((ab.statistic + ba.statistic).abs() < 1e-9);
        prop_assert!((ab.p_value - ba.p_value).abs() < 1e-9);
        prop_assert!((0.0..=1.0).contains(&ab.p_value));
        prop_assert!(ab.df > 0.0);
    }

    #[test]
    fn test_histogram_counts_every_value(
        values in prop::collection::vec(-1e6..1e6f64, 1..200),
        bins in 1usize..40,
    ) {
        let hist = histogram_bins(&values, bins);
        prop_assert_eq!(hist.len(), bins);
        prop_assert_eq!(hist.iter().map(|b| b.count).sum::<usize>(), values.len());
        prop_assert!(hist.windows(2).all(|w| w[0].end <= w[1].start + 1e-9));
    }
}
