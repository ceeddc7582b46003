//! SQL aggregation over a registered [`Table`].
//!
//! The table is converted to an Arrow record batch and registered with a
//! DataFusion [`SessionContext`]. Column names are always quoted, so names
//! with spaces or upper-case letters (`"Hospital overall rating"`) are safe.

use arrow::array::{Array, ArrayRef, Float64Array, Int64Array};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use datafusion::prelude::*;
use tracing::{debug, instrument};

use crate::error::{EdaError, Result};
use crate::stats::PairMoments;
use crate::table::Table;

/// Name under which tables are registered when none is configured.
pub const DEFAULT_TABLE_NAME: &str = "hospitals";

/// Quotes a column name for use in SQL.
///
/// Embedded double quotes are doubled.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quotes a string literal for use in SQL.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Whether `name` can be used as an unquoted table name.
pub fn is_valid_table_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// A query session holding one registered table.
pub struct QuerySession {
    ctx: SessionContext,
    table: Table,
    table_name: String,
}

impl std::fmt::Debug for QuerySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuerySession")
            .field("table_name", &self.table_name)
            .field("rows", &self.table.num_rows())
            .field("columns", &self.table.num_columns())
            .finish()
    }
}

impl QuerySession {
    /// Registers `table` under `table_name`.
    pub fn new(table: Table, table_name: impl Into<String>) -> Result<Self> {
        let table_name = table_name.into();
        if !is_valid_table_name(&table_name) {
            return Err(EdaError::Configuration(format!(
                "invalid table name '{table_name}'"
            )));
        }
        if !table.has_unique_column_names() {
            return Err(EdaError::Internal(
                "cannot register a table with duplicate column names".to_string(),
            ));
        }

        let ctx = SessionContext::new();
        ctx.register_batch(&table_name, table.to_record_batch()?)?;
        debug!(table = %table_name, rows = table.num_rows(), "registered table");

        Ok(Self {
            ctx,
            table,
            table_name,
        })
    }

    /// The registered table.
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// The registration name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    async fn query(&self, sql: &str) -> Result<Vec<RecordBatch>> {
        debug!(sql, "executing query");
        let df = self.ctx.sql(sql).await?;
        Ok(df.collect().await?)
    }

    /// Counts all rows and the present cells of each named column.
    ///
    /// Returns `(row_count, non_null_counts)` with counts in `columns` order.
    #[instrument(skip(self, columns), fields(table = %self.table_name, columns = columns.len()))]
    pub async fn non_null_counts(&self, columns: &[&str]) -> Result<(usize, Vec<usize>)> {
        for name in columns {
            self.table.require_column(name)?;
        }

        let mut select = vec!["COUNT(*)".to_string()];
        select.extend(
            columns
                .iter()
                .map(|name| format!("COUNT({})", quote_identifier(name))),
        );
        let sql = format!("SELECT {} FROM {}", select.join(", "), self.table_name);

        let batches = self.query(&sql).await?;
        let batch = batches
            .iter()
            .find(|b| b.num_rows() > 0)
            .ok_or_else(|| EdaError::Internal("count query returned no rows".to_string()))?;

        let counts = (0..batch.num_columns())
            .map(|i| count_at(batch.column(i), 0))
            .collect::<Result<Vec<_>>>()?;
        Ok((counts[0], counts[1..].to_vec()))
    }

    /// The most frequent present values of `column`, most frequent first.
    ///
    /// Ties are ordered by value. At most `limit` entries are returned.
    #[instrument(skip(self), fields(table = %self.table_name))]
    pub async fn value_counts(&self, column: &str, limit: usize) -> Result<Vec<(String, usize)>> {
        self.table.require_column(column)?;
        let col = quote_identifier(column);
        let sql = format!(
            "SELECT {col} AS val, COUNT(*) AS cnt FROM {table} \
             WHERE {col} IS NOT NULL GROUP BY {col} ORDER BY cnt DESC, val ASC LIMIT {limit}",
            table = self.table_name
        );

        let mut out = Vec::new();
        for batch in self.query(&sql).await? {
            for row in 0..batch.num_rows() {
                let value = array_value_to_string(batch.column(0), row)?;
                out.push((value, count_at(batch.column(1), row)?));
            }
        }
        Ok(out)
    }

    /// Mean of `value_column` per group of `group_column`, ascending by mean.
    ///
    /// Only groups listed in `groups` are considered; groups whose values are
    /// all missing do not appear in the result.
    #[instrument(skip(self, groups), fields(table = %self.table_name, groups = groups.len()))]
    pub async fn group_means(
        &self,
        group_column: &str,
        value_column: &str,
        groups: &[String],
    ) -> Result<Vec<(String, f64)>> {
        self.table.require_column(group_column)?;
        self.table.require_column(value_column)?;
        if groups.is_empty() {
            return Ok(Vec::new());
        }

        let group = quote_identifier(group_column);
        let value = quote_identifier(value_column);
        let members = groups
            .iter()
            .map(|g| quote_literal(g))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {group} AS grp, AVG(CAST({value} AS DOUBLE)) AS avg_value FROM {table} \
             WHERE {value} IS NOT NULL AND CAST({group} AS VARCHAR) IN ({members}) \
             GROUP BY {group} ORDER BY avg_value ASC, grp ASC",
            table = self.table_name
        );

        let mut out = Vec::new();
        for batch in self.query(&sql).await? {
            let means = as_f64(batch.column(1))?;
            for row in 0..batch.num_rows() {
                if means.is_null(row) {
                    continue;
                }
                let name = array_value_to_string(batch.column(0), row)?;
                out.push((name, means.value(row)));
            }
        }
        Ok(out)
    }

    /// Sums over the rows where both `x` and `y` are present.
    #[instrument(skip(self), fields(table = %self.table_name))]
    pub async fn pair_moments(&self, x: &str, y: &str) -> Result<PairMoments> {
        self.table.require_column(x)?;
        self.table.require_column(y)?;
        let x = format!("CAST({} AS DOUBLE)", quote_identifier(x));
        let y = format!("CAST({} AS DOUBLE)", quote_identifier(y));
        let sql = format!(
            "SELECT COUNT(*) AS n, SUM({x}) AS sum_x, SUM({y}) AS sum_y, \
             SUM({x} * {x}) AS sum_x2, SUM({y} * {y}) AS sum_y2, SUM({x} * {y}) AS sum_xy \
             FROM {table} WHERE {x} IS NOT NULL AND {y} IS NOT NULL",
            table = self.table_name
        );

        let batches = self.query(&sql).await?;
        let Some(batch) = batches.iter().find(|b| b.num_rows() > 0) else {
            return Ok(PairMoments::default());
        };
        let sum_at = |i: usize| -> Result<f64> {
            let sums = as_f64(batch.column(i))?;
            Ok(if sums.is_null(0) { 0.0 } else { sums.value(0) })
        };

        Ok(PairMoments {
            n: count_at(batch.column(0), 0)? as u64,
            sum_x: sum_at(1)?,
            sum_y: sum_at(2)?,
            sum_x2: sum_at(3)?,
            sum_y2: sum_at(4)?,
            sum_xy: sum_at(5)?,
        })
    }
}

fn as_f64(array: &ArrayRef) -> Result<Float64Array> {
    let casted = cast(array, &DataType::Float64)?;
    casted
        .as_any()
        .downcast_ref::<Float64Array>()
        .cloned()
        .ok_or_else(|| EdaError::Internal("expected Float64 array".to_string()))
}

fn count_at(array: &ArrayRef, row: usize) -> Result<usize> {
    let casted = cast(array, &DataType::Int64)?;
    let counts = casted
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| EdaError::Internal("expected Int64 count array".to_string()))?;
    if counts.is_null(row) {
        return Ok(0);
    }
    usize::try_from(counts.value(row))
        .map_err(|_| EdaError::Internal(format!("negative count {}", counts.value(row))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    fn hospitals() -> Table {
        Table::new(vec![
            Column::categorical(
                "State",
                vec![Some("AL"), Some("AL"), Some("TX"), Some("CA"), Some("TX"), None],
            ),
            Column::numeric(
                "Hospital overall rating",
                vec![Some(3.0), Some(5.0), Some(2.0), None, None, Some(1.0)],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("ZIP Code"), "\"ZIP Code\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
        assert_eq!(quote_literal("O'Neil"), "'O''Neil'");
    }

    #[test]
    fn test_table_name_validation() {
        assert!(is_valid_table_name("hospitals"));
        assert!(is_valid_table_name("_t1"));
        assert!(!is_valid_table_name("Hospitals"));
        assert!(!is_valid_table_name("1t"));
        assert!(!is_valid_table_name("a b"));
        assert!(QuerySession::new(hospitals(), "bad name").is_err());
    }

    #[tokio::test]
    async fn test_non_null_counts() {
        let session = QuerySession::new(hospitals(), DEFAULT_TABLE_NAME).unwrap();
        let (rows, counts) = session
            .non_null_counts(&["State", "Hospital overall rating"])
            .await
            .unwrap();
        assert_eq!(rows, 6);
        assert_eq!(counts, vec![5, 4]);
    }

    #[tokio::test]
    async fn test_non_null_counts_unknown_column() {
        let session = QuerySession::new(hospitals(), DEFAULT_TABLE_NAME).unwrap();
        let err = session.non_null_counts(&["Nope"]).await.unwrap_err();
        assert!(matches!(err, EdaError::ColumnNotFound { .. }));
    }

    #[tokio::test]
    async fn test_value_counts_orders_ties_by_name() {
        let session = QuerySession::new(hospitals(), DEFAULT_TABLE_NAME).unwrap();
        let counts = session.value_counts("State", 10).await.unwrap();
        assert_eq!(
            counts,
            vec![
                ("AL".to_string(), 2),
                ("TX".to_string(), 2),
                ("CA".to_string(), 1)
            ]
        );

        let top = session.value_counts("State", 1).await.unwrap();
        assert_eq!(top, vec![("AL".to_string(), 2)]);
    }

    #[tokio::test]
    async fn test_group_means_skip_groups_without_values() {
        let session = QuerySession::new(hospitals(), DEFAULT_TABLE_NAME).unwrap();
        let groups = vec!["AL".to_string(), "TX".to_string(), "CA".to_string()];
        let means = session
            .group_means("State", "Hospital overall rating", &groups)
            .await
            .unwrap();
        assert_eq!(
            means,
            vec![("TX".to_string(), 2.0), ("AL".to_string(), 4.0)]
        );
    }

    #[tokio::test]
    async fn test_pair_moments_match_in_memory_sums() {
        let table = Table::new(vec![
            Column::numeric("ZIP Code", vec![Some(1.0), Some(2.0), None, Some(3.0), Some(4.0)]),
            Column::numeric(
                "Hospital overall rating",
                vec![Some(2.0), Some(4.0), Some(5.0), Some(6.0), None],
            ),
        ])
        .unwrap();
        let session = QuerySession::new(table.clone(), DEFAULT_TABLE_NAME).unwrap();
        let moments = session
            .pair_moments("ZIP Code", "Hospital overall rating")
            .await
            .unwrap();

        let cells = |name: &str| {
            let data = table.column(name).unwrap().data();
            (0..data.len()).map(|r| data.f64_value(r)).collect::<Vec<_>>()
        };
        let expected =
            PairMoments::from_pairs(&cells("ZIP Code"), &cells("Hospital overall rating"));
        assert_eq!(moments, expected);
        assert_eq!(moments.n, 3);
        assert!((moments.pearson().unwrap() - 1.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_pair_moments_without_complete_pairs() {
        let session = QuerySession::new(hospitals(), DEFAULT_TABLE_NAME).unwrap();
        let moments = session
            .pair_moments("Hospital overall rating", "Hospital overall rating")
            .await
            .unwrap();
        assert_eq!(moments.n, 4);

        let empty = QuerySession::new(hospitals().take_rows(&[]), DEFAULT_TABLE_NAME).unwrap();
        let none = empty
            .pair_moments("Hospital overall rating", "Hospital overall rating")
            .await
            .unwrap();
        assert_eq!(none, PairMoments::default());
        assert_eq!(none.pearson(), None);
        assert!(matches!(
            empty.pair_moments("State", "Nope").await.unwrap_err(),
            EdaError::ColumnNotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_empty_table_counts() {
        let empty = hospitals().take_rows(&[]);
        let session = QuerySession::new(empty, DEFAULT_TABLE_NAME).unwrap();
        let (rows, counts) = session.non_null_counts(&["State"]).await.unwrap();
        assert_eq!(rows, 0);
        assert_eq!(counts, vec![0]);
        assert!(session.value_counts("State", 10).await.unwrap().is_empty());
    }
}
