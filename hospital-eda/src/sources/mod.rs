//! Data source connectors.
//!
//! A [`DataSource`] produces a [`Table`]. The only production source is
//! [`ExcelSource`], which reads the first worksheet of a spreadsheet file;
//! [`write_excel`] persists a table back to disk.

use std::collections::HashSet;
use std::fmt::Debug;

use once_cell::sync::Lazy;

use crate::error::Result;
use crate::table::Table;

mod excel;

pub use excel::{write_excel, ExcelSource};

/// A source of tabular records.
///
/// # Examples
///
/// ```rust,no_run
/// use hospital_eda::sources::{DataSource, ExcelSource};
///
/// # fn example() -> hospital_eda::error::Result<()> {
/// let source = ExcelSource::new("Hospital_General_Information.xlsx");
/// let table = source.load()?;
/// println!("{} rows from {}", table.num_rows(), source.description());
/// # Ok(())
/// # }
/// ```
pub trait DataSource: Debug {
    /// Reads the whole source into memory.
    fn load(&self) -> Result<Table>;

    /// Returns a human-readable description of this data source.
    fn description(&self) -> String;
}

/// Strings read as missing cells when they match exactly.
///
/// This is the usual spreadsheet-reader vocabulary. `Not Available` is
/// deliberately absent: it is kept as text and only treated as missing when a
/// column is coerced to numbers.
static MISSING_VALUES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
        "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
    ]
    .into_iter()
    .collect()
});

/// Whether a raw string cell denotes a missing value.
pub fn is_missing_marker(raw: &str) -> bool {
    MISSING_VALUES.contains(raw)
}

/// Normalizes a header cell: trims whitespace and names blank headers by position.
pub(crate) fn normalize_header(raw: &str, index: usize) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        format!("Unnamed: {index}")
    } else {
        trimmed.to_string()
    }
}

/// Makes header names unique by suffixing repeats with `.1`, `.2`, ...
pub(crate) fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    headers
        .into_iter()
        .map(|name| {
            if seen.insert(name.clone()) {
                return name;
            }
            let mut n = 1;
            loop {
                let candidate = format!("{name}.{n}");
                if seen.insert(candidate.clone()) {
                    return candidate;
                }
                n += 1;
            }
        })
        .collect()
}
