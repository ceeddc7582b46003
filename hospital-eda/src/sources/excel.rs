//! Spreadsheet reading (calamine) and writing (rust_xlsxwriter).

use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::{Workbook, XlsxError};
use tracing::{debug, info, instrument};

use super::{dedupe_headers, is_missing_marker, normalize_header, DataSource};
use crate::error::{EdaError, Result};
use crate::table::{InferenceConfig, Table, Value};

/// Reads one worksheet of a spreadsheet file.
///
/// The format (`xlsx`, `xlsm`, `xlsb`, `xls`, `ods`) is detected from the
/// file extension. The first row of the sheet is the header.
#[derive(Debug, Clone)]
pub struct ExcelSource {
    path: PathBuf,
    sheet_index: usize,
    inference: InferenceConfig,
}

impl ExcelSource {
    /// Creates a source reading the first worksheet of `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sheet_index: 0,
            inference: InferenceConfig::default(),
        }
    }

    /// Reads the worksheet at `index` instead of the first one.
    pub fn with_sheet_index(mut self, index: usize) -> Self {
        self.sheet_index = index;
        self
    }

    /// Overrides the column type inference settings.
    pub fn with_inference(mut self, config: InferenceConfig) -> Self {
        self.inference = config;
        self
    }

    /// The file being read.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_error(&self, message: impl Into<String>) -> EdaError {
        EdaError::file_read(&self.path, message)
    }
}

impl DataSource for ExcelSource {
    #[instrument(skip(self), fields(path = %self.path.display(), sheet = self.sheet_index))]
    fn load(&self) -> Result<Table> {
        let mut workbook =
            open_workbook_auto(&self.path).map_err(|e| self.read_error(e.to_string()))?;

        let range = workbook
            .worksheet_range_at(self.sheet_index)
            .ok_or_else(|| {
                self.read_error(format!("workbook has no sheet at index {}", self.sheet_index))
            })?
            .map_err(|e| self.read_error(e.to_string()))?;

        let mut rows = range.rows();
        let header_row = rows
            .next()
            .ok_or_else(|| self.read_error("worksheet is empty"))?;

        let headers = dedupe_headers(
            header_row
                .iter()
                .enumerate()
                .map(|(index, cell)| normalize_header(&cell.to_string(), index))
                .collect(),
        );
        debug!(columns = ?headers, "read header row");

        let records: Vec<Vec<Option<Value>>> = rows
            .map(|row| row.iter().map(cell_value).collect())
            .collect();

        let table = Table::from_rows(headers, records, &self.inference)?;
        info!(
            rows = table.num_rows(),
            columns = table.num_columns(),
            "loaded spreadsheet"
        );
        Ok(table)
    }

    fn description(&self) -> String {
        format!(
            "spreadsheet '{}' (sheet {})",
            self.path.display(),
            self.sheet_index
        )
    }
}

/// Maps a spreadsheet cell to a table cell.
fn cell_value(cell: &Data) -> Option<Value> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::Int(i) => Some(Value::Number(*i as f64)),
        Data::Float(f) if f.is_finite() => Some(Value::Number(*f)),
        Data::Float(_) => None,
        Data::String(s) if is_missing_marker(s) => None,
        Data::String(s) => Some(Value::Text(s.clone())),
        Data::Bool(b) => Some(Value::text(if *b { "True" } else { "False" })),
        other => Some(Value::Text(other.to_string())),
    }
}

/// Writes a table to a new `.xlsx` workbook at `path`.
///
/// The first row holds the column names; each table row becomes one sheet
/// row. Numbers are written as numbers, text as strings, and missing cells
/// are left blank. No index column is written.
#[instrument(skip_all, fields(path = %path.as_ref().display(), rows = table.num_rows()))]
pub fn write_excel(table: &Table, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let write_error = |e: XlsxError| EdaError::write(path, e.to_string());

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (index, column) in table.columns().iter().enumerate() {
        let col = u16::try_from(index)
            .map_err(|_| EdaError::write(path, format!("too many columns ({index})")))?;
        worksheet
            .write_string(0, col, column.name())
            .map_err(write_error)?;

        for row in 0..table.num_rows() {
            let sheet_row = u32::try_from(row + 1)
                .map_err(|_| EdaError::write(path, format!("too many rows ({row})")))?;
            match column.data().value(row) {
                Some(Value::Number(n)) => {
                    worksheet
                        .write_number(sheet_row, col, n)
                        .map_err(write_error)?;
                }
                Some(Value::Text(s)) => {
                    worksheet
                        .write_string(sheet_row, col, &s)
                        .map_err(write_error)?;
                }
                None => {}
            }
        }
    }

    workbook.save(path).map_err(write_error)?;
    info!("wrote workbook");
    Ok(())
}
