//! Error types for the hospital analysis pipeline.
//!
//! All fallible operations return [`Result<T>`], whose error type is
//! [`EdaError`]. Fatal I/O problems (`FileRead`, `Write`) abort a run;
//! `InsufficientData` is scoped to a single statistical procedure.
//!
//! Unparseable numeric cells are not errors. They are counted and logged as
//! coercion warnings (see [`crate::table::CoercionReport`]).

use std::path::Path;

use thiserror::Error;

/// The main error type for the analysis pipeline.
#[derive(Error, Debug)]
pub enum EdaError {
    /// The input spreadsheet is missing, unreadable, or malformed.
    #[error("Failed to read '{path}': {message}")]
    FileRead {
        /// Path of the file that could not be read
        path: String,
        /// Detailed error message
        message: String,
    },

    /// An output artifact (workbook, chart, report) could not be written.
    #[error("Failed to write '{path}': {message}")]
    Write {
        /// Destination path
        path: String,
        /// Detailed error message
        message: String,
    },

    /// A statistical procedure cannot be computed from the available data.
    #[error("Insufficient data for {test}: {reason}")]
    InsufficientData {
        /// Name of the procedure
        test: String,
        /// Why the input is degenerate
        reason: String,
    },

    /// A column required by an operation is not present in the table.
    #[error("Column '{column}' not found in dataset")]
    ColumnNotFound { column: String },

    /// Error from DataFusion operations.
    #[error("DataFusion error: {0}")]
    DataFusion(#[from] datafusion::error::DataFusionError),

    /// Error from Arrow operations.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from serialization operations.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Error related to configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic internal error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A type alias for `Result<T, EdaError>`.
pub type Result<T> = std::result::Result<T, EdaError>;

impl EdaError {
    /// Creates a file read error for the given path.
    pub fn file_read(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::FileRead {
            path: path.as_ref().display().to_string(),
            message: message.into(),
        }
    }

    /// Creates a write error for the given path.
    pub fn write(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Write {
            path: path.as_ref().display().to_string(),
            message: message.into(),
        }
    }

    /// Creates an insufficient data error for the named procedure.
    pub fn insufficient_data(test: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InsufficientData {
            test: test.into(),
            reason: reason.into(),
        }
    }

    /// Creates a column-not-found error.
    pub fn column_not_found(column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
        }
    }

    /// Returns true for errors that must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::InsufficientData { .. })
    }
}

impl From<serde_json::Error> for EdaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, msg: &str) -> Result<T>;

    /// Adds context with a lazy message.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<EdaError>,
{
    fn context(self, msg: &str) -> Result<T> {
        self.with_context(|| msg.to_string())
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| match e.into() {
            EdaError::Internal(inner) => EdaError::Internal(format!("{}: {inner}", f())),
            other => EdaError::Internal(format!("{}: {other}", f())),
        })
    }
}
