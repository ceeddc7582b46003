//! Prelude for commonly used types and traits in hospital-eda.

pub use crate::clean::{clean_all, CleanedVariants, FillDefaults};
pub use crate::config::AnalysisConfig;
pub use crate::error::{EdaError, ErrorContext, Result};
pub use crate::inspect::{inspect, DatasetSummary};
pub use crate::logging::{init_logging, LoggingConfig};
pub use crate::pipeline::{run, AnalysisOutcome};
pub use crate::sources::{write_excel, DataSource, ExcelSource};
pub use crate::stats::{chi_square_test, welch_t_test, ContingencyTable};
pub use crate::table::{Column, ColumnData, ColumnKind, Table, Value};
