//! # hospital-eda - Exploratory analysis of hospital spreadsheets
//!
//! hospital-eda loads a hospital general information workbook, reports its
//! shape and missing values, produces cleaned variants of the data, draws a
//! set of descriptive charts and runs two hypothesis tests:
//!
//! - a Welch two-sample t-test comparing overall ratings of hospitals with and
//!   without emergency services;
//! - a chi-square test of independence between hospital ownership and
//!   emergency services.
//!
//! Tables live in memory as a small column-typed [`table::Table`]. Grouped
//! aggregations run as SQL through DataFusion on an Arrow `RecordBatch`
//! registered in a [`session::QuerySession`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hospital_eda::prelude::*;
//!
//! # async fn example() -> hospital_eda::error::Result<()> {
//! let config = AnalysisConfig::new("Hospital_General_Information.xlsx")
//!     .with_output_dir("out")
//!     .with_significance_level(0.01);
//!
//! let outcome = run(&config).await?;
//! if !outcome.is_success() {
//!     eprintln!("at least one test could not be computed");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Working with the stages directly
//!
//! ```rust,no_run
//! use hospital_eda::prelude::*;
//!
//! # async fn example() -> hospital_eda::error::Result<()> {
//! let table = ExcelSource::new("Hospital_General_Information.xlsx").load()?;
//! let summary = inspect(&table).await?;
//! println!("{summary}");
//!
//! let variants = clean_all(&table, &FillDefaults::hospital())?;
//! write_excel(&variants.filled, "Hospital_Cleaned.xlsx")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! The library emits `tracing` events and spans; call
//! [`logging::init_logging`] (or install your own subscriber) to see them.

pub mod charts;
pub mod clean;
pub mod columns;
pub mod config;
pub mod error;
pub mod inspect;
pub mod logging;
pub mod pipeline;
pub mod prelude;
pub mod report;
pub mod session;
pub mod sources;
pub mod stats;
pub mod table;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_fixtures;
