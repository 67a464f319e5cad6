//! # simplereports
//!
//! Run SQL queries described in a YAML document and write the result as a
//! CSV, JSON or XML file.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 YAML report document                     │
//! │        (name, query, connect, output, report)            │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [report::ReportDocument]
//! ┌─────────────────────────────────────────────────────────┐
//! │          ReportSpec (validated root report)              │
//! │     + SubreportTemplate (validated once per row)         │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [engine::Report + driver]
//! ┌─────────────────────────────────────────────────────────┐
//! │        ResultSet (columns + rows, subreports merged)     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [output]
//! ┌─────────────────────────────────────────────────────────┐
//! │                 .csv / .json / .xml                      │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use simplereports::Report;
//!
//! let mut report = Report::from_path("customers.yaml")?;
//! report.parse()?;
//! report.connect()?;
//! let summary = report.execute()?;
//! println!("{} rows written to {}", summary.rows, summary.path);
//! # Ok::<(), simplereports::ReportError>(())
//! ```

pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod output;
pub mod report;

pub use driver::{CellValue, ResultSet};
pub use engine::{ExecutionStatus, ExecutionSummary, Report};
pub use error::{ErrorKind, ReportError, ReportResult};
pub use output::OutputFormat;
