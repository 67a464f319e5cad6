//! Report-level error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::DatabaseKind;
use crate::driver::DriverError;
use crate::engine::ExecutionStatus;
use crate::output::OutputError;
use crate::report::SpecError;

/// Result type for report operations.
pub type ReportResult<T> = Result<T, ReportError>;

/// Broad classification of a [`ReportError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or incomplete report specification.
    Spec,
    /// The database family has no driver in this build.
    DriverUnavailable,
    /// The driver failed to open a connection.
    Connection,
    /// The driver failed while running a query.
    Query,
    /// The result could not be written.
    Output,
    /// An operation was called out of order.
    InvalidState,
    /// The report document could not be read or parsed.
    Document,
}

/// Errors raised while parsing, connecting or executing a report.
///
/// Variants raised on behalf of a report carry its name, so a failure in a
/// subreport iteration can be told apart from one in the root report.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("invalid report '{report}': {source}")]
    Spec {
        report: String,
        #[source]
        source: SpecError,
    },

    #[error("unable to load {kind} support for report '{report}'")]
    DriverUnavailable { report: String, kind: DatabaseKind },

    #[error("failed to open {target} for report '{report}': {source}")]
    Connection {
        report: String,
        target: String,
        #[source]
        source: DriverError,
    },

    #[error("query failed in report '{report}': {source}")]
    Query {
        report: String,
        #[source]
        source: DriverError,
    },

    #[error("failed to write '{path}' for report '{report}': {source}")]
    Output {
        report: String,
        path: String,
        #[source]
        source: OutputError,
    },

    #[error("cannot {operation} report '{report}' while it is {status}")]
    InvalidState {
        report: String,
        operation: &'static str,
        status: ExecutionStatus,
    },

    #[error("failed to read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {origin}: {source}")]
    Document {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },
}

impl ReportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Spec { .. } => ErrorKind::Spec,
            Self::DriverUnavailable { .. } => ErrorKind::DriverUnavailable,
            Self::Connection { .. } => ErrorKind::Connection,
            Self::Query { .. } => ErrorKind::Query,
            Self::Output { .. } => ErrorKind::Output,
            Self::InvalidState { .. } => ErrorKind::InvalidState,
            Self::Read { .. } | Self::Document { .. } => ErrorKind::Document,
        }
    }

    /// Name of the report the error originated from, if any.
    pub fn report_name(&self) -> Option<&str> {
        match self {
            Self::Spec { report, .. }
            | Self::DriverUnavailable { report, .. }
            | Self::Connection { report, .. }
            | Self::Query { report, .. }
            | Self::Output { report, .. }
            | Self::InvalidState { report, .. } => Some(report),
            Self::Read { .. } | Self::Document { .. } => None,
        }
    }
}
