//! Result file writers.
//!
//! | Format | Extension | Writer |
//! |--------|-----------|--------|
//! | CSV | `.csv` | [`CsvWriter`] |
//! | JSON | `.json` | [`JsonWriter`] |
//! | XML | `.xml` | [`XmlWriter`] |
//!
//! The format of a report is chosen by the final extension of its `output`
//! path. Every writer consumes the same finalized [`ResultSet`].

mod csv;
mod json;
mod xml;

pub use self::csv::{CsvLineEnding, CsvWriter};
pub use self::json::JsonWriter;
pub use self::xml::{element_name, XmlWriter};

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::driver::ResultSet;

/// Result type for output operations.
pub type OutputResult<T> = Result<T, OutputError>;

/// Errors that can occur while writing a result.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Csv,
    Json,
    Xml,
}

impl OutputFormat {
    /// Detect the format from the text after the last `.` of a path.
    pub fn from_path(path: &str) -> Option<Self> {
        let (_, extension) = path.rsplit_once('.')?;
        match extension {
            "csv" => Some(OutputFormat::Csv),
            "json" => Some(OutputFormat::Json),
            "xml" => Some(OutputFormat::Xml),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Xml => "xml",
        }
    }

    /// Create the writer for this format.
    pub fn writer(&self, options: &OutputOptions) -> Box<dyn FormatWriter> {
        match self {
            OutputFormat::Csv => Box::new(CsvWriter::new(options.csv_line_ending.clone())),
            OutputFormat::Json => Box::new(JsonWriter::new(options.json_indent)),
            OutputFormat::Xml => Box::new(XmlWriter::new(options.xml_indent)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Tuning shared by the writers.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputOptions {
    pub csv_line_ending: CsvLineEnding,
    pub json_indent: usize,
    pub xml_indent: usize,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            csv_line_ending: CsvLineEnding::Crlf,
            json_indent: 2,
            xml_indent: 2,
        }
    }
}

/// Serializes a finalized result.
pub trait FormatWriter {
    /// Format name (e.g., "csv").
    fn name(&self) -> &'static str;

    /// Write the whole result to `out`.
    fn write(&self, result: &ResultSet, out: &mut dyn Write) -> OutputResult<()>;
}

/// Create (or truncate) `path` and write `result` into it.
///
/// A partially written file is removed when writing fails.
pub fn write_result<P: AsRef<Path>>(
    result: &ResultSet,
    format: OutputFormat,
    path: P,
    options: &OutputOptions,
) -> OutputResult<()> {
    let path = path.as_ref();
    let outcome = write_file(result, format, path, options);
    if outcome.is_err() && path.exists() {
        if let Err(e) = fs::remove_file(path) {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove partial output");
        }
    }
    outcome
}

fn write_file(
    result: &ResultSet,
    format: OutputFormat,
    path: &Path,
    options: &OutputOptions,
) -> OutputResult<()> {
    let mut out = BufWriter::new(File::create(path)?);
    format.writer(options).write(result, &mut out)?;
    out.flush()?;
    Ok(())
}
