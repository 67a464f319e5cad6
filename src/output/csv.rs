//! CSV writer: header line, then one record per row, RFC 4180 quoting.

use std::io::Write;

use serde::{Deserialize, Serialize};

use super::{FormatWriter, OutputResult};
use crate::driver::{CellValue, ResultSet};

/// Record terminator.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CsvLineEnding {
    /// `\r\n`, the RFC 4180 terminator
    #[default]
    Crlf,
    /// `\n`
    Lf,
}

impl CsvLineEnding {
    fn terminator(&self) -> csv::Terminator {
        match self {
            CsvLineEnding::Crlf => csv::Terminator::CRLF,
            CsvLineEnding::Lf => csv::Terminator::Any(b'\n'),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CsvWriter {
    line_ending: CsvLineEnding,
}

impl CsvWriter {
    pub fn new(line_ending: CsvLineEnding) -> Self {
        Self { line_ending }
    }
}

impl FormatWriter for CsvWriter {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn write(&self, result: &ResultSet, out: &mut dyn Write) -> OutputResult<()> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(self.line_ending.terminator())
            .flexible(true)
            .from_writer(out);

        if !result.columns.is_empty() {
            writer.write_record(&result.columns)?;
        }
        for row in &result.rows {
            writer.write_record(row.iter().map(CellValue::to_output_text))?;
        }
        writer.flush()?;
        Ok(())
    }
}
