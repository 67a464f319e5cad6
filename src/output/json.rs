//! JSON writer: an array with one object per row.
//!
//! ```text
//! [
//!   {
//!     "A": 1,
//!     "B": 2
//!   }
//! ]
//! ```
//!
//! Object keys follow column order. NULL and non-finite reals become `null`.

use std::io::Write;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::ser::PrettyFormatter;

use super::{FormatWriter, OutputResult};
use crate::driver::{CellValue, ResultSet};

#[derive(Debug, Clone)]
pub struct JsonWriter {
    indent: usize,
}

impl JsonWriter {
    pub fn new(indent: usize) -> Self {
        Self { indent }
    }
}

impl Default for JsonWriter {
    fn default() -> Self {
        Self::new(2)
    }
}

impl FormatWriter for JsonWriter {
    fn name(&self) -> &'static str {
        "json"
    }

    fn write(&self, result: &ResultSet, out: &mut dyn Write) -> OutputResult<()> {
        let indent = vec![b' '; self.indent];
        let formatter = PrettyFormatter::with_indent(&indent);
        let mut serializer = serde_json::Serializer::with_formatter(out, formatter);
        JsonRows(result).serialize(&mut serializer)?;
        Ok(())
    }
}

struct JsonRows<'a>(&'a ResultSet);

impl Serialize for JsonRows<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.rows.len()))?;
        for row in &self.0.rows {
            seq.serialize_element(&JsonRow {
                columns: &self.0.columns,
                cells: row,
            })?;
        }
        seq.end()
    }
}

struct JsonRow<'a> {
    columns: &'a [String],
    cells: &'a [CellValue],
}

impl Serialize for JsonRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, cell) in self.columns.iter().zip(self.cells) {
            map.serialize_entry(column, &JsonCell(cell))?;
        }
        map.end()
    }
}

struct JsonCell<'a>(&'a CellValue);

impl Serialize for JsonCell<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            CellValue::Null => serializer.serialize_none(),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::Integer(n) => serializer.serialize_i64(*n),
            CellValue::Real(x) if x.is_finite() => serializer.serialize_f64(*x),
            CellValue::Real(_) => serializer.serialize_none(),
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Blob(bytes) => serializer.serialize_str(&String::from_utf8_lossy(bytes)),
        }
    }
}
