//! XML writer.
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <result>
//!   <row>
//!     <A>1</A>
//!   </row>
//! </result>
//! ```

use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::{FormatWriter, OutputResult};
use crate::driver::ResultSet;

const ROOT_ELEMENT: &str = "result";
const ROW_ELEMENT: &str = "row";

#[derive(Debug, Clone)]
pub struct XmlWriter {
    indent: usize,
}

impl XmlWriter {
    pub fn new(indent: usize) -> Self {
        Self { indent }
    }
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self::new(2)
    }
}

impl FormatWriter for XmlWriter {
    fn name(&self) -> &'static str {
        "xml"
    }

    fn write(&self, result: &ResultSet, out: &mut dyn Write) -> OutputResult<()> {
        let names: Vec<String> = result.columns.iter().map(|c| element_name(c)).collect();
        let mut writer = Writer::new_with_indent(out, b' ', self.indent);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::Start(BytesStart::new(ROOT_ELEMENT)))?;
        for row in &result.rows {
            writer.write_event(Event::Start(BytesStart::new(ROW_ELEMENT)))?;
            for (name, cell) in names.iter().zip(row) {
                let text = cell.to_output_text();
                writer.write_event(Event::Start(BytesStart::new(name.as_str())))?;
                writer.write_event(Event::Text(BytesText::new(&text)))?;
                writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
            }
            writer.write_event(Event::End(BytesEnd::new(ROW_ELEMENT)))?;
        }
        writer.write_event(Event::End(BytesEnd::new(ROOT_ELEMENT)))?;
        writer.get_mut().write_all(b"\n")?;
        Ok(())
    }
}

/// Turn a column name into a valid XML element name.
///
/// Characters outside `[A-Za-z0-9_.-]` (Unicode letters and digits are kept)
/// become `_`. A name that does not start with a letter or `_` gets a `_`
/// prefix.
pub fn element_name(column: &str) -> String {
    let mut name: String = column
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    match name.chars().next() {
        Some(first) if first.is_alphabetic() || first == '_' => name,
        _ => {
            name.insert(0, '_');
            name
        }
    }
}
