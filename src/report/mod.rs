//! Report specifications: loading, validation and placeholder substitution.

mod document;
mod spec;
pub mod template;

pub use document::ReportDocument;
pub use spec::{OutputTarget, ReportSpec, SpecError, SubreportTemplate, UNNAMED_ROOT};
pub use template::{substitute, Fields};
