//! Loading report documents from YAML.

use std::fs;
use std::path::Path;

use serde_yaml::Value;

use super::spec::{SpecError, UNNAMED_ROOT};
use crate::error::{ReportError, ReportResult};

/// A parsed report document: the whole YAML tree, with the root report
/// under the top-level `report` key.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    tree: Value,
}

impl ReportDocument {
    /// Wrap an already-parsed configuration tree.
    pub fn new(tree: Value) -> Self {
        Self { tree }
    }

    /// Parse a document from YAML text.
    pub fn from_yaml(source: &str) -> ReportResult<Self> {
        Self::parse(source, "<string>")
    }

    /// Read and parse a YAML file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> ReportResult<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ReportError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&source, &path.display().to_string())
    }

    fn parse(source: &str, origin: &str) -> ReportResult<Self> {
        let tree = serde_yaml::from_str(source).map_err(|source| ReportError::Document {
            origin: origin.to_string(),
            source,
        })?;
        Ok(Self { tree })
    }

    /// The root report node.
    pub fn root(&self) -> ReportResult<&Value> {
        self.tree
            .as_mapping()
            .and_then(|map| map.get("report"))
            .filter(|v| !v.is_null())
            .ok_or_else(|| ReportError::Spec {
                report: UNNAMED_ROOT.to_string(),
                source: SpecError::MissingReport,
            })
    }

    pub fn tree(&self) -> &Value {
        &self.tree
    }
}
