//! Report specification validation.
//!
//! ```yaml
//! report:
//!   name: customers
//!   query: select id, name from customers
//!   output: customers.json
//!   connect:
//!     type: sqlite
//!     database: shop.db
//!   report:                     # optional, run once per customer row
//!     name: orders
//!     query: select * from orders where customer_id = {id}
//! ```
//!
//! The root needs `name`, `query`, `output` and `connect`. A subreport only
//! needs `query`; without `connect` it runs on its parent's connection. A
//! nested `report` is kept as a [`SubreportTemplate`] and validated once per
//! parent row, after its placeholders have been substituted.
//!
//! Environment references in `connect` blocks are expanded on the raw
//! document, for the root and every nested level, before any row value is
//! substituted.

use serde_yaml::{Mapping, Value};

use super::template::{self, Fields};
use crate::config::{expand_connect_env, ConnectionConfig, ResolveOptions};
use crate::error::{ReportError, ReportResult};
use crate::output::OutputFormat;

/// Name used in errors when the root report has no usable name.
pub const UNNAMED_ROOT: &str = "<root>";

/// Errors in a report specification.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpecError {
    #[error("at least one report is expected")]
    MissingReport,

    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("{field} must be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    #[error("unable to detect the output format (csv, json, xml) of '{0}'")]
    UnsupportedFormat(String),

    #[error("invalid connect type '{0}' (sqlite, mysql, postgresql)")]
    InvalidConnectType(String),

    #[error("username and/or password missing")]
    MissingCredentials,

    #[error("port without hostname")]
    PortWithoutHostname,

    #[error("invalid port '{0}'")]
    InvalidPort(String),

    #[error("{0}")]
    Environment(String),
}

/// Where the final result is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    /// Path exactly as written in the specification.
    pub path: String,
    pub format: OutputFormat,
}

/// An unvalidated nested report, instantiated once per parent row.
#[derive(Debug, Clone, PartialEq)]
pub struct SubreportTemplate {
    tree: Value,
}

impl SubreportTemplate {
    pub fn new(tree: Value) -> Self {
        Self { tree }
    }

    /// Substitute `fields` into a copy of the template.
    pub fn instantiate(&self, fields: &Fields) -> Value {
        template::substitute(&self.tree, fields)
    }

    pub fn tree(&self) -> &Value {
        &self.tree
    }

    /// Placeholder names used by this level of the template. A nested
    /// `report` is excluded; its placeholders refer to this level's columns.
    pub fn placeholders(&self) -> Vec<String> {
        let Some(map) = self.tree.as_mapping() else {
            return template::placeholders(&self.tree);
        };

        let mut names = Vec::new();
        for (key, value) in map {
            if key.as_str() == Some("report") {
                continue;
            }
            for name in template::placeholders(value) {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }
}

/// A validated report node.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSpec {
    pub name: String,
    pub query: String,
    /// Own connection. `None` on a subreport means "use the parent's".
    pub connect: Option<ConnectionConfig>,
    /// Always present on the root, never on subreports.
    pub output: Option<OutputTarget>,
    pub subreport: Option<SubreportTemplate>,
}

impl ReportSpec {
    /// Validate the root report node.
    pub fn validate_root(tree: &Value, options: &ResolveOptions) -> ReportResult<Self> {
        let expanded;
        let tree = if options.expand_env {
            expanded = expand_env_tree(tree, UNNAMED_ROOT)?;
            &expanded
        } else {
            tree
        };
        let map = as_mapping(tree, UNNAMED_ROOT)?;

        let name = str_field(map, "name", UNNAMED_ROOT)?
            .ok_or_else(|| spec_error(UNNAMED_ROOT, SpecError::MissingField("name")))?;
        let query = str_field(map, "query", &name)?
            .ok_or_else(|| spec_error(&name, SpecError::MissingField("query")))?;

        let path = str_field(map, "output", &name)?
            .ok_or_else(|| spec_error(&name, SpecError::MissingField("output")))?;
        let format = OutputFormat::from_path(&path)
            .ok_or_else(|| spec_error(&name, SpecError::UnsupportedFormat(path.clone())))?;

        let raw_connect = map
            .get("connect")
            .filter(|v| !v.is_null())
            .ok_or_else(|| spec_error(&name, SpecError::MissingField("connect")))?;
        let connect = ConnectionConfig::resolve(raw_connect).map_err(|e| spec_error(&name, e))?;

        let subreport = subreport_field(map, &name)?;

        Ok(Self {
            name,
            query,
            connect: Some(connect),
            output: Some(OutputTarget { path, format }),
            subreport,
        })
    }

    /// Validate a subreport node after substitution.
    ///
    /// `default_name` is used when the node has no `name`. An `output` key
    /// is ignored.
    pub fn validate_subreport(tree: &Value, default_name: &str) -> ReportResult<Self> {
        let map = as_mapping(tree, default_name)?;

        let name = str_field(map, "name", default_name)?.unwrap_or_else(|| default_name.to_string());
        let query = str_field(map, "query", &name)?
            .ok_or_else(|| spec_error(&name, SpecError::MissingField("query")))?;

        let connect = match map.get("connect") {
            None | Some(Value::Null) => None,
            Some(raw) => Some(ConnectionConfig::resolve(raw).map_err(|e| spec_error(&name, e))?),
        };

        let subreport = subreport_field(map, &name)?;

        Ok(Self {
            name,
            query,
            connect,
            output: None,
            subreport,
        })
    }

    /// Placeholder name for this report's unnamed subreport.
    pub fn subreport_default_name(&self) -> String {
        format!("{}.report", self.name)
    }
}

fn spec_error(report: &str, source: SpecError) -> ReportError {
    ReportError::Spec {
        report: report.to_string(),
        source,
    }
}

/// Expand environment references in the `connect` block of `tree` and of
/// every nested `report` below it.
fn expand_env_tree(tree: &Value, default_name: &str) -> ReportResult<Value> {
    let Some(map) = tree.as_mapping() else {
        return Ok(tree.clone());
    };
    let name = match map.get("name") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => default_name.to_string(),
    };

    let mut expanded = map.clone();
    if let Some(raw) = map.get("connect") {
        let connect = expand_connect_env(raw).map_err(|e| spec_error(&name, e))?;
        expanded.insert(Value::from("connect"), connect);
    }
    if let Some(child) = map.get("report") {
        let child = expand_env_tree(child, &format!("{}.report", name))?;
        expanded.insert(Value::from("report"), child);
    }
    Ok(Value::Mapping(expanded))
}

fn as_mapping<'a>(tree: &'a Value, report: &str) -> ReportResult<&'a Mapping> {
    tree.as_mapping().ok_or_else(|| {
        spec_error(
            report,
            SpecError::InvalidField {
                field: "report",
                expected: "a mapping",
            },
        )
    })
}

fn str_field(map: &Mapping, field: &'static str, report: &str) -> ReportResult<Option<String>> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) if field == "name" => Ok(Some(n.to_string())),
        Some(_) => Err(spec_error(
            report,
            SpecError::InvalidField {
                field,
                expected: "a string",
            },
        )),
    }
}

fn subreport_field(map: &Mapping, report: &str) -> ReportResult<Option<SubreportTemplate>> {
    match map.get("report") {
        None | Some(Value::Null) => Ok(None),
        Some(tree @ Value::Mapping(_)) => Ok(Some(SubreportTemplate::new(tree.clone()))),
        Some(_) => Err(spec_error(
            report,
            SpecError::InvalidField {
                field: "report",
                expected: "a mapping",
            },
        )),
    }
}
