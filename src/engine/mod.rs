//! Report execution.
//!
//! A [`Report`] moves through a small state machine:
//!
//! ```text
//! Uninitialized ──parse──► Parsed ──connect──► Connected ──execute──► Uninitialized
//!                            ▲                                │
//!                            └────────── on failure ──────────┘
//! ```
//!
//! Executing runs the root query on the root connection. When the root has
//! a nested report, that report is instantiated once per result row:
//!
//! ```text
//! parent rows ──► Fields ──► substitute(template) ──► validate ──► query
//!                                                                   │
//!            result = first iteration's columns + all rows, in order ◄┘
//! ```
//!
//! A subreport with its own `connect` opens a connection for that single
//! iteration; without one it runs on its parent's connection. Every
//! connection is owned by a guard and closed on all exit paths.

mod log;

pub use log::{ExecutionLog, TracingLog};

use std::fmt;
use std::path::Path;
use std::rc::Rc;

use serde_yaml::Value;

use crate::config::{ConnectionConfig, ResolveOptions};
use crate::driver::{Connection, DriverError, DriverRegistry, DriverResult, ResultSet};
use crate::error::{ReportError, ReportResult};
use crate::output::{self, OutputFormat, OutputOptions};
use crate::report::{Fields, ReportDocument, ReportSpec, SpecError, SubreportTemplate, UNNAMED_ROOT};

// ============================================================================
// Status
// ============================================================================

/// Lifecycle state of a [`Report`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ExecutionStatus {
    #[default]
    Uninitialized,
    Parsed,
    Connected,
    Executing,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Uninitialized => "uninitialized",
            ExecutionStatus::Parsed => "parsed",
            ExecutionStatus::Connected => "connected",
            ExecutionStatus::Executing => "executing",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a successful [`Report::execute`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionSummary {
    pub report: String,
    pub path: String,
    pub format: OutputFormat,
    pub columns: usize,
    pub rows: usize,
}

// ============================================================================
// Connection guard
// ============================================================================

/// Owns a live connection and closes it when dropped.
struct ConnectionGuard {
    report: String,
    conn: Option<Box<dyn Connection>>,
    log: Rc<dyn ExecutionLog>,
}

impl ConnectionGuard {
    fn query(&mut self, sql: &str) -> DriverResult<ResultSet> {
        match self.conn.as_mut() {
            Some(conn) => conn.query(sql),
            None => Err(DriverError::Other("connection already closed".to_string())),
        }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            match conn.close() {
                Ok(()) => self.log.debug(&self.report, "connection closed"),
                Err(e) => self
                    .log
                    .error(&self.report, &format!("failed to close connection: {}", e)),
            }
        }
    }
}

// ============================================================================
// Report
// ============================================================================

/// One report document and its execution state.
pub struct Report {
    document: ReportDocument,
    spec: Option<ReportSpec>,
    status: ExecutionStatus,
    registry: DriverRegistry,
    root: Option<ConnectionGuard>,
    log: Rc<dyn ExecutionLog>,
    output_options: OutputOptions,
    resolve_options: ResolveOptions,
}

impl Report {
    /// A report over an already-loaded document, using the builtin drivers.
    pub fn new(document: ReportDocument) -> Self {
        Self {
            document,
            spec: None,
            status: ExecutionStatus::Uninitialized,
            registry: DriverRegistry::builtin(),
            root: None,
            log: Rc::new(TracingLog),
            output_options: OutputOptions::default(),
            resolve_options: ResolveOptions::default(),
        }
    }

    /// Load a report from a YAML file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> ReportResult<Self> {
        ReportDocument::from_path(path).map(Self::new)
    }

    /// Load a report from YAML text.
    pub fn from_yaml(source: &str) -> ReportResult<Self> {
        ReportDocument::from_yaml(source).map(Self::new)
    }

    pub fn with_registry(mut self, registry: DriverRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_log(mut self, log: impl ExecutionLog + 'static) -> Self {
        self.log = Rc::new(log);
        self
    }

    pub fn with_output_options(mut self, options: OutputOptions) -> Self {
        self.output_options = options;
        self
    }

    pub fn with_resolve_options(mut self, options: ResolveOptions) -> Self {
        self.resolve_options = options;
        self
    }

    pub fn status(&self) -> ExecutionStatus {
        self.status
    }

    /// The validated root report, from `parse` until the report finishes.
    pub fn spec(&self) -> Option<&ReportSpec> {
        match self.status {
            ExecutionStatus::Uninitialized => None,
            _ => self.spec.as_ref(),
        }
    }

    /// Output format, while parsed.
    pub fn format(&self) -> Option<OutputFormat> {
        self.output_target().map(|target| target.format)
    }

    /// Output path as written in the document, while parsed.
    pub fn output(&self) -> Option<&str> {
        self.output_target().map(|target| target.path.as_str())
    }

    fn output_target(&self) -> Option<&crate::report::OutputTarget> {
        self.spec().and_then(|spec| spec.output.as_ref())
    }

    /// Validate the root report.
    pub fn parse(&mut self) -> ReportResult<()> {
        if !matches!(
            self.status,
            ExecutionStatus::Uninitialized | ExecutionStatus::Parsed
        ) {
            return self.logged(Err(self.invalid_state("parse")));
        }

        self.spec = None;
        self.status = ExecutionStatus::Uninitialized;

        let parsed = self
            .document
            .root()
            .and_then(|root| ReportSpec::validate_root(root, &self.resolve_options));
        let spec = self.logged(parsed)?;

        self.log.debug(&spec.name, "report parsed");
        self.spec = Some(spec);
        self.status = ExecutionStatus::Parsed;
        Ok(())
    }

    /// Open the root connection.
    pub fn connect(&mut self) -> ReportResult<()> {
        let opened = self.open_root();
        let guard = self.logged(opened)?;
        self.root = Some(guard);
        self.status = ExecutionStatus::Connected;
        Ok(())
    }

    fn open_root(&self) -> ReportResult<ConnectionGuard> {
        self.require(ExecutionStatus::Parsed, "connect")?;
        let spec = self.parsed_spec("connect")?;
        let config = spec
            .connect
            .as_ref()
            .ok_or_else(|| spec_error(&spec.name, SpecError::MissingField("connect")))?;
        self.open(&spec.name, config)
    }

    /// Run the report and return its result without writing it.
    ///
    /// The root connection is closed afterwards, as with [`execute`](Self::execute).
    pub fn evaluate(&mut self) -> ReportResult<ResultSet> {
        let root = self.take_root("evaluate")?;
        let outcome = self.run(root);
        self.finish(outcome)
    }

    /// Run the report and write its result to the output file.
    pub fn execute(&mut self) -> ReportResult<ExecutionSummary> {
        let root = self.take_root("execute")?;
        let outcome = self.run(root).and_then(|result| self.write(&result));
        self.finish(outcome)
    }

    fn take_root(&mut self, operation: &'static str) -> ReportResult<ConnectionGuard> {
        let checked = self.require(ExecutionStatus::Connected, operation);
        self.logged(checked)?;
        match self.root.take() {
            Some(root) => {
                self.status = ExecutionStatus::Executing;
                Ok(root)
            }
            None => self.logged(Err(self.invalid_state(operation))),
        }
    }

    fn run(&self, mut root: ConnectionGuard) -> ReportResult<ResultSet> {
        let spec = self.parsed_spec("execute")?;
        let result = self.evaluate_node(spec, &mut root)?;
        drop(root);
        self.log.info(
            &spec.name,
            &format!("report produced {} rows", result.len()),
        );
        Ok(result)
    }

    fn write(&self, result: &ResultSet) -> ReportResult<ExecutionSummary> {
        let spec = self.parsed_spec("execute")?;
        let target = spec
            .output
            .as_ref()
            .ok_or_else(|| spec_error(&spec.name, SpecError::MissingField("output")))?;

        output::write_result(result, target.format, &target.path, &self.output_options).map_err(
            |source| ReportError::Output {
                report: spec.name.clone(),
                path: target.path.clone(),
                source,
            },
        )?;
        self.log.info(
            &spec.name,
            &format!("wrote {} rows to {}", result.len(), target.path),
        );

        Ok(ExecutionSummary {
            report: spec.name.clone(),
            path: target.path.clone(),
            format: target.format,
            columns: result.columns.len(),
            rows: result.len(),
        })
    }

    fn finish<T>(&mut self, outcome: ReportResult<T>) -> ReportResult<T> {
        self.status = if outcome.is_ok() {
            ExecutionStatus::Uninitialized
        } else {
            ExecutionStatus::Parsed
        };
        self.logged(outcome)
    }

    // ------------------------------------------------------------------------
    // Recursive evaluation
    // ------------------------------------------------------------------------

    /// Run one report node on `conn`, expanding its nested report if any.
    fn evaluate_node(
        &self,
        spec: &ReportSpec,
        conn: &mut ConnectionGuard,
    ) -> ReportResult<ResultSet> {
        self.log.debug(&spec.name, &format!("running query: {}", spec.query));
        let result = conn.query(&spec.query).map_err(|source| ReportError::Query {
            report: spec.name.clone(),
            source,
        })?;
        self.log
            .debug(&spec.name, &format!("query returned {} rows", result.len()));

        match &spec.subreport {
            Some(template) => self.expand(spec, template, result, conn),
            None => Ok(result),
        }
    }

    /// Run `template` once per row of `parent` and concatenate the results.
    fn expand(
        &self,
        spec: &ReportSpec,
        template: &SubreportTemplate,
        parent: ResultSet,
        conn: &mut ConnectionGuard,
    ) -> ReportResult<ResultSet> {
        let default_name = spec.subreport_default_name();
        if !parent.is_empty() {
            for name in template.placeholders() {
                if !parent.columns.contains(&name) {
                    self.log.warn(
                        &spec.name,
                        &format!("placeholder {{{}}} matches no column and is left as is", name),
                    );
                }
            }
        }

        let mut aggregated = ResultSet::default();
        for (index, row) in parent.rows.iter().enumerate() {
            let fields = Fields::from_row(&parent.columns, row);
            let tree = template.instantiate(&fields);
            let child = ReportSpec::validate_subreport(&tree, &default_name)?;
            if index == 0 && tree.get("output").is_some() {
                self.log.warn(&child.name, "output is ignored on subreports");
            }

            let ResultSet { columns, rows } = match &child.connect {
                Some(config) => {
                    let mut own = self.open(&child.name, config)?;
                    self.evaluate_node(&child, &mut own)?
                }
                None => self.evaluate_node(&child, conn)?,
            };

            if index == 0 {
                aggregated.columns = columns;
            } else if columns != aggregated.columns {
                self.log.warn(
                    &child.name,
                    &format!(
                        "iteration {} returned columns {:?}, expected {:?}",
                        index + 1,
                        columns,
                        aggregated.columns
                    ),
                );
            }
            aggregated.rows.extend(rows);
        }

        Ok(aggregated)
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    fn open(&self, report: &str, config: &ConnectionConfig) -> ReportResult<ConnectionGuard> {
        let driver = self
            .registry
            .get(config.kind)
            .ok_or_else(|| ReportError::DriverUnavailable {
                report: report.to_string(),
                kind: config.kind,
            })?;

        self.log.debug(report, &format!("connecting to {}", config));
        let conn = driver.open(config).map_err(|source| ReportError::Connection {
            report: report.to_string(),
            target: config.to_string(),
            source,
        })?;

        Ok(ConnectionGuard {
            report: report.to_string(),
            conn: Some(conn),
            log: Rc::clone(&self.log),
        })
    }

    fn require(&self, expected: ExecutionStatus, operation: &'static str) -> ReportResult<()> {
        if self.status == expected {
            Ok(())
        } else {
            Err(self.invalid_state(operation))
        }
    }

    fn parsed_spec(&self, operation: &'static str) -> ReportResult<&ReportSpec> {
        self.spec
            .as_ref()
            .ok_or_else(|| self.invalid_state(operation))
    }

    fn invalid_state(&self, operation: &'static str) -> ReportError {
        ReportError::InvalidState {
            report: self.label(),
            operation,
            status: self.status,
        }
    }

    /// Best available name for messages about this report.
    fn label(&self) -> String {
        if let Some(spec) = &self.spec {
            return spec.name.clone();
        }
        self.document
            .root()
            .ok()
            .and_then(|root| root.get("name"))
            .and_then(Value::as_str)
            .unwrap_or(UNNAMED_ROOT)
            .to_string()
    }

    fn logged<T>(&self, outcome: ReportResult<T>) -> ReportResult<T> {
        if let Err(e) = &outcome {
            let label = self.label();
            self.log
                .error(e.report_name().unwrap_or(&label), &e.to_string());
        }
        outcome
    }
}

fn spec_error(report: &str, source: SpecError) -> ReportError {
    ReportError::Spec {
        report: report.to_string(),
        source,
    }
}

impl fmt::Debug for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Report")
            .field("spec", &self.spec)
            .field("status", &self.status)
            .field("registry", &self.registry)
            .field("connected", &self.root.is_some())
            .finish()
    }
}
