//! Progress reporting for report execution.

/// Receives the engine's progress and failure messages, tagged with the
/// name of the report they concern.
pub trait ExecutionLog {
    fn debug(&self, report: &str, message: &str);
    fn info(&self, report: &str, message: &str);
    fn warn(&self, report: &str, message: &str);
    fn error(&self, report: &str, message: &str);
}

/// Forwards every message to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl ExecutionLog for TracingLog {
    fn debug(&self, report: &str, message: &str) {
        tracing::debug!(report = %report, "{}", message);
    }

    fn info(&self, report: &str, message: &str) {
        tracing::info!(report = %report, "{}", message);
    }

    fn warn(&self, report: &str, message: &str) {
        tracing::warn!(report = %report, "{}", message);
    }

    fn error(&self, report: &str, message: &str) {
        tracing::error!(report = %report, "{}", message);
    }
}
