use std::fmt;
use std::sync::Arc;

use crate::error::{ErrorKind, FormatError};

use super::unified::SourceFormat;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (the parse failed on its input).
    Error,
    /// Critical error (the input could not be read, or the failure is unclassified).
    Critical,
}

impl Severity {
    /// Severity of a failed parse.
    pub fn for_error(error: &FormatError) -> Self {
        match error.kind() {
            ErrorKind::CsvIo | ErrorKind::Unknown => Self::Critical,
            _ => Self::Error,
        }
    }
}

/// Context about a parse attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseContext {
    /// Logical label of the source.
    pub source_name: String,
    /// Format used for parsing.
    pub format: SourceFormat,
}

/// Minimal stats reported on a successful parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseStats {
    /// Number of emitted rows.
    pub rows: usize,
    /// Number of columns in the header.
    pub columns: usize,
}

/// Observer interface for parse outcomes.
///
/// Implementors can record metrics, write audit logs, or trigger alerts.
pub trait ParseObserver: Send + Sync {
    /// Called when a parse succeeds.
    fn on_success(&self, _ctx: &ParseContext, _stats: ParseStats) {}

    /// Called when a parse fails.
    fn on_failure(&self, _ctx: &ParseContext, _severity: Severity, _error: &FormatError) {}

    /// Called when a failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &ParseContext, severity: Severity, error: &FormatError) {
        self.on_failure(ctx, severity, error)
    }
}

/// Forwards every callback to each registered observer, in registration order.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn ParseObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn ParseObserver>>) -> Self {
        Self { observers }
    }

    /// Register one more observer.
    pub fn with(mut self, observer: Arc<dyn ParseObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    fn each(&self, f: impl Fn(&dyn ParseObserver)) {
        self.observers.iter().for_each(|o| f(o.as_ref()));
    }
}

impl FromIterator<Arc<dyn ParseObserver>> for CompositeObserver {
    fn from_iter<I: IntoIterator<Item = Arc<dyn ParseObserver>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompositeObserver({} observers)", self.observers.len())
    }
}

impl ParseObserver for CompositeObserver {
    fn on_success(&self, ctx: &ParseContext, stats: ParseStats) {
        self.each(|o| o.on_success(ctx, stats));
    }

    fn on_failure(&self, ctx: &ParseContext, severity: Severity, error: &FormatError) {
        self.each(|o| o.on_failure(ctx, severity, error));
    }

    fn on_alert(&self, ctx: &ParseContext, severity: Severity, error: &FormatError) {
        self.each(|o| o.on_alert(ctx, severity, error));
    }
}

/// Reports parse outcomes as `tracing` events under the `tabular_ingest::audit` target.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl ParseObserver for TracingObserver {
    fn on_success(&self, ctx: &ParseContext, stats: ParseStats) {
        tracing::info!(
            target: "tabular_ingest::audit",
            source = %ctx.source_name,
            format = ?ctx.format,
            rows = stats.rows,
            columns = stats.columns,
            "parse ok"
        );
    }

    fn on_failure(&self, ctx: &ParseContext, severity: Severity, error: &FormatError) {
        tracing::warn!(
            target: "tabular_ingest::audit",
            source = %ctx.source_name,
            format = ?ctx.format,
            ?severity,
            code = error.code(),
            error = %error,
            "parse failed"
        );
    }

    fn on_alert(&self, ctx: &ParseContext, severity: Severity, error: &FormatError) {
        tracing::error!(
            target: "tabular_ingest::audit",
            source = %ctx.source_name,
            format = ?ctx.format,
            ?severity,
            code = error.code(),
            error = %error,
            "parse alert"
        );
    }
}
