use crate::{DbValue, truncate_long};

/// One statement executed by the orchestrator.
#[derive(Debug, Clone, Copy)]
pub struct TraceEvent<'a> {
    /// Orchestrator operation, like `insert` or `select_by_id`.
    pub operation: &'static str,
    pub table: &'a str,
    pub sql: &'a str,
    pub params: &'a [DbValue],
}

/// Receiver of the statements executed by an orchestrator.
pub trait TraceSink: Send + Sync {
    fn trace(&self, event: &TraceEvent<'_>);
}

/// Discards every event.
#[derive(Default, Debug, Clone, Copy)]
pub struct NoTrace;

impl TraceSink for NoTrace {
    fn trace(&self, _event: &TraceEvent<'_>) {}
}

/// Forwards events to the `log` facade.
#[derive(Debug, Clone, Copy)]
pub struct LogTrace {
    pub level: log::Level,
}

impl Default for LogTrace {
    fn default() -> Self {
        Self {
            level: log::Level::Debug,
        }
    }
}

impl TraceSink for LogTrace {
    fn trace(&self, event: &TraceEvent<'_>) {
        log::log!(
            self.level,
            "{} on `{}` ({} params): {}",
            event.operation,
            event.table,
            event.params.len(),
            truncate_long!(event.sql)
        );
        if log::log_enabled!(log::Level::Trace) {
            for (i, v) in event.params.iter().enumerate() {
                log::trace!("  ${} = {v}", i + 1);
            }
        }
    }
}
