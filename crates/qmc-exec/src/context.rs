//! Explicit run context: configuration plus a diagnostics sink.

use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::config::SimConfig;

/// Receiver of caller-visible diagnostics such as strategy downgrades and
/// lenient gate substitutions.
pub trait Diagnostics: Send + Sync {
    fn warn(&self, message: &str);
}

/// Forwards diagnostics to `tracing::warn!`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn warn(&self, message: &str) {
        warn!(target: "qmc::diagnostics", "{message}");
    }
}

/// Discards diagnostics.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDiagnostics;

impl Diagnostics for NoopDiagnostics {
    fn warn(&self, _message: &str) {}
}

/// Keeps diagnostics in memory for inspection.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    messages: Mutex<Vec<String>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages received so far, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn warn(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}

/// Configuration and diagnostics handed to a coordinator.
#[derive(Clone)]
pub struct Context {
    pub config: SimConfig,
    diagnostics: Arc<dyn Diagnostics>,
}

impl Context {
    /// Context that reports diagnostics through `tracing`.
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn diagnostics(&self) -> &dyn Diagnostics {
        self.diagnostics.as_ref()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_keeps_order() {
        let sink = Arc::new(RecordingDiagnostics::new());
        let context = Context::default().with_diagnostics(sink.clone());
        context.diagnostics().warn("first");
        context.diagnostics().warn("second");
        assert_eq!(sink.messages(), vec!["first", "second"]);
    }

    #[test]
    fn test_noop_and_tracing_accept_messages() {
        NoopDiagnostics.warn("ignored");
        TracingDiagnostics.warn("logged");
    }
}
