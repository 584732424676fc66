//! Context logger backed by `tracing`.
//!
//! Lets an external context forward the engine's informational hooks
//! ("Hydrating module", "Completed hydration") into the same subscriber as
//! everything else, with the metadata kept as one structured field.

use hydrate_engine::{ContextLogger, ExternalContext};
use serde_json::Value;

/// Forwards context-logger calls to `tracing` at `INFO`.
#[derive(Debug, Clone, Default)]
pub struct TracingLogger {
    component: Option<String>,
}

impl TracingLogger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag every event with a component name.
    #[must_use]
    pub fn with_component(component: impl Into<String>) -> Self {
        Self {
            component: Some(component.into()),
        }
    }

    #[must_use]
    pub fn component(&self) -> Option<&str> {
        self.component.as_deref()
    }
}

impl ContextLogger for TracingLogger {
    fn info(&self, message: &str, metadata: &Value) {
        tracing::info!(
            target: "hydrate::context",
            component = self.component.as_deref().unwrap_or("hydrate"),
            metadata = %metadata,
            "{message}"
        );
    }
}

/// Minimal external context that only carries a [`TracingLogger`].
#[derive(Debug, Clone, Default)]
pub struct LoggingContext {
    logger: TracingLogger,
}

impl LoggingContext {
    #[must_use]
    pub fn new(logger: TracingLogger) -> Self {
        Self { logger }
    }
}

impl ExternalContext for LoggingContext {
    fn logger(&self) -> Option<&dyn ContextLogger> {
        Some(&self.logger)
    }
}
