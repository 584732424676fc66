//! # External Context
//!
//! The caller-owned value handed to every constructor, `start` and `stop`.
//!
//! The engine treats it as opaque. The only thing it ever asks of the context
//! is an optional logging capability; contexts without one are fine.

use serde_json::Value;

/// Optional logging collaborator exposed by an external context.
pub trait ContextLogger: Send + Sync {
    /// Record an informational message with structured metadata.
    fn info(&self, message: &str, metadata: &Value);
}

/// Caller-supplied context shared by every module of one hydration.
pub trait ExternalContext: Send + Sync + 'static {
    /// Logging capability, if the context carries one.
    fn logger(&self) -> Option<&dyn ContextLogger> {
        None
    }
}

impl ExternalContext for () {}

/// Forward a message to the context logger when one is present.
pub(crate) fn log_info<C: ExternalContext>(ctx: &C, message: &str, metadata: &Value) {
    if let Some(logger) = ctx.logger() {
        logger.info(message, metadata);
    }
}
