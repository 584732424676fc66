//! # Hydration Errors
//!
//! One error type for every failure the engine can surface.
//!
//! ## Taxonomy
//!
//! | Kind | Variants | When |
//! |------|----------|------|
//! | Configuration | `InvalidNode`, `InvalidFactory`, `DuplicateKey`, `Config` | Malformed tree or engine settings |
//! | Module | `Construct`, `Start`, `Factory` | Raised by caller-supplied module code |
//! | Teardown | `Stop`, `StopTimeout`, `Teardown` | Raised while dehydrating |
//!
//! Configuration and module errors travel through the same join barrier, so a
//! caller awaiting `hydrate` observes all of them in one place.
//!
//! The type is `Clone`: a pending placeholder may be awaited by several modules
//! at once and every awaiting party receives the same failure.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Result alias used throughout the engine.
pub type HydrationResult<T> = Result<T, HydrationError>;

/// Errors from hydration and dehydration.
#[derive(Debug, Error, Clone)]
pub enum HydrationError {
    /// A configuration node is neither a sequence, a mapping nor a module descriptor.
    #[error("Invalid configuration encountered: {rendered}")]
    InvalidNode { rendered: String },

    /// The array form of a module reference does not start with a function.
    #[error(
        "When using an array for the module parameter, the first element must be a function ({name})"
    )]
    InvalidFactory { name: String },

    /// Two merged siblings wrote the same key and collisions are rejected.
    #[error("Duplicate configuration key `{key}` across merged siblings")]
    DuplicateKey { key: String },

    /// A module constructor failed.
    #[error("Module `{name}` failed to construct: {cause}")]
    Construct {
        name: String,
        cause: Arc<anyhow::Error>,
    },

    /// A module `start` failed.
    #[error("Module `{name}` failed to start: {cause}")]
    Start {
        name: String,
        cause: Arc<anyhow::Error>,
    },

    /// A factory function from the array form failed.
    #[error("Factory for `{name}` failed: {cause}")]
    Factory {
        name: String,
        cause: Arc<anyhow::Error>,
    },

    /// A module `stop` failed.
    #[error("Module `{name}` (position {position}) failed to stop: {cause}")]
    Stop {
        name: String,
        position: usize,
        cause: Arc<anyhow::Error>,
    },

    /// A module `stop` did not finish before the configured deadline.
    #[error("Module `{name}` did not stop within {timeout:?}")]
    StopTimeout { name: String, timeout: Duration },

    /// Teardown continued past failures; every failure is listed in list order.
    #[error("Teardown finished with {} failed stop(s)", .failures.len())]
    Teardown { failures: Vec<HydrationError> },

    /// Engine settings could not be loaded or are invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl HydrationError {
    pub(crate) fn construct(name: &str, source: anyhow::Error) -> Self {
        Self::Construct {
            name: name.to_string(),
            cause: Arc::new(source),
        }
    }

    pub(crate) fn start(name: &str, source: anyhow::Error) -> Self {
        Self::Start {
            name: name.to_string(),
            cause: Arc::new(source),
        }
    }

    pub(crate) fn factory(name: &str, source: anyhow::Error) -> Self {
        Self::Factory {
            name: name.to_string(),
            cause: Arc::new(source),
        }
    }

    /// The original module-originated error, if this failure came from module code.
    ///
    /// Useful for downcasting to the concrete error type a module raised.
    #[must_use]
    pub fn module_error(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Construct { cause, .. }
            | Self::Start { cause, .. }
            | Self::Factory { cause, .. }
            | Self::Stop { cause, .. } => Some(cause.as_ref()),
            _ => None,
        }
    }

    /// Whether this is a structural configuration error raised by the engine itself.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidNode { .. }
                | Self::InvalidFactory { .. }
                | Self::DuplicateKey { .. }
                | Self::Config(_)
        )
    }
}
