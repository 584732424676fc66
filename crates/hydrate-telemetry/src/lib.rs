//! # Hydrate Telemetry
//!
//! Logging for applications built on the hydration engine.
//!
//! ## Components
//!
//! - [`TelemetryConfig`]: subscriber settings read from the environment
//! - [`init_tracing`]: installs a `tracing-subscriber` registry (text or JSON)
//! - [`TracingLogger`]: a context logger that forwards to `tracing`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hydrate_telemetry::{init_tracing, TelemetryConfig};
//!
//! init_tracing(&TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `HYDRATE_LOG_LEVEL` | `info` | Filter directive, falls back to `RUST_LOG` |
//! | `HYDRATE_JSON_LOGS` | `false` | Emit JSON lines |
//! | `HYDRATE_LOG_TARGETS` | `true` | Include event targets |

mod config;
mod logger;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use logger::{LoggingContext, TracingLogger};
pub use tracing_setup::{env_filter, init_tracing};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Failed to install tracing subscriber: {0}")]
    Init(String),
}
