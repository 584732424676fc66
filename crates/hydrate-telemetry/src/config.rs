//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for the process-wide `tracing` subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Filter directive (trace, debug, info, warn, error, or a full `EnvFilter` string)
    pub log_level: String,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// Whether to print the event target (module path)
    pub with_targets: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            with_targets: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `HYDRATE_LOG_LEVEL` or `RUST_LOG`: Filter directive (default: info)
    /// - `HYDRATE_JSON_LOGS`: Enable JSON logs (default: false)
    /// - `HYDRATE_LOG_TARGETS`: Print event targets (default: true)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`TelemetryConfig::from_env`], reading through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            log_level: lookup("HYDRATE_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),

            json_logs: lookup("HYDRATE_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(defaults.json_logs),

            with_targets: lookup("HYDRATE_LOG_TARGETS")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.with_targets),
        }
    }
}
