//! # Engine Configuration
//!
//! Policies that decide the behaviour the data model leaves open.
//!
//! ## Environment Variables
//!
//! | Variable | Values | Default |
//! |----------|--------|---------|
//! | `HYDRATE_COLLISIONS` | `last-write-wins`, `reject` | `last-write-wins` |
//! | `HYDRATE_TEARDOWN` | `abort`, `continue` | `abort` |
//! | `HYDRATE_STOP_TIMEOUT_MS` | milliseconds, `> 0` | unset (no deadline) |

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{HydrationError, HydrationResult};

/// What happens when merged siblings produce the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionPolicy {
    /// The sibling that comes last in traversal order owns the key.
    #[default]
    LastWriteWins,
    /// Fail hydration with `DuplicateKey`.
    Reject,
}

impl FromStr for CollisionPolicy {
    type Err = HydrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "last-write-wins" => Ok(Self::LastWriteWins),
            "reject" => Ok(Self::Reject),
            other => Err(HydrationError::Config(format!(
                "Unknown collision policy `{other}` (expected last-write-wins or reject)"
            ))),
        }
    }
}

impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LastWriteWins => f.write_str("last-write-wins"),
            Self::Reject => f.write_str("reject"),
        }
    }
}

/// What happens when a `stop` fails during dehydration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TeardownPolicy {
    /// Stop at the first failure; later objects are not stopped.
    #[default]
    Abort,
    /// Stop every object, then report all failures together.
    Continue,
}

impl FromStr for TeardownPolicy {
    type Err = HydrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "continue" => Ok(Self::Continue),
            other => Err(HydrationError::Config(format!(
                "Unknown teardown policy `{other}` (expected abort or continue)"
            ))),
        }
    }
}

impl fmt::Display for TeardownPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abort => f.write_str("abort"),
            Self::Continue => f.write_str("continue"),
        }
    }
}

/// Engine settings shared by one `Hydrator`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HydrationConfig {
    pub collisions: CollisionPolicy,
    pub teardown: TeardownPolicy,
    /// Per-object deadline for `stop`, in milliseconds.
    pub stop_timeout_ms: Option<u64>,
}

impl HydrationConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> HydrationResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> HydrationResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("HYDRATE_COLLISIONS") {
            config.collisions = value.parse()?;
        }
        if let Some(value) = lookup("HYDRATE_TEARDOWN") {
            config.teardown = value.parse()?;
        }
        if let Some(value) = lookup("HYDRATE_STOP_TIMEOUT_MS") {
            let millis = value.trim().parse::<u64>().map_err(|e| {
                HydrationError::Config(format!("Invalid HYDRATE_STOP_TIMEOUT_MS `{value}`: {e}"))
            })?;
            config.stop_timeout_ms = Some(millis);
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse settings from a JSON document.
    pub fn from_json_str(source: &str) -> HydrationResult<Self> {
        let config: Self = serde_json::from_str(source)
            .map_err(|e| HydrationError::Config(format!("Invalid engine configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> HydrationResult<()> {
        if self.stop_timeout_ms == Some(0) {
            return Err(HydrationError::Config(
                "stop_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Builder-style setter for the collision policy.
    #[must_use]
    pub fn with_collisions(mut self, collisions: CollisionPolicy) -> Self {
        self.collisions = collisions;
        self
    }

    /// Builder-style setter for the teardown policy.
    #[must_use]
    pub fn with_teardown(mut self, teardown: TeardownPolicy) -> Self {
        self.teardown = teardown;
        self
    }

    /// Builder-style setter for the stop deadline.
    #[must_use]
    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    #[must_use]
    pub fn stop_timeout(&self) -> Option<Duration> {
        self.stop_timeout_ms.map(Duration::from_millis)
    }
}
