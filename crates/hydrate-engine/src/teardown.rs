//! # Teardown
//!
//! Sequential `stop` over the flat object list.
//!
//! Unlike hydration, nothing here overlaps: each `stop` is awaited before the
//! next one begins, in list (construction) order. Objects without a `stop`
//! phase are skipped.
//!
//! A stop deadline is enforced with the Tokio timer, so it needs a Tokio
//! runtime; without one, teardown fails with a configuration error before
//! anything is stopped.

use std::time::Duration;

use tracing::{debug, warn};

use crate::config::{HydrationConfig, TeardownPolicy};
use crate::context::ExternalContext;
use crate::errors::{HydrationError, HydrationResult};
use crate::module::Instance;

pub(crate) async fn stop_all<C: ExternalContext>(
    ctx: &C,
    objects: &[Instance<C>],
    config: &HydrationConfig,
) -> HydrationResult<()> {
    let timeout = config.stop_timeout();
    if timeout.is_some() && tokio::runtime::Handle::try_current().is_err() {
        return Err(HydrationError::Config(
            "stop_timeout_ms requires a Tokio runtime".to_string(),
        ));
    }

    let mut failures = Vec::new();

    for (position, instance) in objects.iter().enumerate() {
        let Err(e) = stop_one(ctx, instance, position, timeout).await else {
            continue;
        };
        match config.teardown {
            TeardownPolicy::Abort => return Err(e),
            TeardownPolicy::Continue => {
                warn!(module = instance.name(), position, error = %e, "Stop failed, continuing");
                failures.push(e);
            }
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(HydrationError::Teardown { failures })
    }
}

async fn stop_one<C: ExternalContext>(
    ctx: &C,
    instance: &Instance<C>,
    position: usize,
    timeout: Option<Duration>,
) -> HydrationResult<()> {
    let Some(stopper) = instance.stopper() else {
        return Ok(());
    };
    debug!(module = instance.name(), position, "Stopping module");

    let outcome = match timeout {
        Some(limit) => tokio::time::timeout(limit, stopper.stop(ctx))
            .await
            .map_err(|_| HydrationError::StopTimeout {
                name: instance.name().to_string(),
                timeout: limit,
            })?,
        None => stopper.stop(ctx).await,
    };

    outcome.map_err(|e| HydrationError::Stop {
        name: instance.name().to_string(),
        position,
        cause: std::sync::Arc::new(e),
    })
}
