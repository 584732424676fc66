//! Join barrier: the single completion signal for one hydration.

use futures::future::{self, BoxFuture, FutureExt};

use crate::errors::{HydrationError, HydrationResult};

/// Collects every continuation registered during the walk.
///
/// Nothing registered here runs until [`JoinBarrier::wait`] polls it.
#[derive(Default)]
pub(crate) struct JoinBarrier {
    pending: Vec<BoxFuture<'static, HydrationResult<()>>>,
}

impl JoinBarrier {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a continuation.
    pub(crate) fn chain(&mut self, continuation: BoxFuture<'static, HydrationResult<()>>) {
        self.pending.push(continuation);
    }

    /// Register a failure found while walking.
    pub(crate) fn fail(&mut self, error: HydrationError) {
        self.chain(future::ready(Err(error)).boxed());
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    /// Drive every continuation to completion on the calling task.
    ///
    /// In-flight work is never cancelled. The first failure in registration
    /// order is returned once everything has settled.
    pub(crate) async fn wait(self) -> HydrationResult<()> {
        future::join_all(self.pending)
            .await
            .into_iter()
            .find_map(Result::err)
            .map_or(Ok(()), Err)
    }
}
