//! # Hydration Engine
//!
//! ## Flow
//!
//! ```text
//! hydrate(ctx, config, target?)
//!     │
//!     ├─ walk (synchronous, depth-first)
//!     │     ├─ constructors run, flat list grows in construction order
//!     │     └─ placeholders written to tree and target
//!     │
//!     └─ barrier.wait()
//!           ├─ every start / factory runs, interleaved on this task
//!           ├─ placeholders replaced by final values
//!           └─ first failure in registration order, after all settled
//!
//! dehydrate(ctx, all_objects) ──→ stop, one at a time, in list order
//! ```
//!
//! Hydration never spawns: everything runs on the task that awaits
//! `hydrate`, so a caller may use any executor. The one exception is a stop
//! deadline, which uses the Tokio timer; `dehydrate` reports a configuration
//! error when one is set outside a Tokio runtime.

mod barrier;
mod builder;
mod walker;

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use self::barrier::JoinBarrier;
use crate::config::{ConfigNode, HydrationConfig};
use crate::context::ExternalContext;
use crate::errors::HydrationResult;
use crate::module::Instance;
use crate::teardown;
use crate::tree::ResultTree;

/// Everything one `hydrate` call owns while walking.
pub(crate) struct HydrationState<'a, C: ExternalContext> {
    pub(crate) ctx: Arc<C>,
    pub(crate) config: &'a HydrationConfig,
    pub(crate) all_objects: Vec<Instance<C>>,
    pub(crate) barrier: JoinBarrier,
    next_id: u64,
}

impl<'a, C: ExternalContext> HydrationState<'a, C> {
    pub(crate) fn new(ctx: Arc<C>, config: &'a HydrationConfig) -> Self {
        Self {
            ctx,
            config,
            all_objects: Vec::new(),
            barrier: JoinBarrier::new(),
            next_id: 0,
        }
    }

    pub(crate) fn next_placeholder(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Outcome of a successful hydration.
pub struct Hydration<C: ExternalContext> {
    /// Result tree, shaped like the configuration.
    pub tree: ResultTree,
    /// Every constructed object, in construction order.
    pub all_objects: Vec<Instance<C>>,
}

impl<C: ExternalContext> Hydration<C> {
    /// How many objects expose `stop`.
    #[must_use]
    pub fn stoppable_count(&self) -> usize {
        self.all_objects
            .iter()
            .filter(|instance| instance.capabilities().stop)
            .count()
    }

    /// Tear down every object with the default settings.
    pub async fn dehydrate(&self, ctx: &C) -> HydrationResult<()> {
        dehydrate(ctx, &self.all_objects).await
    }
}

impl<C: ExternalContext> fmt::Debug for Hydration<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hydration")
            .field("tree", &self.tree)
            .field("all_objects", &self.all_objects)
            .finish()
    }
}

/// Hydration engine bound to one set of policies.
#[derive(Debug, Clone, Default)]
pub struct Hydrator {
    config: HydrationConfig,
}

impl Hydrator {
    #[must_use]
    pub fn new(config: HydrationConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &HydrationConfig {
        &self.config
    }

    /// Build, start and collect every module in `config`.
    ///
    /// When `target` is given it receives the same placeholders and final
    /// values as the returned tree, while hydration is still running.
    ///
    /// # Errors
    ///
    /// The first failure in registration order: a malformed node, a
    /// malformed array reference, a rejected key collision, or an error
    /// raised by a constructor, `start` or factory. Every other module still
    /// runs to completion before the error is returned.
    #[instrument(skip_all, fields(collisions = %self.config.collisions))]
    pub async fn hydrate<C: ExternalContext>(
        &self,
        ctx: Arc<C>,
        config: &ConfigNode<C>,
        target: Option<&ResultTree>,
    ) -> HydrationResult<Hydration<C>> {
        let tree = ResultTree::new();
        let mut state = HydrationState::new(ctx, &self.config);

        walker::walk(&mut state, config, &tree, target);

        let HydrationState {
            all_objects,
            barrier,
            ..
        } = state;
        debug!(
            continuations = barrier.len(),
            objects = all_objects.len(),
            "Walk finished"
        );

        barrier.wait().await?;

        info!(objects = all_objects.len(), "Hydration complete");
        Ok(Hydration { tree, all_objects })
    }

    /// Stop every object that supports it, strictly in list order.
    ///
    /// # Errors
    ///
    /// Under [`crate::TeardownPolicy::Abort`] the first failing stop, with
    /// nothing after it stopped. Under [`crate::TeardownPolicy::Continue`] a
    /// `Teardown` error listing every failure once all stops were attempted.
    #[instrument(skip_all, fields(objects = objects.len(), teardown = %self.config.teardown))]
    pub async fn dehydrate<C: ExternalContext>(
        &self,
        ctx: &C,
        objects: &[Instance<C>],
    ) -> HydrationResult<()> {
        teardown::stop_all(ctx, objects, &self.config).await
    }
}

/// [`Hydrator::hydrate`] with default settings.
pub async fn hydrate<C: ExternalContext>(
    ctx: Arc<C>,
    config: &ConfigNode<C>,
    target: Option<&ResultTree>,
) -> HydrationResult<Hydration<C>> {
    Hydrator::default().hydrate(ctx, config, target).await
}

/// [`Hydrator::dehydrate`] with default settings.
pub async fn dehydrate<C: ExternalContext>(
    ctx: &C,
    objects: &[Instance<C>],
) -> HydrationResult<()> {
    Hydrator::default().dehydrate(ctx, objects).await
}
