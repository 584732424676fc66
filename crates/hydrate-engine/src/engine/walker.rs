//! Tree walker: one synchronous, depth-first pass over the configuration.
//!
//! ```text
//! Sequence ──→ every element, same result level
//! Mapping  ──→ per key:
//!                module    ──→ build ──→ placeholder now, final value later
//!                otherwise ──→ empty branch ──→ recurse
//! Module with a falsy `module` ──→ walked as a plain mapping
//! Module / Scalar at a walker position ──→ failure on the barrier
//! ```

use std::sync::Arc;

use futures::future::FutureExt;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use super::builder::build;
use super::HydrationState;
use crate::config::{CollisionPolicy, ConfigNode, ModuleDescriptor};
use crate::context::{log_info, ExternalContext};
use crate::errors::{HydrationError, HydrationResult};
use crate::registry::ModuleRegistry;
use crate::tree::{PendingValue, ResultTree, TreeValue};

/// Populate `tree` (and `target`, when given) from `node`.
pub(crate) fn walk<C: ExternalContext>(
    state: &mut HydrationState<'_, C>,
    node: &ConfigNode<C>,
    tree: &ResultTree,
    target: Option<&ResultTree>,
) {
    match node {
        ConfigNode::Sequence(nodes) => {
            for child in nodes {
                walk(state, child, tree, target);
            }
        }
        ConfigNode::Mapping(entries) => {
            for (key, child) in entries {
                if !claim(state, key, tree) {
                    continue;
                }
                match child {
                    ConfigNode::Module(descriptor) if descriptor.module().is_truthy() => {
                        place_module(state, key, descriptor, tree, target);
                    }
                    _ => {
                        let branch = tree.insert_branch(key);
                        let target_branch = target.map(|t| t.insert_branch(key));
                        walk(state, child, &branch, target_branch.as_ref());
                    }
                }
            }
        }
        ConfigNode::Module(descriptor) if !descriptor.module().is_truthy() => {
            // Not a module after all: walk its fields like any other mapping.
            match ConfigNode::from_json(&descriptor.render(), &ModuleRegistry::new()) {
                Ok(plain) => walk(state, &plain, tree, target),
                Err(e) => state.barrier.fail(e),
            }
        }
        ConfigNode::Module(_) | ConfigNode::Scalar(_) => {
            state.barrier.fail(HydrationError::InvalidNode {
                rendered: render_tabbed(&node.render()),
            });
        }
    }
}

/// Decide whether `key` may be written at this level.
fn claim<C: ExternalContext>(
    state: &mut HydrationState<'_, C>,
    key: &str,
    tree: &ResultTree,
) -> bool {
    if !tree.contains_key(key) {
        return true;
    }
    match state.config.collisions {
        CollisionPolicy::LastWriteWins => {
            warn!(key, "Key written by an earlier sibling, later sibling wins");
            true
        }
        CollisionPolicy::Reject => {
            state.barrier.fail(HydrationError::DuplicateKey {
                key: key.to_string(),
            });
            false
        }
    }
}

fn place_module<C: ExternalContext>(
    state: &mut HydrationState<'_, C>,
    key: &str,
    descriptor: &ModuleDescriptor<C>,
    tree: &ResultTree,
    target: Option<&ResultTree>,
) {
    let Some(eventual) = build(state, key, descriptor, tree) else {
        tree.insert(key, TreeValue::Disabled);
        if let Some(target) = target {
            target.insert(key, TreeValue::Disabled);
        }
        return;
    };

    let pending = PendingValue::new(state.next_placeholder(), eventual);
    tree.insert(key, TreeValue::Pending(pending.clone()));
    if let Some(target) = target {
        target.insert(key, TreeValue::Pending(pending.clone()));
    }
    debug!(key, id = pending.id(), "Placeholder written");

    state.barrier.chain(
        settle(
            Arc::clone(&state.ctx),
            key.to_string(),
            pending,
            tree.clone(),
            target.cloned(),
        )
        .boxed(),
    );
}

/// Continuation that swaps the placeholder for the final value.
async fn settle<C: ExternalContext>(
    ctx: Arc<C>,
    key: String,
    pending: PendingValue,
    tree: ResultTree,
    target: Option<ResultTree>,
) -> HydrationResult<()> {
    match pending.wait().await {
        Ok(value) => {
            info!(key = %key, "Completed hydration");
            log_info(ctx.as_ref(), "Completed hydration", &json!({ "key": key }));
            if let Some(target) = &target {
                target.settle(&key, pending.id(), value.clone());
            }
            tree.settle(&key, pending.id(), value);
            Ok(())
        }
        Err(e) => {
            error!(key = %key, error = %e, "Module failed to hydrate");
            Err(e)
        }
    }
}

/// Pretty JSON with tab indentation, as shown in diagnostics.
pub(crate) fn render_tabbed(value: &Value) -> String {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    match value.serialize(&mut serializer) {
        Ok(()) => String::from_utf8(buffer).unwrap_or_else(|_| value.to_string()),
        Err(_) => value.to_string(),
    }
}
