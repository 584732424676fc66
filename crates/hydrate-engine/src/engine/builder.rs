//! Object builder: turns one module descriptor into an eventual value.

use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use serde_json::json;
use tracing::info;

use super::HydrationState;
use crate::config::{CallHead, ModuleDescriptor, ModuleRef};
use crate::context::{log_info, ExternalContext};
use crate::errors::{HydrationError, HydrationResult};
use crate::module::Hydrated;
use crate::tree::ResultTree;

pub(crate) type Eventual = BoxFuture<'static, HydrationResult<Hydrated>>;

/// Build the module described by `descriptor` under key `name`.
///
/// Returns `None` for a disabled module. Constructors run right here, during
/// the walk; `start` and factory bodies only run once the returned future is
/// polled, which never happens before the walk has finished.
pub(crate) fn build<C: ExternalContext>(
    state: &mut HydrationState<'_, C>,
    name: &str,
    descriptor: &ModuleDescriptor<C>,
    tree: &ResultTree,
) -> Option<Eventual> {
    if !descriptor.is_enabled() {
        return None;
    }

    info!(module = name, "Hydrating module");
    log_info(state.ctx.as_ref(), "Hydrating module", &json!({ "name": name }));

    Some(match descriptor.module() {
        ModuleRef::Call { head, args } => call(name, head, args),
        ModuleRef::Default(inner) => instantiate(state, name, inner, descriptor, tree),
        reference => instantiate(state, name, reference, descriptor, tree),
    })
}

fn call(name: &str, head: &CallHead, args: &[serde_json::Value]) -> Eventual {
    let CallHead::Function(function) = head else {
        return future::ready(Err(HydrationError::InvalidFactory {
            name: name.to_string(),
        }))
        .boxed();
    };

    let name = name.to_string();
    function
        .invoke(args.to_vec())
        .map(move |result| result.map_err(|e| HydrationError::factory(&name, e)))
        .boxed()
}

fn instantiate<C: ExternalContext>(
    state: &mut HydrationState<'_, C>,
    name: &str,
    reference: &ModuleRef<C>,
    descriptor: &ModuleDescriptor<C>,
    tree: &ResultTree,
) -> Eventual {
    let constructor = match reference {
        ModuleRef::Constructor(constructor) => constructor,
        ModuleRef::Value(value) => return future::ready(Ok(value.clone())).boxed(),
        // Only one wrapper level is unwrapped; whatever is left is plain data.
        other => return future::ready(Ok(Hydrated::Json(other.render()))).boxed(),
    };

    let instance = match constructor.construct(&state.ctx, descriptor, tree) {
        Ok(instance) => instance.named(name),
        Err(e) => return future::ready(Err(HydrationError::construct(name, e))).boxed(),
    };
    state.all_objects.push(instance.clone());

    match instance.starter() {
        Some(starter) => {
            let ctx = Arc::clone(&state.ctx);
            let tree = tree.clone();
            let name = name.to_string();
            async move {
                starter
                    .start(&ctx, &tree)
                    .await
                    .map_err(|e| HydrationError::start(&name, e))
            }
            .boxed()
        }
        None => future::ready(Ok(instance.as_hydrated())).boxed(),
    }
}
