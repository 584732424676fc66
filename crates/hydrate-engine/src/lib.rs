//! # Hydrate Engine - Declarative Object-Graph Hydration
//!
//! Builds a tree of modules from a configuration tree, starts them in
//! parallel, and tears them down again in construction order.
//!
//! ## Overview
//!
//! ```text
//!  ConfigNode                      ResultTree            all_objects
//! ┌──────────────────────┐        ┌──────────────┐      ┌───────────┐
//! │ db:    { module: Db }│ ─────→ │ db:    <start>│      │ [0] Db    │
//! │ cache: { module: C,  │ ─────→ │ cache: null   │      │           │
//! │          enabled: 0 }│        │ api:          │      │ [1] Api   │
//! │ api:   { http: {...}}│ ─────→ │   http: <obj> │      │           │
//! └──────────────────────┘        └──────────────┘      └───────────┘
//!                                                              │
//!                                   dehydrate: stop, in order ─┘
//! ```
//!
//! ## Rules
//!
//! - A mapping with a `module` reference is a module; any other mapping is a
//!   nested level of the result tree
//! - Sequences merge their elements into the same level
//! - Every `start` is launched in the same pass and they interleave freely
//! - Placeholders land in the tree before any `start` runs, so a module can
//!   await a sibling from inside its own `start`
//! - Every failure, structural or module-raised, surfaces once from
//!   `hydrate` after all in-flight work has settled
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use hydrate_engine::{hydrate, ConfigNode, ModuleDescriptor, ModuleRef};
//!
//! let config = ConfigNode::map([
//!     ("db", ModuleDescriptor::new(ModuleRef::module::<Database>()).into()),
//! ]);
//! let hydration = hydrate(Arc::new(ctx), &config, None).await?;
//! // ...
//! hydration.dehydrate(&ctx).await?;
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod config;
pub mod context;
pub mod engine;
pub mod errors;
pub mod module;
pub mod registry;
pub mod tree;

mod teardown;

pub use config::{
    CallHead, CollisionPolicy, ConfigNode, FactoryFn, HydrationConfig, ModuleDescriptor,
    ModuleRef, TeardownPolicy,
};
pub use context::{ContextLogger, ExternalContext};
pub use engine::{dehydrate, hydrate, Hydration, Hydrator};
pub use errors::{HydrationError, HydrationResult};
pub use module::{Capabilities, Constructor, Hydrated, Instance, Module, Startable, Stoppable};
pub use registry::ModuleRegistry;
pub use tree::{PendingValue, ResultTree, TreeValue};
