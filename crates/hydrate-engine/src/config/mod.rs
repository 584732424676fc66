//! # Configuration
//!
//! - [`node`]: the configuration tree handed to `hydrate`
//! - [`loader`]: building that tree from JSON through a registry
//! - [`engine`]: policies for the engine itself

pub mod engine;
pub mod loader;
pub mod node;

pub use engine::{CollisionPolicy, HydrationConfig, TeardownPolicy};
pub use node::{CallHead, ConfigNode, FactoryFn, ModuleDescriptor, ModuleRef};
