//! # Module Registry
//!
//! Names for callables, so configuration trees can come from JSON files.
//!
//! ```text
//! { "db": { "module": "postgres", "url": "..." } }
//!                        │
//!                        ▼
//!          ModuleRegistry["postgres"] ──→ ModuleRef::Constructor
//! ```
//!
//! Constructors and factory functions share one namespace, so a name in a
//! file always means exactly one thing.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::{FactoryFn, ModuleRef};
use crate::context::ExternalContext;
use crate::errors::{HydrationError, HydrationResult};
use crate::module::{Constructor, Module, ModuleConstructor};

enum Entry<C: ExternalContext> {
    Constructor(Arc<dyn Constructor<C>>),
    Function(FactoryFn),
}

/// Name → callable table consulted by the JSON loader.
pub struct ModuleRegistry<C: ExternalContext> {
    entries: HashMap<String, Entry<C>>,
}

impl<C: ExternalContext> ModuleRegistry<C> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register a struct implementing [`Module`] under `name`.
    pub fn register_module<T: Module<C>>(&mut self, name: &str) -> HydrationResult<()> {
        self.insert(
            name,
            Entry::Constructor(Arc::new(ModuleConstructor::<T>::new())),
        )
    }

    /// Register any constructor under `name`.
    pub fn register_constructor(
        &mut self,
        name: &str,
        constructor: impl Constructor<C> + 'static,
    ) -> HydrationResult<()> {
        self.insert(name, Entry::Constructor(Arc::new(constructor)))
    }

    /// Register a factory function for the array form under `name`.
    pub fn register_function(&mut self, name: &str, function: FactoryFn) -> HydrationResult<()> {
        self.insert(name, Entry::Function(function))
    }

    fn insert(&mut self, name: &str, entry: Entry<C>) -> HydrationResult<()> {
        if self.entries.contains_key(name) {
            return Err(HydrationError::Config(format!(
                "Module name `{name}` is already registered"
            )));
        }
        debug!(name, "Registered module");
        self.entries.insert(name.to_string(), entry);
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Constructor registered under `name`, as a module reference.
    #[must_use]
    pub fn constructor(&self, name: &str) -> Option<ModuleRef<C>> {
        match self.entries.get(name)? {
            Entry::Constructor(constructor) => Some(ModuleRef::Constructor(Arc::clone(constructor))),
            Entry::Function(_) => None,
        }
    }

    /// Factory function registered under `name`.
    #[must_use]
    pub fn function(&self, name: &str) -> Option<FactoryFn> {
        match self.entries.get(name)? {
            Entry::Function(function) => Some(function.clone()),
            Entry::Constructor(_) => None,
        }
    }
}

impl<C: ExternalContext> Default for ModuleRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ExternalContext> std::fmt::Debug for ModuleRegistry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("ModuleRegistry").field("names", &names).finish()
    }
}
