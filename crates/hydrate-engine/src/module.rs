//! # Module Contract
//!
//! What caller-supplied modules implement to take part in hydration.
//!
//! ## Capability Set
//!
//! A constructed module is polymorphic over `{constructible, startable, stoppable}`.
//! The set is declared once, when the constructor wraps its object in an
//! [`Instance`], instead of being probed on every lifecycle call:
//!
//! | Constructor | `start` | `stop` |
//! |-------------|---------|--------|
//! | [`Instance::passive`] | no | no |
//! | [`Instance::startable`] | yes | no |
//! | [`Instance::stoppable`] | no | yes |
//! | [`Instance::managed`] | yes | yes |
//!
//! ## Lifecycle
//!
//! ```text
//! Constructor::construct ──→ Instance ──→ flat object list
//!                               │
//!                               ├─ startable: start(ctx, tree) ──→ tree value
//!                               └─ passive:   object itself   ──→ tree value
//!
//! dehydrate: stoppable instances, in list order ──→ stop(ctx)
//! ```

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::ModuleDescriptor;
use crate::context::ExternalContext;
use crate::tree::ResultTree;

/// A resolved module value as it appears in the result tree.
#[derive(Clone)]
pub enum Hydrated {
    /// Plain data (passthrough values, factory results, `start` results).
    Json(Value),
    /// Any shared object (module instances, handles returned by `start`).
    Object(Arc<dyn Any + Send + Sync>),
}

impl Hydrated {
    /// JSON `null`, what a `start` that returns nothing resolves to.
    #[must_use]
    pub fn null() -> Self {
        Self::Json(Value::Null)
    }

    /// Wrap an arbitrary object.
    pub fn object<T: Any + Send + Sync>(object: T) -> Self {
        Self::Object(Arc::new(object))
    }

    /// Borrow the JSON payload, if this is data.
    #[must_use]
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Object(_) => None,
        }
    }

    /// Borrow the object as `T`, if it is one.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Object(object) => object.downcast_ref::<T>(),
            Self::Json(_) => None,
        }
    }

    /// Share the object as `Arc<T>`, if it is one.
    #[must_use]
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            Self::Object(object) => Arc::clone(object).downcast::<T>().ok(),
            Self::Json(_) => None,
        }
    }
}

impl From<Value> for Hydrated {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl fmt::Debug for Hydrated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(value) => f.debug_tuple("Json").field(value).finish(),
            Self::Object(_) => f.write_str("Object(..)"),
        }
    }
}

/// Asynchronous startup phase of a module.
#[async_trait]
pub trait Startable<C: ExternalContext>: Send + Sync {
    /// Start the module. The returned value replaces the module in the result tree.
    ///
    /// `tree` is the live result tree: sibling keys may still hold pending
    /// placeholders that can be awaited to order startup cooperatively.
    ///
    /// Starts run interleaved in construction order. A start that completes
    /// without awaiting anything settles on its first poll, so siblings
    /// constructed after it already see its key as `Ready`.
    async fn start(&self, ctx: &C, tree: &ResultTree) -> anyhow::Result<Hydrated>;
}

/// Teardown phase of a module.
#[async_trait]
pub trait Stoppable<C: ExternalContext>: Send + Sync {
    /// Release whatever the module acquired.
    async fn stop(&self, ctx: &C) -> anyhow::Result<()>;
}

/// Which lifecycle hooks an instance exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub start: bool,
    pub stop: bool,
}

/// A constructed module object, tagged with its capabilities.
pub struct Instance<C: ExternalContext> {
    name: String,
    object: Arc<dyn Any + Send + Sync>,
    starter: Option<Arc<dyn Startable<C>>>,
    stopper: Option<Arc<dyn Stoppable<C>>>,
}

impl<C: ExternalContext> Instance<C> {
    /// An object with neither `start` nor `stop`.
    pub fn passive<T: Any + Send + Sync>(object: T) -> Self {
        Self {
            name: String::new(),
            object: Arc::new(object),
            starter: None,
            stopper: None,
        }
    }

    /// An object with a `start` phase only.
    pub fn startable<T: Startable<C> + Any>(object: T) -> Self {
        let object = Arc::new(object);
        Self {
            name: String::new(),
            object: object.clone(),
            starter: Some(object),
            stopper: None,
        }
    }

    /// An object with a `stop` phase only.
    pub fn stoppable<T: Stoppable<C> + Any>(object: T) -> Self {
        let object = Arc::new(object);
        Self {
            name: String::new(),
            object: object.clone(),
            starter: None,
            stopper: Some(object),
        }
    }

    /// An object with both `start` and `stop`.
    pub fn managed<T: Startable<C> + Stoppable<C> + Any>(object: T) -> Self {
        let object = Arc::new(object);
        Self {
            name: String::new(),
            object: object.clone(),
            starter: Some(object.clone()),
            stopper: Some(object),
        }
    }

    pub(crate) fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Configuration key the instance was built for.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            start: self.starter.is_some(),
            stop: self.stopper.is_some(),
        }
    }

    /// Borrow the underlying object as `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.object.downcast_ref::<T>()
    }

    /// The instance as a result-tree value.
    #[must_use]
    pub fn as_hydrated(&self) -> Hydrated {
        Hydrated::Object(Arc::clone(&self.object))
    }

    pub(crate) fn starter(&self) -> Option<Arc<dyn Startable<C>>> {
        self.starter.clone()
    }

    pub(crate) fn stopper(&self) -> Option<&Arc<dyn Stoppable<C>>> {
        self.stopper.as_ref()
    }
}

impl<C: ExternalContext> Clone for Instance<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            object: Arc::clone(&self.object),
            starter: self.starter.clone(),
            stopper: self.stopper.clone(),
        }
    }
}

impl<C: ExternalContext> fmt::Debug for Instance<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities())
            .finish()
    }
}

/// Constructor-like module reference.
///
/// Implemented for any `Fn(&Arc<C>, &ModuleDescriptor<C>, &ResultTree) -> anyhow::Result<Instance<C>>`.
pub trait Constructor<C: ExternalContext>: Send + Sync {
    fn construct(
        &self,
        ctx: &Arc<C>,
        descriptor: &ModuleDescriptor<C>,
        tree: &ResultTree,
    ) -> anyhow::Result<Instance<C>>;
}

impl<C, F> Constructor<C> for F
where
    C: ExternalContext,
    F: Fn(&Arc<C>, &ModuleDescriptor<C>, &ResultTree) -> anyhow::Result<Instance<C>>
        + Send
        + Sync,
{
    fn construct(
        &self,
        ctx: &Arc<C>,
        descriptor: &ModuleDescriptor<C>,
        tree: &ResultTree,
    ) -> anyhow::Result<Instance<C>> {
        self(ctx, descriptor, tree)
    }
}

/// A struct that knows how to build itself from a descriptor.
///
/// Reference it from configuration with [`crate::ModuleRef::module`].
pub trait Module<C: ExternalContext>: Sized + Send + Sync + 'static {
    fn new(ctx: &Arc<C>, descriptor: &ModuleDescriptor<C>, tree: &ResultTree)
        -> anyhow::Result<Self>;

    /// Declare the capability set. Defaults to [`Instance::passive`].
    fn into_instance(self) -> Instance<C> {
        Instance::passive(self)
    }
}

pub(crate) struct ModuleConstructor<T>(PhantomData<fn() -> T>);

impl<T> ModuleConstructor<T> {
    pub(crate) fn new() -> Self {
        Self(PhantomData)
    }
}

impl<C, T> Constructor<C> for ModuleConstructor<T>
where
    C: ExternalContext,
    T: Module<C>,
{
    fn construct(
        &self,
        ctx: &Arc<C>,
        descriptor: &ModuleDescriptor<C>,
        tree: &ResultTree,
    ) -> anyhow::Result<Instance<C>> {
        T::new(ctx, descriptor, tree).map(T::into_instance)
    }
}
