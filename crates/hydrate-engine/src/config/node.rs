//! Configuration tree types.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::loader::is_truthy;
use crate::context::ExternalContext;
use crate::module::{Constructor, Hydrated, Module, ModuleConstructor};

/// One node of a configuration tree.
pub enum ConfigNode<C: ExternalContext> {
    /// Siblings merged into the same result level.
    Sequence(Vec<ConfigNode<C>>),
    /// Named children, in insertion order.
    Mapping(Vec<(String, ConfigNode<C>)>),
    /// Something to instantiate.
    Module(ModuleDescriptor<C>),
    /// Anything else. Always a configuration error once hydrated.
    Scalar(Value),
}

impl<C: ExternalContext> ConfigNode<C> {
    /// Build a mapping from `(key, node)` pairs.
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, ConfigNode<C>)>,
    {
        Self::Mapping(
            entries
                .into_iter()
                .map(|(key, node)| (key.into(), node))
                .collect(),
        )
    }

    /// Build a sequence of sibling nodes.
    pub fn seq<I>(nodes: I) -> Self
    where
        I: IntoIterator<Item = ConfigNode<C>>,
    {
        Self::Sequence(nodes.into_iter().collect())
    }

    pub fn scalar(value: impl Into<Value>) -> Self {
        Self::Scalar(value.into())
    }

    /// Whether this node is a module descriptor.
    #[must_use]
    pub fn is_module(&self) -> bool {
        matches!(self, Self::Module(_))
    }

    /// JSON rendering used in diagnostics. Callables render as markers.
    #[must_use]
    pub fn render(&self) -> Value {
        match self {
            Self::Sequence(nodes) => Value::Array(nodes.iter().map(Self::render).collect()),
            Self::Mapping(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, node)| (key.clone(), node.render()))
                    .collect(),
            ),
            Self::Module(descriptor) => descriptor.render(),
            Self::Scalar(value) => value.clone(),
        }
    }
}

impl<C: ExternalContext> From<ModuleDescriptor<C>> for ConfigNode<C> {
    fn from(descriptor: ModuleDescriptor<C>) -> Self {
        Self::Module(descriptor)
    }
}

impl<C: ExternalContext> Clone for ConfigNode<C> {
    fn clone(&self) -> Self {
        match self {
            Self::Sequence(nodes) => Self::Sequence(nodes.clone()),
            Self::Mapping(entries) => Self::Mapping(entries.clone()),
            Self::Module(descriptor) => Self::Module(descriptor.clone()),
            Self::Scalar(value) => Self::Scalar(value.clone()),
        }
    }
}

impl<C: ExternalContext> fmt::Debug for ConfigNode<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequence(nodes) => f.debug_list().entries(nodes).finish(),
            Self::Mapping(entries) => f
                .debug_map()
                .entries(entries.iter().map(|(k, v)| (k, v)))
                .finish(),
            Self::Module(descriptor) => fmt::Debug::fmt(descriptor, f),
            Self::Scalar(value) => write!(f, "Scalar({value})"),
        }
    }
}

/// A mapping node carrying a `module` reference.
pub struct ModuleDescriptor<C: ExternalContext> {
    module: ModuleRef<C>,
    enabled: Option<bool>,
    settings: Map<String, Value>,
}

impl<C: ExternalContext> ModuleDescriptor<C> {
    pub fn new(module: ModuleRef<C>) -> Self {
        Self {
            module,
            enabled: None,
            settings: Map::new(),
        }
    }

    /// Set the `enabled` flag. An absent flag means enabled.
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Add one pass-through setting for the module.
    #[must_use]
    pub fn setting(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    /// Replace all pass-through settings.
    #[must_use]
    pub fn with_settings(mut self, settings: Map<String, Value>) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn module(&self) -> &ModuleRef<C> {
        &self.module
    }

    /// The raw `enabled` flag, if one was given.
    #[must_use]
    pub fn enabled_flag(&self) -> Option<bool> {
        self.enabled
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled != Some(false)
    }

    /// One setting by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.settings.get(key)
    }

    #[must_use]
    pub fn settings(&self) -> &Map<String, Value> {
        &self.settings
    }

    /// Deserialize all settings into a typed configuration struct.
    pub fn settings_as<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        Ok(serde_json::from_value(Value::Object(self.settings.clone()))?)
    }

    /// The full descriptor as JSON, `module` and `enabled` included.
    #[must_use]
    pub fn render(&self) -> Value {
        let mut rendered = self.settings.clone();
        if let Some(enabled) = self.enabled {
            rendered.insert("enabled".to_string(), Value::Bool(enabled));
        }
        rendered.insert("module".to_string(), self.module.render());
        Value::Object(rendered)
    }
}

impl<C: ExternalContext> Clone for ModuleDescriptor<C> {
    fn clone(&self) -> Self {
        Self {
            module: self.module.clone(),
            enabled: self.enabled,
            settings: self.settings.clone(),
        }
    }
}

impl<C: ExternalContext> fmt::Debug for ModuleDescriptor<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("module", &self.module)
            .field("enabled", &self.enabled)
            .field("settings", &self.settings)
            .finish()
    }
}

/// What a descriptor's `module` field points at.
pub enum ModuleRef<C: ExternalContext> {
    /// Constructed, appended to the flat object list, optionally started.
    Constructor(Arc<dyn Constructor<C>>),
    /// Package-style wrapper; the wrapped reference is used instead.
    Default(Box<ModuleRef<C>>),
    /// `[function, ...args]`: the function's result is the value. No lifecycle.
    Call { head: CallHead, args: Vec<Value> },
    /// Non-callable value passed through unchanged.
    Value(Hydrated),
}

impl<C: ExternalContext> ModuleRef<C> {
    /// Reference a struct implementing [`Module`].
    #[must_use]
    pub fn module<T: Module<C>>() -> Self {
        Self::Constructor(Arc::new(ModuleConstructor::<T>::new()))
    }

    pub fn constructor(constructor: impl Constructor<C> + 'static) -> Self {
        Self::Constructor(Arc::new(constructor))
    }

    /// Array form with a callable head.
    pub fn call<I>(function: FactoryFn, args: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        Self::Call {
            head: CallHead::Function(function),
            args: args.into_iter().collect(),
        }
    }

    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(Hydrated::Json(value.into()))
    }

    pub fn default_export(inner: ModuleRef<C>) -> Self {
        Self::Default(Box::new(inner))
    }

    /// JSON rendering used in diagnostics.
    #[must_use]
    pub fn render(&self) -> Value {
        match self {
            Self::Constructor(_) => Value::String("[constructor]".to_string()),
            Self::Default(inner) => {
                let mut wrapper = Map::new();
                wrapper.insert("default".to_string(), inner.render());
                Value::Object(wrapper)
            }
            Self::Call { head, args } => {
                let head = match head {
                    CallHead::Function(_) => Value::String("[function]".to_string()),
                    CallHead::Value(value) => value.clone(),
                };
                Value::Array(std::iter::once(head).chain(args.iter().cloned()).collect())
            }
            Self::Value(Hydrated::Json(value)) => value.clone(),
            Self::Value(Hydrated::Object(_)) => Value::String("[object]".to_string()),
        }
    }

    /// Whether the reference counts as a `module` field at all.
    ///
    /// A falsy plain value (`null`, `false`, `0`, `""`) does not, and the
    /// descriptor is walked as an ordinary mapping instead.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Value(Hydrated::Json(value)) => is_truthy(value),
            _ => true,
        }
    }

    /// Whether the reference constructs an object.
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        match self {
            Self::Constructor(_) => true,
            Self::Default(inner) => matches!(inner.as_ref(), Self::Constructor(_)),
            Self::Call { .. } | Self::Value(_) => false,
        }
    }
}

impl<C: ExternalContext> Clone for ModuleRef<C> {
    fn clone(&self) -> Self {
        match self {
            Self::Constructor(constructor) => Self::Constructor(Arc::clone(constructor)),
            Self::Default(inner) => Self::Default(inner.clone()),
            Self::Call { head, args } => Self::Call {
                head: head.clone(),
                args: args.clone(),
            },
            Self::Value(value) => Self::Value(value.clone()),
        }
    }
}

impl<C: ExternalContext> fmt::Debug for ModuleRef<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constructor(_) => f.write_str("Constructor(..)"),
            Self::Default(inner) => f.debug_tuple("Default").field(inner).finish(),
            Self::Call { head, args } => f
                .debug_struct("Call")
                .field("head", head)
                .field("args", args)
                .finish(),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

/// First element of the array form of a module reference.
///
/// Only `Function` is valid; a `Value` head is kept so the mistake can be
/// reported when the descriptor is built.
#[derive(Clone)]
pub enum CallHead {
    Function(FactoryFn),
    Value(Value),
}

impl fmt::Debug for CallHead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(_) => f.write_str("Function(..)"),
            Self::Value(value) => write!(f, "Value({value})"),
        }
    }
}

type FactoryBody = dyn Fn(Vec<Value>) -> BoxFuture<'static, anyhow::Result<Hydrated>> + Send + Sync;

/// Factory function invoked with the positional arguments of the array form.
#[derive(Clone)]
pub struct FactoryFn(Arc<FactoryBody>);

impl FactoryFn {
    /// Wrap an asynchronous function.
    pub fn new<F, Fut>(function: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Hydrated>> + Send + 'static,
    {
        Self(Arc::new(move |args| function(args).boxed()))
    }

    /// Wrap a synchronous function; its result is normalised into a ready future.
    pub fn sync<F>(function: F) -> Self
    where
        F: Fn(Vec<Value>) -> anyhow::Result<Hydrated> + Send + Sync + 'static,
    {
        Self(Arc::new(move |args| future::ready(function(args)).boxed()))
    }

    pub(crate) fn invoke(&self, args: Vec<Value>) -> BoxFuture<'static, anyhow::Result<Hydrated>> {
        (self.0)(args)
    }
}

impl fmt::Debug for FactoryFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FactoryFn(..)")
    }
}
