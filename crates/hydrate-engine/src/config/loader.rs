//! # JSON Loader
//!
//! Turns a JSON document into a [`ConfigNode`] tree, resolving module names
//! against a [`ModuleRegistry`].
//!
//! ## Classification
//!
//! | JSON | Node |
//! |------|------|
//! | array | `Sequence` |
//! | object with a truthy `module` | `Module` |
//! | any other object | `Mapping` (document order) |
//! | string, number, bool, null | `Scalar` |
//!
//! ## `module` Field
//!
//! | Value | Reference |
//! |-------|-----------|
//! | string naming a registered constructor | `Constructor` |
//! | object with a truthy `default` | `Default(inner)` |
//! | `[name, ...args]` | `Call`, head resolved as a registered function |
//! | anything else | `Value` passthrough |
//!
//! Truthiness: `null`, `false`, `0` and `""` are falsy, everything else is truthy.

use serde_json::{Map, Value};

use super::node::{CallHead, ConfigNode, ModuleDescriptor, ModuleRef};
use crate::context::ExternalContext;
use crate::errors::{HydrationError, HydrationResult};
use crate::registry::ModuleRegistry;

impl<C: ExternalContext> ConfigNode<C> {
    /// Build a configuration tree from a parsed JSON document.
    pub fn from_json(value: &Value, registry: &ModuleRegistry<C>) -> HydrationResult<Self> {
        Ok(match value {
            Value::Array(items) => Self::Sequence(
                items
                    .iter()
                    .map(|item| Self::from_json(item, registry))
                    .collect::<HydrationResult<_>>()?,
            ),
            Value::Object(fields) if fields.get("module").is_some_and(is_truthy) => {
                Self::Module(descriptor_from_json(fields, registry))
            }
            Value::Object(fields) => Self::Mapping(
                fields
                    .iter()
                    .map(|(key, child)| Ok((key.clone(), Self::from_json(child, registry)?)))
                    .collect::<HydrationResult<_>>()?,
            ),
            scalar => Self::Scalar(scalar.clone()),
        })
    }

    /// Parse and build a configuration tree from JSON text.
    pub fn from_json_str(source: &str, registry: &ModuleRegistry<C>) -> HydrationResult<Self> {
        let value: Value = serde_json::from_str(source)
            .map_err(|e| HydrationError::Config(format!("Invalid configuration JSON: {e}")))?;
        Self::from_json(&value, registry)
    }
}

fn descriptor_from_json<C: ExternalContext>(
    fields: &Map<String, Value>,
    registry: &ModuleRegistry<C>,
) -> ModuleDescriptor<C> {
    let mut settings = Map::new();
    let mut enabled = None;
    let mut module = ModuleRef::value(Value::Null);

    for (key, value) in fields {
        match key.as_str() {
            "module" => module = reference_from_json(value, registry),
            "enabled" => enabled = Some(is_truthy(value)),
            _ => {
                settings.insert(key.clone(), value.clone());
            }
        }
    }

    let descriptor = ModuleDescriptor::new(module).with_settings(settings);
    match enabled {
        Some(flag) => descriptor.enabled(flag),
        None => descriptor,
    }
}

fn reference_from_json<C: ExternalContext>(
    value: &Value,
    registry: &ModuleRegistry<C>,
) -> ModuleRef<C> {
    match value {
        Value::String(name) => registry
            .constructor(name)
            .unwrap_or_else(|| ModuleRef::value(value.clone())),
        Value::Object(fields) => match fields.get("default").filter(|inner| is_truthy(inner)) {
            Some(inner) => ModuleRef::default_export(reference_from_json(inner, registry)),
            None => ModuleRef::value(value.clone()),
        },
        Value::Array(items) => {
            let (head, args) = match items.split_first() {
                Some((head, args)) => (head.clone(), args.to_vec()),
                None => (Value::Null, Vec::new()),
            };
            let head = match head.as_str().and_then(|name| registry.function(name)) {
                Some(function) => CallHead::Function(function),
                None => CallHead::Value(head),
            };
            ModuleRef::Call { head, args }
        }
        other => ModuleRef::value(other.clone()),
    }
}

/// Loose truthiness used for `module`, `default` and `enabled`.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
