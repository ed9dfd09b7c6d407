//! Service definitions and the frozen configuration map.
//!
//! A [`Definition`] is the recipe for one identifier. The recognized shapes
//! are a zero-argument factory, an alias to another identifier, and a list
//! of positional constructor arguments; any other dynamically-typed value a
//! host hands in is kept as [`Definition::Raw`] and rejected when resolved.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::error::{CanisterError, DuplicateDefinitionError, Result};
use crate::id::ServiceId;

/// A resolved service instance, shared by the container and every caller.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Error type caller-supplied callables may return.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Zero-argument callable producing an instance.
pub type FactoryFn = Arc<dyn Fn() -> std::result::Result<Instance, BoxError> + Send + Sync>;

/// One entry in the container's configuration.
#[derive(Clone)]
pub enum Definition {
    /// Invoke the callable; its return value is the instance.
    Factory(FactoryFn),
    /// Resolve the named identifier instead.
    Alias(ServiceId),
    /// Construct the target type with these positional arguments. Each
    /// entry must itself be a `Factory` (invoked for its value) or an
    /// `Alias` (resolved as a service identifier).
    Args(Vec<Definition>),
    /// Any other value a data-driven configuration carried. Always fails
    /// with `InvalidConfiguration` at resolve time.
    Raw(RawValue),
}

impl Definition {
    /// Wraps an infallible closure as a factory definition.
    pub fn factory<T, F>(f: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Definition::Factory(Arc::new(move || Ok(Arc::new(f()) as Instance)))
    }

    /// Wraps a fallible closure as a factory definition.
    pub fn try_factory<T, F>(f: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> std::result::Result<T, BoxError> + Send + Sync + 'static,
    {
        Definition::Factory(Arc::new(move || Ok(Arc::new(f()?) as Instance)))
    }

    /// An alias for (or, inside an argument list, a reference to) `target`.
    pub fn alias(target: impl Into<ServiceId>) -> Self {
        Definition::Alias(target.into())
    }

    /// Positional constructor arguments for the target type.
    pub fn args(entries: impl IntoIterator<Item = Definition>) -> Self {
        Definition::Args(entries.into_iter().collect())
    }

    /// Short shape name used in configuration errors.
    pub(crate) fn shape(&self) -> &'static str {
        match self {
            Definition::Factory(_) => "factory",
            Definition::Alias(_) => "alias",
            Definition::Args(_) => "argument list",
            Definition::Raw(value) => value.shape(),
        }
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Definition::Factory(_) => f.write_str("Factory(..)"),
            Definition::Alias(target) => write!(f, "Alias({target})"),
            Definition::Args(entries) => {
                write!(f, "Args({} entries)", entries.len())
            }
            Definition::Raw(value) => write!(f, "Raw({value:?})"),
        }
    }
}

impl From<&str> for Definition {
    fn from(target: &str) -> Self {
        Definition::Alias(target.into())
    }
}

impl From<String> for Definition {
    fn from(target: String) -> Self {
        Definition::Alias(target.into())
    }
}

impl From<ServiceId> for Definition {
    fn from(target: ServiceId) -> Self {
        Definition::Alias(target)
    }
}

impl From<RawValue> for Definition {
    fn from(value: RawValue) -> Self {
        Definition::Raw(value)
    }
}

impl From<i64> for Definition {
    fn from(value: i64) -> Self {
        Definition::Raw(RawValue::Int(value))
    }
}

impl From<f64> for Definition {
    fn from(value: f64) -> Self {
        Definition::Raw(RawValue::Float(value))
    }
}

impl From<bool> for Definition {
    fn from(value: bool) -> Self {
        Definition::Raw(RawValue::Bool(value))
    }
}

/// A dynamically-typed scalar that is not a valid service recipe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum RawValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl RawValue {
    pub(crate) fn shape(&self) -> &'static str {
        match self {
            RawValue::Int(_) => "integer",
            RawValue::Float(_) => "float",
            RawValue::Bool(_) => "boolean",
            RawValue::Null => "null",
        }
    }
}

/// The id -> definition map. Populated through the builder, frozen once
/// the container is constructed.
#[derive(Debug, Default)]
pub(crate) struct Configuration {
    entries: HashMap<ServiceId, Definition>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a definition for `id`.
    ///
    /// # Errors
    /// [`CanisterError::DuplicateDefinition`] if `id` already has one and
    /// `allow_override` is false.
    pub fn define(
        &mut self,
        id: ServiceId,
        definition: Definition,
        allow_override: bool,
    ) -> Result<()> {
        if !allow_override && self.entries.contains_key(&id) {
            return Err(CanisterError::DuplicateDefinition(
                DuplicateDefinitionError { id },
            ));
        }
        debug!(id = %id, shape = definition.shape(), "defined service");
        self.entries.insert(id, definition);
        Ok(())
    }

    pub fn lookup(&self, id: &ServiceId) -> Option<&Definition> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &ServiceId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &ServiceId> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
