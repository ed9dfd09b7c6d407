//! # The Container
//!
//! A minimal service container with singleton semantics: identifiers map to
//! recipes (factory, alias, positional arguments), and anything without a
//! recipe falls back to constructor autowiring through the type registry.
//!
//! # Architecture
//! ```text
//! ContainerBuilder  ──build()──>  Container
//!                                    │
//!                                 get(id)
//!                                    │
//!                      cache hit ────┴──── miss: dispatch on the
//!                                          definition, recursing into
//!                                          get() for each dependency
//! ```
//!
//! # Examples
//! ```rust
//! use canister_core::prelude::*;
//! use std::sync::Arc;
//!
//! struct Mailer {
//!     sender: String,
//! }
//!
//! let container = Container::builder()
//!     .factory("sender", || String::from("noreply@example.com"))
//!     .try_factory("mailer", || {
//!         Ok(Mailer { sender: "noreply@example.com".into() })
//!     })
//!     .alias("outbox", "mailer")
//!     .build()
//!     .expect("container should build");
//!
//! let mailer: Arc<Mailer> = container.get_as("outbox").expect("resolvable");
//! assert_eq!(mailer.sender, "noreply@example.com");
//! ```

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use tracing::{debug, info, instrument, trace, warn};

use canister_support::rendering::suggest_similar;

use crate::config::{Configuration, Definition, FactoryFn, Instance};
use crate::error::{
    CanisterError, CircularDependencyError, InvalidConfigurationError, Result,
    ServiceNotFoundError, UnresolvableDependencyError,
};
use crate::id::ServiceId;
use crate::introspect::{
    Constructible, GlobalTypes, ParamKind, TypeDescriptor, TypeIntrospector, TypeRegistry,
};

/// One cache slot; initialized at most once per identifier.
type Slot = Arc<OnceCell<Instance>>;

// ============================================================
// ContainerBuilder
// ============================================================

/// Builds a [`Container`] from configuration entries.
///
/// Definitions added here become the immutable configuration of the built
/// container. Defining one identifier twice is an error at
/// [`build()`](ContainerBuilder::build) unless
/// [`allow_override(true)`](ContainerBuilder::allow_override) was set first.
pub struct ContainerBuilder {
    config: Configuration,
    types: TypeRegistry,
    introspector: Option<Arc<dyn TypeIntrospector>>,
    allow_override: bool,
    defects: Vec<CanisterError>,
}

impl ContainerBuilder {
    fn new() -> Self {
        Self {
            config: Configuration::new(),
            types: TypeRegistry::new(),
            introspector: None,
            allow_override: false,
            defects: Vec::new(),
        }
    }

    /// Allow later definitions to replace earlier ones.
    pub fn allow_override(mut self, allow: bool) -> Self {
        self.allow_override = allow;
        self
    }

    /// Adds one configuration entry of any shape.
    pub fn define(mut self, id: impl Into<ServiceId>, definition: impl Into<Definition>) -> Self {
        if let Err(defect) = self
            .config
            .define(id.into(), definition.into(), self.allow_override)
        {
            self.defects.push(defect);
        }
        self
    }

    /// Registers `id` to a zero-argument factory.
    ///
    /// The factory is invoked at most once; the cache enforces singleton
    /// semantics even though the closure could produce fresh values.
    pub fn factory<T, F>(self, id: impl Into<ServiceId>, f: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.define(id, Definition::factory(f))
    }

    /// Registers `id` to a fallible zero-argument factory.
    pub fn try_factory<T, F>(self, id: impl Into<ServiceId>, f: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> std::result::Result<T, crate::config::BoxError> + Send + Sync + 'static,
    {
        self.define(id, Definition::try_factory(f))
    }

    /// Registers `id` as an alias for `target`.
    pub fn alias(self, id: impl Into<ServiceId>, target: impl Into<ServiceId>) -> Self {
        self.define(id, Definition::alias(target))
    }

    /// Registers `id` to be constructed from explicit positional arguments.
    pub fn arguments(
        self,
        id: impl Into<ServiceId>,
        entries: impl IntoIterator<Item = Definition>,
    ) -> Self {
        self.define(id, Definition::args(entries))
    }

    /// Adds `T`'s constructor descriptor for this container only.
    pub fn register_type<T: Constructible>(mut self) -> Self {
        self.types.register::<T>();
        self
    }

    /// Replaces the introspector consulted for autowiring. The default
    /// reads the process-global type table.
    pub fn introspector(mut self, introspector: Arc<dyn TypeIntrospector>) -> Self {
        self.introspector = Some(introspector);
        self
    }

    /// Freezes the configuration and produces the container.
    ///
    /// # Errors
    /// Surfaces the first defect collected while defining, currently only
    /// [`CanisterError::DuplicateDefinition`].
    #[instrument(skip(self), name = "container_build")]
    pub fn build(mut self) -> Result<Container> {
        if !self.defects.is_empty() {
            return Err(self.defects.remove(0));
        }

        let base = self
            .introspector
            .unwrap_or_else(|| Arc::new(GlobalTypes));
        let introspector: Arc<dyn TypeIntrospector> = if self.types.is_empty() {
            base
        } else {
            Arc::new(LayeredTypes {
                local: self.types,
                base,
            })
        };

        info!(defined = self.config.len(), "container built");
        Ok(Container {
            config: self.config,
            cache: DashMap::new(),
            introspector,
        })
    }
}

/// Container-local descriptors layered over a base introspector.
struct LayeredTypes {
    local: TypeRegistry,
    base: Arc<dyn TypeIntrospector>,
}

impl TypeIntrospector for LayeredTypes {
    fn lookup(&self, id: &ServiceId) -> Option<TypeDescriptor> {
        self.local.lookup(id).or_else(|| self.base.lookup(id))
    }

    fn known_ids(&self) -> Vec<ServiceId> {
        let mut ids = self.local.known_ids();
        ids.extend(self.base.known_ids());
        ids
    }
}

// ============================================================
// Container
// ============================================================

/// Immutable, thread-safe service container with a singleton cache.
///
/// Created by [`ContainerBuilder::build()`]. The configuration and the
/// cache are owned fields; independent containers share nothing but type
/// metadata.
pub struct Container {
    config: Configuration,
    cache: DashMap<ServiceId, Slot>,
    introspector: Arc<dyn TypeIntrospector>,
}

impl Container {
    /// Creates a new builder.
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// True iff `id` has a configuration entry or a cached instance.
    ///
    /// Deliberately ignores the introspector: an unconfigured identifier
    /// can still resolve through autowiring even though `has` is false.
    pub fn has(&self, id: impl Into<ServiceId>) -> bool {
        let id = id.into();
        self.config.contains(&id)
            || self
                .cache
                .get(&id)
                .is_some_and(|slot| slot.get().is_some())
    }

    /// Resolves `id`, constructing and caching the instance on first use.
    ///
    /// Every subsequent call returns the same instance. A failed resolution
    /// leaves no cache entry; the next call retries from scratch.
    pub fn get(&self, id: impl Into<ServiceId>) -> Result<Instance> {
        let mut path = ResolutionPath::default();
        self.get_inner(&id.into(), &mut path)
    }

    /// Resolves `id` and downcasts the instance to `T`.
    pub fn get_as<T: Send + Sync + 'static>(&self, id: impl Into<ServiceId>) -> Result<Arc<T>> {
        let id = id.into();
        let instance = self.get(id.clone())?;
        instance
            .downcast::<T>()
            .map_err(|_| CanisterError::ConstructionFailed {
                id,
                source: format!("resolved instance is not a `{}`", type_name::<T>()).into(),
            })
    }

    /// Resolves `T` under its conventional identifier.
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        self.get_as::<T>(ServiceId::of::<T>())
    }

    fn get_inner(&self, id: &ServiceId, path: &mut ResolutionPath) -> Result<Instance> {
        if let Some(slot) = self.cache.get(id) {
            if let Some(instance) = slot.get() {
                trace!(id = %id, "cache hit");
                return Ok(instance.clone());
            }
        }

        path.enter(id)?;
        // Clone the slot out so no shard lock is held across construction;
        // the OnceCell coalesces concurrent callers of the same identifier.
        let slot = Slot::clone(&self.cache.entry(id.clone()).or_default());
        let result = slot
            .get_or_try_init(|| self.construct(id, path))
            .map(Instance::clone);
        path.leave();
        result
    }

    /// Produces an instance for `id`: configured recipe first, autowiring
    /// otherwise. A configured identifier never falls back to autowiring.
    fn construct(&self, id: &ServiceId, path: &mut ResolutionPath) -> Result<Instance> {
        match self.config.lookup(id) {
            Some(Definition::Factory(factory)) => {
                trace!(id = %id, "invoking factory");
                self.run_factory(id, factory)
            }
            Some(Definition::Alias(target)) => {
                trace!(id = %id, target = %target, "following alias");
                self.get_inner(target, path)
            }
            Some(Definition::Args(entries)) => {
                trace!(id = %id, count = entries.len(), "resolving positional arguments");
                let values = self.resolve_arguments(id, entries, path)?;
                let descriptor = self.descriptor_for(id, path)?;
                descriptor
                    .instantiate(values)
                    .map_err(|source| CanisterError::ConstructionFailed {
                        id: id.clone(),
                        source,
                    })
            }
            Some(Definition::Raw(value)) => {
                Err(CanisterError::InvalidConfiguration(InvalidConfigurationError {
                    id: id.clone(),
                    shape: value.shape(),
                    position: None,
                }))
            }
            None => self.autowire(id, path),
        }
    }

    /// Evaluates positional-argument entries strictly left to right.
    fn resolve_arguments(
        &self,
        id: &ServiceId,
        entries: &[Definition],
        path: &mut ResolutionPath,
    ) -> Result<Vec<Instance>> {
        let mut values = Vec::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            match entry {
                Definition::Factory(factory) => values.push(self.run_factory(id, factory)?),
                Definition::Alias(dependency) => values.push(self.get_inner(dependency, path)?),
                other => {
                    return Err(CanisterError::InvalidConfiguration(
                        InvalidConfigurationError {
                            id: id.clone(),
                            shape: other.shape(),
                            position: Some(position),
                        },
                    ));
                }
            }
        }
        Ok(values)
    }

    /// Constructs `id` by introspecting its registered constructor:
    /// constructible parameters resolve recursively, builtin parameters
    /// fall back to their default value, and anything else fails fast.
    fn autowire(&self, id: &ServiceId, path: &mut ResolutionPath) -> Result<Instance> {
        let descriptor = self.descriptor_for(id, path)?;
        debug!(id = %id, params = descriptor.params().len(), "autowiring");

        let mut values = Vec::with_capacity(descriptor.params().len());
        for (position, param) in descriptor.params().iter().enumerate() {
            match param.kind() {
                ParamKind::Service(dependency) => {
                    values.push(self.get_inner(dependency, path)?);
                }
                ParamKind::Builtin {
                    default: Some(default),
                } => values.push(default()),
                ParamKind::Builtin { default: None } => {
                    return Err(CanisterError::UnresolvableDependency(
                        UnresolvableDependencyError {
                            id: id.clone(),
                            parameter: param.name(),
                            position,
                        },
                    ));
                }
            }
        }

        descriptor
            .instantiate(values)
            .map_err(|source| CanisterError::ConstructionFailed {
                id: id.clone(),
                source,
            })
    }

    fn run_factory(&self, id: &ServiceId, factory: &FactoryFn) -> Result<Instance> {
        factory().map_err(|source| CanisterError::ConstructionFailed {
            id: id.clone(),
            source,
        })
    }

    fn descriptor_for(&self, id: &ServiceId, path: &ResolutionPath) -> Result<TypeDescriptor> {
        self.introspector.lookup(id).ok_or_else(|| {
            CanisterError::NotFound(ServiceNotFoundError {
                requested: id.clone(),
                required_by: path.parent().cloned(),
                suggestions: self.find_suggestions(id),
            })
        })
    }

    /// Known identifiers with names close to the requested one.
    fn find_suggestions(&self, id: &ServiceId) -> Vec<ServiceId> {
        let mut known: Vec<ServiceId> = self.config.ids().cloned().collect();
        known.extend(self.introspector.known_ids());
        known.sort();
        known.dedup();

        let names: Vec<&str> = known
            .iter()
            .map(ServiceId::as_str)
            .filter(|name| *name != id.as_str())
            .collect();
        suggest_similar(id.as_str(), &names, 3)
            .into_iter()
            .map(ServiceId::from)
            .collect()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("defined", &self.config.len())
            .field(
                "cached",
                &self
                    .cache
                    .iter()
                    .filter(|slot| slot.get().is_some())
                    .count(),
            )
            .finish()
    }
}

// ============================================================
// ResolutionPath
// ============================================================

/// Identifiers currently being resolved, outermost first.
///
/// Factories are zero-argument, so all recursion is engine-internal and the
/// path can be threaded through the call stack instead of a thread-local.
#[derive(Debug, Default)]
struct ResolutionPath(Vec<ServiceId>);

impl ResolutionPath {
    /// Marks `id` as in flight; fails if it already is.
    fn enter(&mut self, id: &ServiceId) -> Result<()> {
        if let Some(start) = self.0.iter().position(|visited| visited == id) {
            let mut chain: Vec<ServiceId> = self.0[start..].to_vec();
            chain.push(id.clone());
            warn!(?chain, "circular dependency detected");
            return Err(CanisterError::CircularDependency(CircularDependencyError {
                chain,
            }));
        }
        self.0.push(id.clone());
        Ok(())
    }

    fn leave(&mut self) {
        self.0.pop();
    }

    /// The identifier whose resolution required the current one.
    fn parent(&self) -> Option<&ServiceId> {
        self.0.len().checked_sub(2).and_then(|i| self.0.get(i))
    }
}

// ============================================================
// Prelude
// ============================================================

pub mod prelude {
    pub use super::{Container, ContainerBuilder};
    pub use crate::config::{Definition, Instance, RawValue};
    pub use crate::error::{CanisterError, Result};
    pub use crate::id::ServiceId;
    pub use crate::introspect::{Constructible, TypeDescriptor, TypeRegistration};
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Greeter {
        greeting: String,
    }

    #[test]
    fn same_instance_on_every_get() {
        let container = Container::builder()
            .factory("greeter", || Greeter {
                greeting: "hi".into(),
            })
            .build()
            .unwrap();

        let first = container.get("greeter").unwrap();
        let second = container.get("greeter").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn factory_invoked_at_most_once() {
        let calls = Arc::new(AtomicU32::new(0));

        let container = Container::builder()
            .factory("stamp", {
                let calls = calls.clone();
                move || calls.fetch_add(1, Ordering::SeqCst)
            })
            .build()
            .unwrap();

        let _ = container.get("stamp").unwrap();
        let _ = container.get("stamp").unwrap();
        let _ = container.get("stamp").unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn has_reports_configuration_and_cache_only() {
        struct Standalone;
        impl Constructible for Standalone {
            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::of::<Standalone>().build_with(|_| Ok(Standalone))
            }
        }

        let container = Container::builder()
            .factory("configured", || 1u8)
            .register_type::<Standalone>()
            .build()
            .unwrap();

        assert!(container.has("configured"));
        assert!(!container.has("unknown"));
        // Introspectable but unconfigured: has() is false until resolved.
        assert!(!container.has(ServiceId::of::<Standalone>()));
        container.resolve::<Standalone>().unwrap();
        assert!(container.has(ServiceId::of::<Standalone>()));
    }

    #[test]
    fn configured_id_never_reports_not_found() {
        let container = Container::builder()
            .factory("configured", || 1u8)
            .build()
            .unwrap();

        assert!(container.has("configured"));
        assert!(
            !matches!(container.get("configured"), Err(CanisterError::NotFound(_)))
        );
    }

    #[test]
    fn alias_shares_one_instance_with_target() {
        let calls = Arc::new(AtomicU32::new(0));

        let container = Container::builder()
            .factory("file_logger", {
                let calls = calls.clone();
                move || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Greeter {
                        greeting: "log".into(),
                    }
                }
            })
            .alias("logger", "file_logger")
            .build()
            .unwrap();

        let via_alias = container.get("logger").unwrap();
        let via_target = container.get("file_logger").unwrap();

        assert!(Arc::ptr_eq(&via_alias, &via_target));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // Both identifiers hold a cache entry for the one instance.
        assert!(container.has("logger"));
        assert!(container.has("file_logger"));
    }

    #[derive(Debug)]
    struct Pair {
        first: u32,
        second: u32,
    }

    impl Constructible for Pair {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::of::<Pair>()
                .required("first")
                .required("second")
                .build_with(|args| {
                    Ok(Pair {
                        first: args.next_value()?,
                        second: args.next_value()?,
                    })
                })
        }
    }

    #[test]
    fn positional_arguments_resolve_in_order() {
        let x_calls = Arc::new(AtomicU32::new(0));
        let y_calls = Arc::new(AtomicU32::new(0));

        let container = Container::builder()
            .factory("x", {
                let x_calls = x_calls.clone();
                move || {
                    x_calls.fetch_add(1, Ordering::SeqCst);
                    10u32
                }
            })
            .factory("y", {
                let y_calls = y_calls.clone();
                move || {
                    y_calls.fetch_add(1, Ordering::SeqCst);
                    20u32
                }
            })
            .arguments(
                ServiceId::of::<Pair>(),
                [Definition::from("x"), Definition::from("y")],
            )
            .register_type::<Pair>()
            .build()
            .unwrap();

        let pair = container.resolve::<Pair>().unwrap();
        assert_eq!(pair.first, 10);
        assert_eq!(pair.second, 20);

        let again = container.resolve::<Pair>().unwrap();
        assert!(Arc::ptr_eq(&pair, &again));
        assert_eq!(x_calls.load(Ordering::SeqCst), 1);
        assert_eq!(y_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn positional_arguments_accept_inline_factories() {
        let container = Container::builder()
            .arguments(
                ServiceId::of::<Pair>(),
                [
                    Definition::factory(|| 1u32),
                    Definition::factory(|| 2u32),
                ],
            )
            .register_type::<Pair>()
            .build()
            .unwrap();

        let pair = container.resolve::<Pair>().unwrap();
        assert_eq!((pair.first, pair.second), (1, 2));
    }

    struct Engine;

    impl Constructible for Engine {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::of::<Engine>().build_with(|_| Ok(Engine))
        }
    }

    struct Car {
        engine: Arc<Engine>,
    }

    impl Constructible for Car {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::of::<Car>()
                .depends_on::<Engine>("engine")
                .build_with(|args| {
                    Ok(Car {
                        engine: args.next_arc()?,
                    })
                })
        }
    }

    #[test]
    fn autowiring_resolves_unconfigured_dependency_chain() {
        let container = Container::builder()
            .register_type::<Engine>()
            .register_type::<Car>()
            .build()
            .unwrap();

        let car = container.resolve::<Car>().unwrap();
        let engine = container.resolve::<Engine>().unwrap();
        assert!(Arc::ptr_eq(&car.engine, &engine));
    }

    #[test]
    fn builtin_parameter_falls_back_to_default() {
        struct Retrier {
            attempts: u32,
        }
        impl Constructible for Retrier {
            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::of::<Retrier>()
                    .default_value("attempts", 42u32)
                    .build_with(|args| {
                        Ok(Retrier {
                            attempts: args.next_value()?,
                        })
                    })
            }
        }

        let container = Container::builder()
            .register_type::<Retrier>()
            .build()
            .unwrap();

        assert_eq!(container.resolve::<Retrier>().unwrap().attempts, 42);
    }

    #[test]
    fn required_builtin_parameter_fails_fast() {
        #[derive(Debug)]
        struct Webhook;
        impl Constructible for Webhook {
            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::of::<Webhook>()
                    .required("url")
                    .depends_on::<Engine>("engine")
                    .build_with(|_| Ok(Webhook))
            }
        }

        // Engine deliberately unregistered: resolution must fail on `url`
        // before ever looking at the later parameter.
        let container = Container::builder()
            .register_type::<Webhook>()
            .build()
            .unwrap();

        match container.resolve::<Webhook>().unwrap_err() {
            CanisterError::UnresolvableDependency(e) => {
                assert_eq!(e.parameter, "url");
                assert_eq!(e.position, 0);
                assert_eq!(e.id, ServiceId::of::<Webhook>());
            }
            other => panic!("expected UnresolvableDependency, got: {other:?}"),
        }
    }

    #[test]
    fn raw_definition_rejected_and_never_cached() {
        let container = Container::builder()
            .define("port", 12345i64)
            .build()
            .unwrap();

        for _ in 0..2 {
            // Still failing on the second call: nothing was cached.
            match container.get("port").unwrap_err() {
                CanisterError::InvalidConfiguration(e) => {
                    assert_eq!(e.id, ServiceId::from("port"));
                    assert_eq!(e.shape, "integer");
                    assert_eq!(e.position, None);
                }
                other => panic!("expected InvalidConfiguration, got: {other:?}"),
            }
        }
    }

    #[test]
    fn malformed_argument_entry_reports_position() {
        let container = Container::builder()
            .arguments(
                ServiceId::of::<Pair>(),
                [Definition::factory(|| 1u32), Definition::from(7i64)],
            )
            .register_type::<Pair>()
            .build()
            .unwrap();

        match container.resolve::<Pair>().unwrap_err() {
            CanisterError::InvalidConfiguration(e) => {
                assert_eq!(e.position, Some(1));
                assert_eq!(e.shape, "integer");
            }
            other => panic!("expected InvalidConfiguration, got: {other:?}"),
        }
    }

    #[test]
    fn unknown_identifier_reports_not_found() {
        let container = Container::builder().build().unwrap();

        match container.get("NoSuchType").unwrap_err() {
            CanisterError::NotFound(e) => {
                assert_eq!(e.requested, ServiceId::from("NoSuchType"));
                assert_eq!(e.required_by, None);
            }
            other => panic!("expected NotFound, got: {other:?}"),
        }
    }

    #[test]
    fn alias_to_unknown_target_names_the_edge() {
        let container = Container::builder()
            .alias("logger", "missing")
            .build()
            .unwrap();

        assert!(container.has("logger"));
        match container.get("logger").unwrap_err() {
            CanisterError::NotFound(e) => {
                assert_eq!(e.requested, ServiceId::from("missing"));
                assert_eq!(e.required_by, Some(ServiceId::from("logger")));
            }
            other => panic!("expected NotFound, got: {other:?}"),
        }
    }

    #[test]
    fn circular_aliases_report_the_chain() {
        let container = Container::builder()
            .alias("a", "b")
            .alias("b", "a")
            .build()
            .unwrap();

        match container.get("a").unwrap_err() {
            CanisterError::CircularDependency(e) => {
                let chain: Vec<&str> =
                    e.chain.iter().map(ServiceId::as_str).collect();
                assert_eq!(chain, vec!["a", "b", "a"]);
            }
            other => panic!("expected CircularDependency, got: {other:?}"),
        }
    }

    #[test]
    fn circular_autowiring_reports_the_chain() {
        #[derive(Debug)]
        struct Chicken;
        struct Egg;
        impl Constructible for Chicken {
            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::of::<Chicken>()
                    .depends_on::<Egg>("egg")
                    .build_with(|_| Ok(Chicken))
            }
        }
        impl Constructible for Egg {
            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::of::<Egg>()
                    .depends_on::<Chicken>("chicken")
                    .build_with(|_| Ok(Egg))
            }
        }

        let container = Container::builder()
            .register_type::<Chicken>()
            .register_type::<Egg>()
            .build()
            .unwrap();

        match container.resolve::<Chicken>().unwrap_err() {
            CanisterError::CircularDependency(e) => {
                assert_eq!(e.chain.len(), 3);
                assert_eq!(e.chain.first(), e.chain.last());
            }
            other => panic!("expected CircularDependency, got: {other:?}"),
        }
    }

    #[test]
    fn duplicate_definition_fails_at_build() {
        let result = Container::builder()
            .factory("x", || 1u8)
            .factory("x", || 2u8)
            .build();

        match result.unwrap_err() {
            CanisterError::DuplicateDefinition(e) => {
                assert_eq!(e.id, ServiceId::from("x"));
            }
            other => panic!("expected DuplicateDefinition, got: {other:?}"),
        }
    }

    #[test]
    fn duplicate_definition_allowed_with_override() {
        let container = Container::builder()
            .allow_override(true)
            .factory("x", || 1u8)
            .factory("x", || 2u8)
            .build()
            .unwrap();

        assert_eq!(*container.get_as::<u8>("x").unwrap(), 2);
    }

    #[test]
    fn failed_factory_is_retried_on_next_get() {
        let calls = Arc::new(AtomicU32::new(0));

        let container = Container::builder()
            .try_factory("flaky", {
                let calls = calls.clone();
                move || {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err("first call fails".into())
                    } else {
                        Ok(7u32)
                    }
                }
            })
            .build()
            .unwrap();

        assert!(matches!(
            container.get("flaky"),
            Err(CanisterError::ConstructionFailed { .. })
        ));
        assert_eq!(*container.get_as::<u32>("flaky").unwrap(), 7);
    }

    #[test]
    fn typed_access_reports_mismatch() {
        let container = Container::builder()
            .factory("greeter", || Greeter {
                greeting: "hi".into(),
            })
            .build()
            .unwrap();

        assert!(matches!(
            container.get_as::<u32>("greeter"),
            Err(CanisterError::ConstructionFailed { .. })
        ));
        // The correctly-typed access still works afterwards.
        assert_eq!(
            container.get_as::<Greeter>("greeter").unwrap().greeting,
            "hi"
        );
    }

    #[test]
    fn not_found_suggests_similar_identifiers() {
        let container = Container::builder()
            .factory("mailer.primary", || 1u8)
            .build()
            .unwrap();

        match container.get("mailer").unwrap_err() {
            CanisterError::NotFound(e) => {
                assert_eq!(e.suggestions, vec![ServiceId::from("mailer.primary")]);
            }
            other => panic!("expected NotFound, got: {other:?}"),
        }
    }

    #[test]
    fn concurrent_gets_materialize_once() {
        let calls = Arc::new(AtomicU32::new(0));

        let container = Container::builder()
            .factory("slow", {
                let calls = calls.clone();
                move || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    std::thread::sleep(std::time::Duration::from_millis(20));
                    String::from("ready")
                }
            })
            .build()
            .unwrap();

        let instances: Vec<Instance> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| container.get("slow").unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for instance in &instances[1..] {
            assert!(Arc::ptr_eq(&instances[0], instance));
        }
    }

    #[test]
    fn independent_containers_share_nothing() {
        let first = Container::builder()
            .factory("value", || 1u8)
            .build()
            .unwrap();
        let second = Container::builder()
            .factory("value", || 2u8)
            .build()
            .unwrap();

        assert_eq!(*first.get_as::<u8>("value").unwrap(), 1);
        assert_eq!(*second.get_as::<u8>("value").unwrap(), 2);
    }

    #[test]
    fn debug_reports_counts() {
        let container = Container::builder()
            .factory("a", || 1u8)
            .factory("b", || 2u8)
            .build()
            .unwrap();
        container.get("a").unwrap();

        let rendered = format!("{container:?}");
        assert!(rendered.contains("defined: 2"));
        assert!(rendered.contains("cached: 1"));
    }
}
