//! Constructor introspection without runtime reflection.
//!
//! Rust cannot enumerate a type's constructor parameters at runtime, so
//! autowiring consults an explicit registration table instead: every
//! autowirable type contributes a [`TypeDescriptor`] describing its
//! constructor, either at link time through [`inventory`] or at runtime.
//!
//! # Examples
//! ```
//! use canister_core::introspect::{
//!     Constructible, TypeDescriptor, TypeRegistration,
//! };
//!
//! struct Clock;
//!
//! impl Constructible for Clock {
//!     fn descriptor() -> TypeDescriptor {
//!         TypeDescriptor::of::<Clock>().build_with(|_| Ok(Clock))
//!     }
//! }
//!
//! inventory::submit! { TypeRegistration::of::<Clock>() }
//! ```

use std::any::type_name;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::debug;

use crate::config::{BoxError, Instance};
use crate::id::ServiceId;

/// Type-erased construct function: consumes resolved positional values and
/// produces the instance.
pub type ConstructFn =
    Arc<dyn Fn(Vec<Instance>) -> std::result::Result<Instance, BoxError> + Send + Sync>;

/// Supplies a parameter's default value.
pub type DefaultFn = Arc<dyn Fn() -> Instance + Send + Sync>;

/// How one constructor parameter is satisfied.
#[derive(Clone)]
pub enum ParamKind {
    /// The declared type is constructible; resolved through the container.
    Service(ServiceId),
    /// A primitive/builtin type, usable only through its default value.
    Builtin { default: Option<DefaultFn> },
}

impl fmt::Debug for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Service(id) => write!(f, "Service({id})"),
            ParamKind::Builtin { default } => {
                write!(f, "Builtin {{ default: {} }}", default.is_some())
            }
        }
    }
}

/// Describes one parameter of a constructor.
///
/// Position is the index within [`TypeDescriptor::params`]. Parameter
/// descriptors are consulted transiently during autowiring and never
/// attached to resolved instances.
#[derive(Clone)]
pub struct ParamSpec {
    name: &'static str,
    kind: ParamKind,
}

impl ParamSpec {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> &ParamKind {
        &self.kind
    }
}

impl fmt::Debug for ParamSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParamSpec({}: {:?})", self.name, self.kind)
    }
}

/// A type's constructor, as the container sees it: the identifier it is
/// registered under, the ordered parameter list, and the construct function.
#[derive(Clone)]
pub struct TypeDescriptor {
    id: ServiceId,
    params: Vec<ParamSpec>,
    construct: ConstructFn,
}

impl TypeDescriptor {
    /// Starts a descriptor for `T`, keyed by its type name.
    pub fn of<T: Send + Sync + 'static>() -> DescriptorBuilder {
        Self::keyed(ServiceId::of::<T>())
    }

    /// Starts a descriptor under an explicit identifier.
    pub fn keyed(id: impl Into<ServiceId>) -> DescriptorBuilder {
        DescriptorBuilder {
            id: id.into(),
            params: Vec::new(),
        }
    }

    pub fn id(&self) -> &ServiceId {
        &self.id
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Invokes the constructor with already-resolved positional values.
    pub(crate) fn instantiate(
        &self,
        values: Vec<Instance>,
    ) -> std::result::Result<Instance, BoxError> {
        (self.construct)(values)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("id", &self.id)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Fluent builder for [`TypeDescriptor`], finished by
/// [`build_with`](DescriptorBuilder::build_with).
pub struct DescriptorBuilder {
    id: ServiceId,
    params: Vec<ParamSpec>,
}

impl DescriptorBuilder {
    /// Declares a parameter whose type is another constructible type,
    /// resolved under `D`'s conventional identifier.
    pub fn depends_on<D: ?Sized + 'static>(self, name: &'static str) -> Self {
        self.depends_on_id(name, ServiceId::of::<D>())
    }

    /// Declares a constructible-type parameter under an explicit identifier.
    pub fn depends_on_id(mut self, name: &'static str, id: impl Into<ServiceId>) -> Self {
        self.params.push(ParamSpec {
            name,
            kind: ParamKind::Service(id.into()),
        });
        self
    }

    /// Declares a builtin parameter with a default value.
    ///
    /// The default is shared: every autowired construction receives the
    /// same allocation.
    pub fn default_value<V: Send + Sync + 'static>(mut self, name: &'static str, value: V) -> Self {
        let shared: Instance = Arc::new(value);
        self.params.push(ParamSpec {
            name,
            kind: ParamKind::Builtin {
                default: Some(Arc::new(move || shared.clone())),
            },
        });
        self
    }

    /// Declares a builtin parameter with no default. Autowiring can never
    /// satisfy it; explicit positional-argument configuration can.
    pub fn required(mut self, name: &'static str) -> Self {
        self.params.push(ParamSpec {
            name,
            kind: ParamKind::Builtin { default: None },
        });
        self
    }

    /// Finishes the descriptor with the function that builds the instance
    /// from the resolved values, in declaration order.
    pub fn build_with<T, F>(self, build: F) -> TypeDescriptor
    where
        T: Send + Sync + 'static,
        F: Fn(&mut Arguments) -> std::result::Result<T, BoxError> + Send + Sync + 'static,
    {
        TypeDescriptor {
            id: self.id,
            params: self.params,
            construct: Arc::new(move |values| {
                let mut args = Arguments::new(values);
                Ok(Arc::new(build(&mut args)?) as Instance)
            }),
        }
    }
}

/// Consuming cursor over the positional values handed to a construct
/// function.
pub struct Arguments {
    values: std::vec::IntoIter<Instance>,
    taken: usize,
}

impl Arguments {
    fn new(values: Vec<Instance>) -> Self {
        Self {
            values: values.into_iter(),
            taken: 0,
        }
    }

    /// Takes the next value as a shared `Arc<T>`.
    pub fn next_arc<T: Send + Sync + 'static>(
        &mut self,
    ) -> std::result::Result<Arc<T>, BoxError> {
        let position = self.taken;
        let value = self
            .values
            .next()
            .ok_or_else(|| format!("no argument left at position {position}"))?;
        self.taken += 1;
        value.downcast::<T>().map_err(|_| {
            format!(
                "argument at position {position} is not a `{}`",
                type_name::<T>()
            )
            .into()
        })
    }

    /// Takes the next value, cloning it out of the shared allocation.
    pub fn next_value<T: Clone + Send + Sync + 'static>(
        &mut self,
    ) -> std::result::Result<T, BoxError> {
        Ok(self.next_arc::<T>()?.as_ref().clone())
    }

    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

/// Looks up constructor descriptors for autowiring.
///
/// The container consults exactly one of these; the default reads the
/// process-global table (see [`register_type`]).
pub trait TypeIntrospector: Send + Sync {
    /// The descriptor registered under `id`, if any.
    fn lookup(&self, id: &ServiceId) -> Option<TypeDescriptor>;

    /// Every identifier this introspector knows. Diagnostics only.
    fn known_ids(&self) -> Vec<ServiceId> {
        Vec::new()
    }
}

/// A plain table of constructor descriptors.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: HashMap<ServiceId, TypeDescriptor>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry seeded with every link-time [`TypeRegistration`]
    /// submission in the program.
    pub fn collected() -> Self {
        let mut registry = Self::new();
        for registration in inventory::iter::<TypeRegistration> {
            registry.insert((registration.descriptor)());
        }
        registry
    }

    /// Inserts a descriptor, replacing any previous entry for the same id.
    pub fn insert(&mut self, descriptor: TypeDescriptor) -> Option<TypeDescriptor> {
        debug!(
            id = %descriptor.id(),
            params = descriptor.params().len(),
            "registered constructor descriptor"
        );
        self.types.insert(descriptor.id().clone(), descriptor)
    }

    /// Registers `T` through its [`Constructible`] declaration.
    pub fn register<T: Constructible>(&mut self) {
        self.insert(T::descriptor());
    }

    pub fn contains(&self, id: &ServiceId) -> bool {
        self.types.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeIntrospector for TypeRegistry {
    fn lookup(&self, id: &ServiceId) -> Option<TypeDescriptor> {
        self.types.get(id).cloned()
    }

    fn known_ids(&self) -> Vec<ServiceId> {
        self.types.keys().cloned().collect()
    }
}

/// A type that can declare its own constructor to the container.
pub trait Constructible: Send + Sync + Sized + 'static {
    /// The constructor descriptor for this type.
    fn descriptor() -> TypeDescriptor;
}

/// Link-time registration record; submit with `inventory::submit!` to make
/// a type autowirable process-wide (see the module example).
pub struct TypeRegistration {
    descriptor: fn() -> TypeDescriptor,
}

impl TypeRegistration {
    pub const fn of<T: Constructible>() -> Self {
        Self {
            descriptor: T::descriptor,
        }
    }
}

inventory::collect!(TypeRegistration);

static GLOBAL: Lazy<RwLock<TypeRegistry>> =
    Lazy::new(|| RwLock::new(TypeRegistry::collected()));

/// Registers `T` in the process-global table at runtime, for hosts that
/// cannot use link-time submission.
pub fn register_type<T: Constructible>() {
    GLOBAL.write().register::<T>();
}

/// Introspector view of the process-global table; the container default.
#[derive(Clone, Copy, Debug, Default)]
pub struct GlobalTypes;

impl TypeIntrospector for GlobalTypes {
    fn lookup(&self, id: &ServiceId) -> Option<TypeDescriptor> {
        GLOBAL.read().lookup(id)
    }

    fn known_ids(&self) -> Vec<ServiceId> {
        GLOBAL.read().known_ids()
    }
}
