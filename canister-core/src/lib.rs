//! Core resolution engine for the canister service container.

pub mod config;
pub mod container;
pub mod error;
pub mod id;
pub mod introspect;

pub use config::{BoxError, Definition, FactoryFn, Instance, RawValue};
pub use container::{Container, ContainerBuilder, prelude};
pub use error::{CanisterError, Result};
pub use id::ServiceId;
pub use introspect::{
    Arguments, Constructible, GlobalTypes, ParamKind, ParamSpec, TypeDescriptor,
    TypeIntrospector, TypeRegistration, TypeRegistry, register_type,
};
