//! # Canister — a minimal singleton service container
//!
//! Identifiers map to recipes (factory, alias, positional arguments) or
//! fall back to constructor autowiring through a type registry. Every
//! identifier resolves to one shared instance per container.

pub use canister_core::*;
pub use canister_support::*;
