//! Error types for container operations.
//!
//! Every failure carries enough context (the offending identifier, and for
//! dependency failures the parameter name and position) to pinpoint the
//! failing edge of the dependency graph without a stack trace.

use std::fmt;

use canister_support::rendering::{render_chain, shorten_id};

use crate::id::ServiceId;

/// Main error type for building and resolving from a container.
#[derive(Debug, thiserror::Error)]
pub enum CanisterError {
    /// The identifier has neither a configuration entry nor a registered
    /// constructor descriptor.
    #[error("{}", .0)]
    NotFound(ServiceNotFoundError),

    /// A configuration entry exists but is not a usable recipe.
    #[error("{}", .0)]
    InvalidConfiguration(InvalidConfigurationError),

    /// Autowiring hit a constructor parameter it cannot satisfy.
    #[error("{}", .0)]
    UnresolvableDependency(UnresolvableDependencyError),

    /// Resolution re-entered an identifier already being resolved.
    #[error("{}", .0)]
    CircularDependency(CircularDependencyError),

    /// A factory or constructor reported an error of its own.
    #[error("failed to construct `{id}`: {source}")]
    ConstructionFailed {
        id: ServiceId,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Two definitions were given for one identifier while overriding
    /// was disabled. Raised by [`ContainerBuilder::build`].
    ///
    /// [`ContainerBuilder::build`]: crate::container::ContainerBuilder::build
    #[error("{}", .0)]
    DuplicateDefinition(DuplicateDefinitionError),
}

/// Convenient Result type for container operations.
pub type Result<T> = std::result::Result<T, CanisterError>;

/// A requested service could not be located anywhere.
#[derive(Debug)]
pub struct ServiceNotFoundError {
    /// The identifier that was requested.
    pub requested: ServiceId,
    /// The identifier whose resolution needed it, if any.
    pub required_by: Option<ServiceId>,
    /// Known identifiers with similar names.
    pub suggestions: Vec<ServiceId>,
}

impl fmt::Display for ServiceNotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "service `{}` is not defined and has no registered constructor",
            self.requested
        )?;
        if let Some(ref parent) = self.required_by {
            write!(f, "\n  required by: {parent}")?;
        }
        if !self.suggestions.is_empty() {
            write!(f, "\n  did you mean:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {}", shorten_id(suggestion.as_str()))?;
            }
        }
        write!(
            f,
            "\n  hint: define `{}` on the builder or register its type descriptor",
            shorten_id(self.requested.as_str())
        )
    }
}

/// A configuration entry has a shape the engine does not recognize.
#[derive(Debug)]
pub struct InvalidConfigurationError {
    /// The identifier whose definition is malformed.
    pub id: ServiceId,
    /// Short name of the unexpected shape, e.g. `"integer"`.
    pub shape: &'static str,
    /// Set when the offending value is an entry of an argument list.
    pub position: Option<usize>,
}

impl fmt::Display for InvalidConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(position) => write!(
                f,
                "invalid definition for `{}`: argument {position} must be a \
                 factory or a service identifier, found {}",
                self.id, self.shape
            ),
            None => write!(
                f,
                "invalid definition for `{}`: expected a factory, an alias, \
                 or an argument list, found {}",
                self.id, self.shape
            ),
        }
    }
}

/// A constructor parameter with no constructible type and no default.
#[derive(Debug)]
pub struct UnresolvableDependencyError {
    /// The identifier being constructed.
    pub id: ServiceId,
    /// The parameter that could not be satisfied.
    pub parameter: &'static str,
    /// Zero-based position of the parameter.
    pub position: usize,
}

impl fmt::Display for UnresolvableDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot autowire `{}`: parameter `{}` (position {}) has neither \
             a constructible type nor a default value",
            self.id, self.parameter, self.position
        )
    }
}

/// The resolution path closed on itself.
///
/// The chain starts and ends with the repeated identifier, e.g.
/// `a -> b -> a`.
#[derive(Debug)]
pub struct CircularDependencyError {
    pub chain: Vec<ServiceId>,
}

impl fmt::Display for CircularDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "circular dependency: {}", render_chain(&self.chain))?;
        write!(
            f,
            "\n  hint: provide one side of the cycle through a factory definition"
        )
    }
}

/// An identifier was defined twice while overriding was disabled.
#[derive(Debug)]
pub struct DuplicateDefinitionError {
    pub id: ServiceId,
}

impl fmt::Display for DuplicateDefinitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "service `{}` is defined twice", self.id)?;
        write!(
            f,
            "\n  hint: call allow_override(true) before redefining an identifier"
        )
    }
}
