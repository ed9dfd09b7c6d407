//! Service identifiers.
//!
//! A [`ServiceId`] names one constructible thing. It is the lookup key for
//! configuration entries, cached instances, and the type registry, and is
//! opaque to the engine beyond equality and hashing.

use std::any::type_name;
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

/// Names a service in the container.
///
/// For autowirable types the conventional identifier is the fully qualified
/// type name, produced by [`ServiceId::of`]; arbitrary string keys work just
/// as well for hand-wired entries. Cloning is cheap.
///
/// # Examples
/// ```
/// use canister_core::id::ServiceId;
///
/// struct Mailer;
///
/// let by_type = ServiceId::of::<Mailer>();
/// assert!(by_type.as_str().ends_with("Mailer"));
///
/// let by_key: ServiceId = "mailer.primary".into();
/// assert_eq!(by_key.as_str(), "mailer.primary");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceId(Arc<str>);

impl ServiceId {
    /// Creates the conventional identifier for type `T`.
    #[inline]
    pub fn of<T: ?Sized>() -> Self {
        Self(Arc::from(type_name::<T>()))
    }

    /// The identifier as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ServiceId {
    #[inline]
    fn from(id: &str) -> Self {
        Self(Arc::from(id))
    }
}

impl From<String> for ServiceId {
    #[inline]
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

impl From<&ServiceId> for ServiceId {
    #[inline]
    fn from(id: &ServiceId) -> Self {
        id.clone()
    }
}

impl AsRef<str> for ServiceId {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ServiceId {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceId({:?})", &*self.0)
    }
}

impl Serialize for ServiceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
