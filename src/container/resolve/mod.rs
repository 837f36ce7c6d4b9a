mod collect;
mod object_map;
mod proxy;

use std::any::TypeId;
use std::error::Error;
use std::sync::Arc;

use snafu::prelude::*;

use crate::container::Managed;
use crate::key::{Key, TypedKey};
use crate::provider::context::CallContext;
use crate::util::any::Downcast;

pub use collect::Deferred;
pub(crate) use collect::{deferred_handles, resolve_ordered};
pub(crate) use object_map::{CachedObject, ObjectMap};
pub(crate) use proxy::ContextForwardingProxy;

/// The type-erased resolution interface implemented by both container
/// levels and by the proxies handed to providers.
#[cfg_attr(test, mockall::automock)]
pub trait Resolve: Send + Sync {
    /// Resolves the object identified by `key`, starting a fresh call
    /// context.
    ///
    /// # Errors
    ///
    /// Returns an error if no registration matches the key, a dependency
    /// chain loops back onto itself, or a provider fails.
    fn dyn_resolve(&self, key: &dyn Key) -> Result<Box<dyn Managed>, ResolveError>;

    /// Resolves `key` as a dependency of an ongoing resolution, extending
    /// the given call context by one frame.
    ///
    /// # Errors
    ///
    /// See [`Resolve::dyn_resolve`].
    fn dyn_resolve_dependency<'a>(
        &self,
        key: &dyn Key,
        context: &'a CallContext<'a>,
    ) -> Result<Box<dyn Managed>, ResolveError>;

    /// Returns the keys of every registration whose target type is
    /// `target`, in registration order. Keys visible at this level but
    /// registered at the parent come first.
    fn registered_keys(&self, target: TypeId) -> Vec<Box<dyn Key>>;
}

/// Statically typed resolution, implemented for everything that implements
/// [`Resolve`].
pub trait Resolver: Resolve {
    /// Resolves the object identified by `key` to its concrete type.
    ///
    /// # Errors
    ///
    /// See [`Resolve::dyn_resolve`].
    fn resolve<K>(&self, key: K) -> Result<K::Target, ResolveError>
    where
        K: TypedKey,
    {
        match self.dyn_resolve(&key) {
            Ok(boxed) => match boxed.downcast::<K::Target>() {
                Ok(object) => Ok(*object),
                Err(_) => unreachable!("the object's type should be `K::Target`"),
            },
            Err(err) => Err(err),
        }
    }

    /// Resolves every registration of type `T` visible from this level, in
    /// registration order. A type with no registrations at all yields an
    /// empty vector, not an error.
    ///
    /// # Errors
    ///
    /// Returns the first resolution error encountered, if any.
    fn resolve_all<T>(&self) -> Result<Vec<T>, ResolveError>
    where
        T: Managed,
    {
        resolve_ordered(self.upcast_dyn())
    }

    fn upcast_dyn(&self) -> &dyn Resolve;
}

impl<T> Resolver for T
where
    T: Resolve,
{
    fn upcast_dyn(&self) -> &dyn Resolve {
        self
    }
}

impl Resolver for dyn Resolve + '_ {
    fn upcast_dyn(&self) -> &dyn Resolve {
        self
    }
}

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum ResolveError {
    #[snafu(display("could not find a registration for {key}"))]
    #[non_exhaustive]
    NotFound { key: Box<dyn Key> },
    #[snafu(display("could not construct {key} which depends on itself somehow"))]
    #[non_exhaustive]
    CyclicDependency { key: Box<dyn Key> },
    #[snafu(display("could not construct {key}"))]
    #[non_exhaustive]
    Construction {
        key: Box<dyn Key>,
        source: Arc<dyn Error + Send + Sync>,
    },
}

impl Clone for ResolveError {
    fn clone(&self) -> Self {
        match self {
            Self::NotFound { key } => Self::NotFound {
                key: key.dyn_clone(),
            },
            Self::CyclicDependency { key } => Self::CyclicDependency {
                key: key.dyn_clone(),
            },
            Self::Construction { key, source } => Self::Construction {
                key: key.dyn_clone(),
                source: Arc::clone(source),
            },
        }
    }
}
