use std::any::TypeId;
use std::fmt::{Debug, Formatter, Result as FmtResult};

use crate::container::resolve::{Resolve, ResolveError};
use crate::container::Managed;
use crate::key::Key;
use crate::util::any::Downcast;

/// Resolves every registration targeting `T`, preserving registration
/// order. No matching registration is not an error: callers asking for all
/// implementations of an interface get an empty vector.
pub(crate) fn resolve_ordered<T>(resolver: &dyn Resolve) -> Result<Vec<T>, ResolveError>
where
    T: Managed,
{
    resolver
        .registered_keys(TypeId::of::<T>())
        .iter()
        .map(|key| {
            resolver.dyn_resolve(key.as_ref()).map(|boxed| {
                let res = boxed.downcast::<T>();
                *res.unwrap_or_else(|_| unreachable!("the object's type should be `T`"))
            })
        })
        .collect()
}

/// Builds one [`Deferred`] handle per registration targeting `T`, without
/// resolving anything yet.
pub(crate) fn deferred_handles<T, H>(handle: &H) -> Vec<Deferred<T>>
where
    T: Managed,
    H: Resolve + Clone + Send + Sync + 'static,
{
    handle
        .registered_keys(TypeId::of::<T>())
        .into_iter()
        .map(|key| {
            let resolver = handle.clone();
            let target = key.dyn_clone();
            Deferred::new(key, move || {
                resolver.dyn_resolve(target.as_ref()).map(|boxed| {
                    let res = boxed.downcast::<T>();
                    *res.unwrap_or_else(|_| unreachable!("the object's type should be `T`"))
                })
            })
        })
        .collect()
}

/// A handle which resolves its registration on demand instead of eagerly.
///
/// Each [`get`](Deferred::get) call performs a resolution. For singleton
/// and per-request registrations that still returns the one cached
/// instance; transient registrations construct afresh on every call.
pub struct Deferred<T: Managed> {
    key: Box<dyn Key>,
    resolve: Box<dyn Fn() -> Result<T, ResolveError> + Send + Sync>,
}

impl<T: Managed> Deferred<T> {
    fn new<F>(key: Box<dyn Key>, resolve: F) -> Self
    where
        F: Fn() -> Result<T, ResolveError> + Send + Sync + 'static,
    {
        Self {
            key,
            resolve: Box::new(resolve),
        }
    }

    /// The key this handle will resolve.
    pub fn key(&self) -> &dyn Key {
        self.key.as_ref()
    }

    /// Resolves the underlying registration.
    ///
    /// # Errors
    ///
    /// See [`Resolve::dyn_resolve`].
    pub fn get(&self) -> Result<T, ResolveError> {
        (self.resolve)()
    }
}

impl<T: Managed> Debug for Deferred<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Deferred<T>")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
