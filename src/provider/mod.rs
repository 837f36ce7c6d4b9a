pub mod context;
pub mod factory;
pub mod instance;

use std::fmt::Debug;

use crate::container::resolve::{Resolve, ResolveError, Resolver};
use crate::container::{Managed, SharedManaged};
use crate::provider::context::CallContext;

/// A factory which constructs objects of one registered type.
///
/// A provider is stateless by contract: it may be called from multiple
/// threads and must hand back a freshly constructed object on every call.
/// Caching and sharing are the containers' concern, never the provider's.
/// Dependencies are pulled from the [`Resolve`] instance passed in, and the
/// `context` carries the chain of keys currently under construction.
///
/// Implement [`TypedProvider`] instead; this trait is provided through a
/// blanket implementation.
pub trait Provider: Debug + Send + Sync + 'static {
    /// Constructs a new type-erased object.
    ///
    /// # Errors
    ///
    /// Returns an error if a dependency can't be resolved or the
    /// construction itself fails.
    fn dyn_provide(
        &self,
        resolver: &dyn Resolve,
        context: &CallContext<'_>,
    ) -> Result<Box<dyn Managed>, ResolveError>;
}

/// The statically typed variant of [`Provider`].
pub trait TypedProvider: Provider {
    /// The type this provider constructs.
    type Output: Managed;

    /// Constructs a new object of type [`TypedProvider::Output`].
    ///
    /// # Errors
    ///
    /// Returns an error if a dependency can't be resolved or the
    /// construction itself fails.
    fn provide<R>(
        &self,
        resolver: &R,
        context: &CallContext<'_>,
    ) -> Result<Self::Output, ResolveError>
    where
        R: Resolver + ?Sized;
}

impl<T: TypedProvider> Provider for T {
    fn dyn_provide(
        &self,
        resolver: &dyn Resolve,
        context: &CallContext<'_>,
    ) -> Result<Box<dyn Managed>, ResolveError> {
        self.provide(resolver, context)
            .map(|obj| -> Box<dyn Managed> { Box::new(obj) })
    }
}

/// A [`Provider`] whose output can be cached by a container and handed out
/// repeatedly, which is what singleton and per-request registrations need.
///
/// The freshly-constructed contract still applies: each call constructs a
/// new object, and the owning container decides whether to cache it.
pub trait SharedProvider: Provider {
    /// Constructs a new type-erased shareable object.
    ///
    /// # Errors
    ///
    /// Returns an error if a dependency can't be resolved or the
    /// construction itself fails.
    fn dyn_provide_shared(
        &self,
        resolver: &dyn Resolve,
        context: &CallContext<'_>,
    ) -> Result<Box<dyn SharedManaged>, ResolveError>;

    /// Returns a reference to `self` as a plain [`Provider`].
    fn upcast_provider(&self) -> &dyn Provider;
}

/// The statically typed variant of [`SharedProvider`], implemented for any
/// [`TypedProvider`] whose output is [`SharedManaged`].
pub trait TypedSharedProvider
where
    Self: SharedProvider + TypedProvider<Output: SharedManaged>,
{
}

impl<T: TypedSharedProvider> SharedProvider for T {
    fn dyn_provide_shared(
        &self,
        resolver: &dyn Resolve,
        context: &CallContext<'_>,
    ) -> Result<Box<dyn SharedManaged>, ResolveError> {
        self.provide(resolver, context)
            .map(|obj| -> Box<dyn SharedManaged> { Box::new(obj) })
    }

    fn upcast_provider(&self) -> &dyn Provider {
        self
    }
}
