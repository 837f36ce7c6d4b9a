use std::error::Error;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::container::resolve::{ContextForwardingProxy, Resolve, ResolveError, Resolver};
use crate::container::{Managed, SharedManaged};
use crate::provider::context::CallContext;
use crate::provider::{TypedProvider, TypedSharedProvider};

/// A specialized form of [`Fn`] which constructs an object, pulling its
/// dependencies from the supplied [`Resolve`].
///
/// Closures of `Fn(&dyn Resolve) -> Result<Result<T, E>, ResolveError>`
/// implement this trait. The nested result separates the two failure
/// domains: the outer layer carries resolution failures, so `?` works on
/// nested `resolve` calls, while the inner layer carries the construction
/// error of the object itself.
pub trait Factory
where
    Self: Fn(&dyn Resolve)
        -> Result<Result<<Self as Factory>::Output, <Self as Factory>::Error>, ResolveError>,
    Self: Send + Sync + 'static,
{
    /// The successfully constructed object.
    type Output: Managed;

    /// The error produced when construction fails after all dependencies
    /// have been resolved.
    type Error: Into<Box<dyn Error + Send + Sync>>;
}

impl<F, T, E> Factory for F
where
    T: Managed,
    E: Into<Box<dyn Error + Send + Sync>>,
    Self: Fn(&dyn Resolve) -> Result<Result<T, E>, ResolveError>,
    Self: Send + Sync + 'static,
{
    type Output = T;

    type Error = E;
}

/// A provider which runs a [`Factory`] on every call.
///
/// Nested resolutions performed inside the factory are forwarded with the
/// current call context attached, so dependency chains that loop back onto
/// a key under construction are still detected.
pub struct FactoryProvider<F: Factory> {
    factory: F,
}

impl<F: Factory> FactoryProvider<F> {
    pub fn new(factory: F) -> Self {
        Self { factory }
    }
}

impl<F: Factory> Debug for FactoryProvider<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FactoryProvider<F>").finish_non_exhaustive()
    }
}

impl<F: Factory> TypedProvider for FactoryProvider<F> {
    type Output = <F as Factory>::Output;

    fn provide<R>(
        &self,
        resolver: &R,
        context: &CallContext<'_>,
    ) -> Result<Self::Output, ResolveError>
    where
        R: Resolver + ?Sized,
    {
        let proxy = ContextForwardingProxy::new(resolver, context);
        match (self.factory)(proxy.upcast_dyn()) {
            Ok(Ok(obj)) => Ok(obj),
            Ok(Err(err)) => Err(ResolveError::Construction {
                key: context.key().dyn_clone(),
                source: Arc::from(err.into()),
            }),
            Err(err) => Err(err),
        }
    }
}

impl<F> TypedSharedProvider for FactoryProvider<F>
where
    F: Factory,
    <F as Factory>::Output: SharedManaged,
{
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use crate::container::resolve::MockResolve;
    use crate::key;

    use super::*;

    #[test]
    fn factory_provider_succeeds() {
        let resolver = MockResolve::new();
        let provider = FactoryProvider::new(|_| Ok(Ok::<_, Infallible>(42i32)));

        let res = provider.provide(&resolver, &CallContext::new(&key::of::<i32>()));
        assert_eq!(res.unwrap(), 42);
    }

    #[test]
    fn factory_provider_resolves_dependencies_with_context() {
        let mut resolver = MockResolve::new();
        resolver
            .expect_dyn_resolve_dependency()
            .returning(|_, _| Ok(Box::new(2i32)));

        let provider = FactoryProvider::new(|resolver: &dyn Resolve| {
            let base = resolver.resolve(key::of::<i32>())?;
            Ok(Ok::<_, Infallible>(base * 10))
        });

        let res = provider.provide(&resolver, &CallContext::new(&key::of::<i32>()));
        assert_eq!(res.unwrap(), 20);
    }

    #[test]
    fn factory_provider_fails_when_construction_fails() {
        let resolver = MockResolve::new();
        let provider = FactoryProvider::new(|_| Ok(Err::<i32, _>("out of spare parts")));

        let res = provider.provide(&resolver, &CallContext::new(&key::of::<i32>()));
        assert!(matches!(
            res.unwrap_err(),
            ResolveError::Construction { .. }
        ));
    }
}
