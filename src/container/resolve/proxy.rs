use std::any::TypeId;

use crate::container::resolve::{Resolve, ResolveError, Resolver};
use crate::container::Managed;
use crate::key::Key;
use crate::provider::context::CallContext;

/// Wraps a resolver so that resolutions made inside a provider extend the
/// provider's own call context instead of starting a fresh one. Without
/// this, a dependency chain crossing a factory would lose its trace and a
/// cycle through it would recurse instead of erroring.
pub struct ContextForwardingProxy<'a, R>
where
    R: Resolver + ?Sized,
{
    inner: &'a R,
    context: &'a CallContext<'a>,
}

impl<'a, R> ContextForwardingProxy<'a, R>
where
    R: Resolver + ?Sized,
{
    pub fn new(inner: &'a R, context: &'a CallContext<'a>) -> Self {
        Self { inner, context }
    }
}

impl<R> Resolve for ContextForwardingProxy<'_, R>
where
    R: Resolver + ?Sized,
{
    fn dyn_resolve(&self, key: &dyn Key) -> Result<Box<dyn Managed>, ResolveError> {
        self.dyn_resolve_dependency(key, self.context)
    }

    fn dyn_resolve_dependency<'a>(
        &self,
        key: &dyn Key,
        context: &'a CallContext<'a>,
    ) -> Result<Box<dyn Managed>, ResolveError> {
        self.inner.dyn_resolve_dependency(key, context)
    }

    fn registered_keys(&self, target: TypeId) -> Vec<Box<dyn Key>> {
        self.inner.registered_keys(target)
    }
}
