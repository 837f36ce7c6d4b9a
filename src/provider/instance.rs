use std::fmt::{Debug, Formatter, Result as FmtResult};

use crate::container::resolve::{ResolveError, Resolver};
use crate::container::{Managed, SharedManaged};
use crate::provider::context::CallContext;
use crate::provider::{TypedProvider, TypedSharedProvider};

/// A provider backed by a pre-built object, handing out a clone on every
/// call. Registering an `Arc`-wrapped instance this way preserves identity,
/// since cloning the `Arc` shares the underlying object.
pub struct InstanceProvider<T>
where
    T: Managed + Clone,
{
    instance: T,
}

impl<T> InstanceProvider<T>
where
    T: Managed + Clone,
{
    pub fn new(instance: T) -> Self {
        Self { instance }
    }
}

impl<T> Debug for InstanceProvider<T>
where
    T: Managed + Clone,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("InstanceProvider<T>").finish_non_exhaustive()
    }
}

impl<T> TypedProvider for InstanceProvider<T>
where
    T: Managed + Clone,
{
    type Output = T;

    fn provide<R>(
        &self,
        _resolver: &R,
        _context: &CallContext<'_>,
    ) -> Result<Self::Output, ResolveError>
    where
        R: Resolver + ?Sized,
    {
        Ok(self.instance.clone())
    }
}

impl<T> TypedSharedProvider for InstanceProvider<T> where T: SharedManaged + Clone {}
