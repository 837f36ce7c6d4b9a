pub mod registry;
pub mod resolve;

mod application;
mod request;

use std::sync::Arc;

use crate::util::any::AsAny;

pub use application::ApplicationContainer;
pub use request::RequestContainer;

/// Any object a container can construct and hand out.
pub trait Managed: AsAny + Send + Sync + 'static {}

impl<T> Managed for T where T: AsAny + Send + Sync + 'static {}

/// A [`Managed`] object which can additionally be duplicated cheaply, so
/// one construction can be cached and handed out many times. In practice
/// this means `Arc`-wrapped services.
pub trait SharedManaged: Managed {
    fn dyn_clone(&self) -> Box<dyn SharedManaged>;

    fn upcast_managed(self: Box<Self>) -> Box<dyn Managed>;
}

impl<T> SharedManaged for Arc<T>
where
    T: Send + Sync + ?Sized + 'static,
{
    fn dyn_clone(&self) -> Box<dyn SharedManaged> {
        Box::new(Arc::clone(self))
    }

    fn upcast_managed(self: Box<Self>) -> Box<dyn Managed> {
        self
    }
}
