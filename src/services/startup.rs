use std::any;
use std::error::Error;
use std::sync::Arc;

use crate::bootstrap::context::RequestContext;
use crate::container::{ApplicationContainer, RequestContainer};

/// Work run once against the application container at the end of
/// `initialise`, before any request is served. Register implementations as
/// a collection of `Arc<dyn ApplicationStartupTask>`; tasks run in
/// registration order.
pub trait ApplicationStartupTask: Send + Sync + 'static {
    /// The name reported when the task fails.
    fn name(&self) -> &'static str {
        any::type_name::<Self>()
    }

    /// # Errors
    ///
    /// A failing task aborts `initialise`.
    fn on_startup(
        &self,
        container: &ApplicationContainer,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// Work run against every freshly created request container, before the
/// request sees it. Register implementations at the request level as a
/// collection of `Arc<dyn RequestStartupTask>`.
pub trait RequestStartupTask: Send + Sync + 'static {
    /// The name reported when the task fails.
    fn name(&self) -> &'static str {
        any::type_name::<Self>()
    }

    /// # Errors
    ///
    /// A failing task fails the request container's creation.
    fn on_request(
        &self,
        container: &RequestContainer,
        context: &Arc<RequestContext>,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;
}
