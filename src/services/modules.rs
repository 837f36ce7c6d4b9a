use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::bootstrap::context::RequestContext;
use crate::bootstrap::BootstrapError;

/// A unit of request-handling behavior.
///
/// Modules are registered with the bootstrapper by name and resolved from
/// the request container, so a module's dependencies are scoped to the
/// request it is serving. What a module actually does with a request is the
/// host framework's business, not this crate's.
pub trait Module: Send + Sync + 'static {
    /// The name this module was registered under.
    fn name(&self) -> &str;

    /// The path prefix this module serves.
    fn path(&self) -> &str {
        "/"
    }
}

impl Debug for dyn Module {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Module")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

/// Enumerates and fetches the modules registered with the bootstrapper.
///
/// The bootstrapper seeds an implementation of this trait into the
/// application container during `initialise`, so any service can depend on
/// `Arc<dyn ModuleCatalog>` without registering one.
pub trait ModuleCatalog: Send + Sync + 'static {
    /// Every registered module, resolved through `context`'s container in
    /// registration order.
    ///
    /// # Errors
    ///
    /// Returns an error when the request container cannot be prepared or a
    /// module fails to construct.
    fn all_modules(
        &self,
        context: &Arc<RequestContext>,
    ) -> Result<Vec<Arc<dyn Module>>, BootstrapError>;

    /// The module registered under `name`, resolved through `context`'s
    /// container.
    ///
    /// # Errors
    ///
    /// Returns an error when no module was registered under `name`, the
    /// request container cannot be prepared, or the module fails to
    /// construct.
    fn module_by_name(
        &self,
        context: &Arc<RequestContext>,
        name: &str,
    ) -> Result<Arc<dyn Module>, BootstrapError>;
}
