use std::sync::Arc;

use crate::bootstrap::context::RequestContext;
use crate::services::modules::ModuleCatalog;
use crate::services::routing::{Route, RouteResolver};

/// The entry point the host hands inbound requests to once the
/// bootstrapper has initialised.
pub trait Engine: Send + Sync + 'static {
    /// Dispatches `context` to a module, or returns `None` when no module
    /// wants the request.
    fn dispatch(&self, context: &Arc<RequestContext>) -> Option<Route>;
}

/// The stock engine: routes the request, then checks that the routed
/// module actually resolves for this context before handing the route
/// back.
pub struct DefaultEngine {
    catalog: Arc<dyn ModuleCatalog>,
    routes: Arc<dyn RouteResolver>,
}

impl DefaultEngine {
    pub fn new(catalog: Arc<dyn ModuleCatalog>, routes: Arc<dyn RouteResolver>) -> Self {
        Self { catalog, routes }
    }
}

impl Engine for DefaultEngine {
    fn dispatch(&self, context: &Arc<RequestContext>) -> Option<Route> {
        let route = self.routes.resolve(context)?;
        self.catalog.module_by_name(context, route.module()).ok()?;
        Some(route)
    }
}
