use std::sync::Arc;

use crate::bootstrap::context::RequestContext;
use crate::services::modules::ModuleCatalog;

/// A matched route: the module that will handle the request and the path
/// prefix it matched on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    module: String,
    path: String,
}

impl Route {
    pub fn new(module: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            path: path.into(),
        }
    }

    /// The name of the module that matched.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// The path prefix that matched.
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Picks the module responsible for a request.
pub trait RouteResolver: Send + Sync + 'static {
    /// The route for `context`, or `None` when no module matches.
    fn resolve(&self, context: &Arc<RequestContext>) -> Option<Route>;
}

/// The stock resolver: longest path-prefix match over the registered
/// modules.
pub struct DefaultRouteResolver {
    catalog: Arc<dyn ModuleCatalog>,
}

impl DefaultRouteResolver {
    pub fn new(catalog: Arc<dyn ModuleCatalog>) -> Self {
        Self { catalog }
    }
}

impl RouteResolver for DefaultRouteResolver {
    fn resolve(&self, context: &Arc<RequestContext>) -> Option<Route> {
        let modules = self.catalog.all_modules(context).ok()?;
        modules
            .iter()
            .filter(|module| context.path().starts_with(module.path()))
            .max_by_key(|module| module.path().len())
            .map(|module| Route::new(module.name(), module.path()))
    }
}

#[cfg(test)]
mod tests {
    use crate::bootstrap::BootstrapError;
    use crate::services::modules::Module;

    use super::*;

    struct FixedModule {
        name: &'static str,
        path: &'static str,
    }

    impl Module for FixedModule {
        fn name(&self) -> &str {
            self.name
        }

        fn path(&self) -> &str {
            self.path
        }
    }

    struct FixedCatalog {
        modules: Vec<(&'static str, &'static str)>,
    }

    impl ModuleCatalog for FixedCatalog {
        fn all_modules(
            &self,
            _context: &Arc<RequestContext>,
        ) -> Result<Vec<Arc<dyn Module>>, BootstrapError> {
            Ok(self
                .modules
                .iter()
                .map(|&(name, path)| Arc::new(FixedModule { name, path }) as Arc<dyn Module>)
                .collect())
        }

        fn module_by_name(
            &self,
            context: &Arc<RequestContext>,
            name: &str,
        ) -> Result<Arc<dyn Module>, BootstrapError> {
            self.all_modules(context)?
                .into_iter()
                .find(|module| module.name() == name)
                .ok_or(BootstrapError::UnknownModule {
                    name: name.to_owned(),
                })
        }
    }

    #[test]
    fn route_resolver_picks_longest_matching_prefix() {
        let catalog = Arc::new(FixedCatalog {
            modules: vec![("root", "/"), ("files", "/files"), ("archive", "/files/old")],
        });
        let resolver = DefaultRouteResolver::new(catalog);

        let route = resolver.resolve(&RequestContext::new("/files/old/a.txt"));
        assert_eq!(route, Some(Route::new("archive", "/files/old")));

        let route = resolver.resolve(&RequestContext::new("/files/new.txt"));
        assert_eq!(route, Some(Route::new("files", "/files")));

        let route = resolver.resolve(&RequestContext::new("/about"));
        assert_eq!(route, Some(Route::new("root", "/")));
    }

    #[test]
    fn route_resolver_fails_when_nothing_matches() {
        let catalog = Arc::new(FixedCatalog {
            modules: vec![("files", "/files")],
        });
        let resolver = DefaultRouteResolver::new(catalog);

        assert_eq!(resolver.resolve(&RequestContext::new("/about")), None);
    }
}
