use std::convert::Infallible;
use std::sync::Arc;

use crate::bootstrap::registrations::{
    CollectionRegistration, InstanceRegistration, TypeRegistration,
};
use crate::container::registry::Registrar;
use crate::container::resolve::{Resolve, Resolver};
use crate::key;
use crate::provider::factory::FactoryProvider;
use crate::provider::TypedSharedProvider;
use crate::scope::Lifetime;
use crate::services::diagnostics::{DefaultDiagnostics, Diagnostics};
use crate::services::engine::{DefaultEngine, Engine};
use crate::services::environment::{DefaultEnvironmentConfigurator, EnvironmentConfigurator};
use crate::services::modules::ModuleCatalog;
use crate::services::routing::{DefaultRouteResolver, RouteResolver};

/// The framework-defaults table consumed by `initialise`.
///
/// Each well-known service has a slot holding the registration that will
/// back it, pre-filled with the stock implementation and overridable one
/// slot at a time. Extra registrations ride along in the `with_type`,
/// `with_instance` and `with_collection` lists.
#[derive(Debug)]
pub struct InternalConfiguration {
    engine: TypeRegistration,
    route_resolver: TypeRegistration,
    diagnostics: TypeRegistration,
    environment_configurator: TypeRegistration,
    types: Vec<TypeRegistration>,
    instances: Vec<InstanceRegistration>,
    collections: Vec<CollectionRegistration>,
}

impl Default for InternalConfiguration {
    fn default() -> Self {
        Self {
            engine: Self::engine_slot(FactoryProvider::new(|resolver: &dyn Resolve| {
                let catalog: Arc<dyn ModuleCatalog> = resolver.resolve(key::of())?;
                let routes: Arc<dyn RouteResolver> = resolver.resolve(key::of())?;
                Ok(Ok::<_, Infallible>(
                    Arc::new(DefaultEngine::new(catalog, routes)) as Arc<dyn Engine>,
                ))
            })),
            route_resolver: Self::route_resolver_slot(FactoryProvider::new(
                |resolver: &dyn Resolve| {
                    let catalog: Arc<dyn ModuleCatalog> = resolver.resolve(key::of())?;
                    Ok(Ok::<_, Infallible>(
                        Arc::new(DefaultRouteResolver::new(catalog)) as Arc<dyn RouteResolver>,
                    ))
                },
            )),
            diagnostics: Self::diagnostics_slot(FactoryProvider::new(|_| {
                Ok(Ok::<_, Infallible>(
                    Arc::new(DefaultDiagnostics::new()) as Arc<dyn Diagnostics>,
                ))
            })),
            environment_configurator: Self::environment_configurator_slot(FactoryProvider::new(
                |_| {
                    Ok(Ok::<_, Infallible>(Arc::new(DefaultEnvironmentConfigurator)
                        as Arc<dyn EnvironmentConfigurator>))
                },
            )),
            types: Vec::new(),
            instances: Vec::new(),
            collections: Vec::new(),
        }
    }
}

impl InternalConfiguration {
    /// Swaps the engine implementation.
    pub fn with_engine<P>(mut self, provider: P) -> Self
    where
        P: TypedSharedProvider<Output = Arc<dyn Engine>>,
    {
        self.engine = Self::engine_slot(provider);
        self
    }

    /// Swaps the route resolver implementation.
    pub fn with_route_resolver<P>(mut self, provider: P) -> Self
    where
        P: TypedSharedProvider<Output = Arc<dyn RouteResolver>>,
    {
        self.route_resolver = Self::route_resolver_slot(provider);
        self
    }

    /// Swaps the diagnostics implementation.
    pub fn with_diagnostics<P>(mut self, provider: P) -> Self
    where
        P: TypedSharedProvider<Output = Arc<dyn Diagnostics>>,
    {
        self.diagnostics = Self::diagnostics_slot(provider);
        self
    }

    /// Swaps the environment configurator implementation.
    pub fn with_environment_configurator<P>(mut self, provider: P) -> Self
    where
        P: TypedSharedProvider<Output = Arc<dyn EnvironmentConfigurator>>,
    {
        self.environment_configurator = Self::environment_configurator_slot(provider);
        self
    }

    /// Adds an application-level type registration.
    pub fn with_type(mut self, registration: TypeRegistration) -> Self {
        self.types.push(registration);
        self
    }

    /// Adds an application-level instance registration.
    pub fn with_instance(mut self, registration: InstanceRegistration) -> Self {
        self.instances.push(registration);
        self
    }

    /// Adds an application-level collection registration.
    pub fn with_collection(mut self, registration: CollectionRegistration) -> Self {
        self.collections.push(registration);
        self
    }

    pub(crate) fn apply_to(&self, registrar: &mut Registrar) {
        self.engine.apply_to(registrar);
        self.route_resolver.apply_to(registrar);
        self.diagnostics.apply_to(registrar);
        self.environment_configurator.apply_to(registrar);
        for registration in &self.types {
            registration.apply_to(registrar);
        }
        for registration in &self.instances {
            registration.apply_to(registrar);
        }
        for registration in &self.collections {
            registration.apply_to(registrar);
        }
    }

    fn engine_slot<P>(provider: P) -> TypeRegistration
    where
        P: TypedSharedProvider<Output = Arc<dyn Engine>>,
    {
        TypeRegistration::new(key::of::<Arc<dyn Engine>>(), provider, Lifetime::Singleton)
    }

    fn route_resolver_slot<P>(provider: P) -> TypeRegistration
    where
        P: TypedSharedProvider<Output = Arc<dyn RouteResolver>>,
    {
        TypeRegistration::new(
            key::of::<Arc<dyn RouteResolver>>(),
            provider,
            Lifetime::Singleton,
        )
    }

    fn diagnostics_slot<P>(provider: P) -> TypeRegistration
    where
        P: TypedSharedProvider<Output = Arc<dyn Diagnostics>>,
    {
        TypeRegistration::new(
            key::of::<Arc<dyn Diagnostics>>(),
            provider,
            Lifetime::Singleton,
        )
    }

    fn environment_configurator_slot<P>(provider: P) -> TypeRegistration
    where
        P: TypedSharedProvider<Output = Arc<dyn EnvironmentConfigurator>>,
    {
        TypeRegistration::new(
            key::of::<Arc<dyn EnvironmentConfigurator>>(),
            provider,
            Lifetime::Singleton,
        )
    }
}
