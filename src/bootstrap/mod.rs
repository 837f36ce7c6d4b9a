pub mod configuration;
pub mod context;
pub mod registrations;

use std::any::TypeId;
use std::error::Error;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::{Arc, Weak};

use snafu::prelude::*;
use tracing::{debug, trace};

use crate::container::registry::{ConfigError, ProviderMap, Registrar};
use crate::container::resolve::{Resolve, ResolveError, Resolver};
use crate::container::{ApplicationContainer, RequestContainer};
use crate::key;
use crate::services::diagnostics::Diagnostics;
use crate::services::engine::Engine;
use crate::services::environment::{Environment, EnvironmentConfigurator};
use crate::services::modules::{Module, ModuleCatalog};
use crate::services::startup::{ApplicationStartupTask, RequestStartupTask};
use crate::util::any::Downcast;

use self::configuration::InternalConfiguration;
use self::context::RequestContext;
use self::registrations::ModuleRegistration;

/// A host framework's bootstrap configuration.
///
/// Every hook has a default, so a host overrides only what it needs. The
/// hooks run exactly once, inside [`Bootstrapper::initialise`].
pub trait Host: Send + Sync + 'static {
    /// The framework-defaults table. Override to swap stock service
    /// implementations wholesale.
    fn internal_configuration(&self) -> InternalConfiguration {
        InternalConfiguration::default()
    }

    /// Registers application-level services.
    ///
    /// # Errors
    ///
    /// A returned error is collected as a configuration error and fails
    /// `initialise`.
    fn configure_application(
        &self,
        registrar: &mut Registrar,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let _ = registrar;
        Ok(())
    }

    /// Registers request-level services, applied to every request
    /// container.
    ///
    /// # Errors
    ///
    /// A returned error is collected as a configuration error and fails
    /// `initialise`.
    fn configure_request(
        &self,
        registrar: &mut Registrar,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let _ = registrar;
        Ok(())
    }

    /// The modules this host serves, in registration order.
    fn modules(&self) -> Vec<ModuleRegistration> {
        Vec::new()
    }
}

/// The initialised application.
///
/// Only a value returned by [`Bootstrapper::initialise`] can create request
/// containers, so no request can be served before registration has been
/// validated and every application startup task has run. Handles are cheap
/// to clone and safe to share across request-processing threads.
#[derive(Clone)]
pub struct Bootstrapper {
    core: Arc<BootstrapCore>,
    environment: Environment,
}

impl Bootstrapper {
    /// Builds both registration levels from the host's configuration and
    /// hooks, constructs the application container, seeds the module
    /// catalog, assembles the environment, and runs every application
    /// startup task.
    ///
    /// # Errors
    ///
    /// Configuration errors from all hooks are collected and returned
    /// together; a failing startup task or an unresolvable framework
    /// service aborts with the first such failure.
    pub fn initialise<H: Host>(host: H) -> Result<Self, BootstrapError> {
        let configuration = host.internal_configuration();

        let mut application_registrar = Registrar::application();
        configuration.apply_to(&mut application_registrar);
        if let Err(err) = host.configure_application(&mut application_registrar) {
            application_registrar.report_host_error("configure_application", err);
        }

        let mut request_registrar = Registrar::request();
        if let Err(err) = host.configure_request(&mut request_registrar) {
            request_registrar.report_host_error("configure_request", err);
        }
        for module in host.modules() {
            module.apply_to(&mut request_registrar);
        }

        let (application_providers, request_providers) =
            Self::finish_registrars(application_registrar, request_registrar)?;

        let core = Arc::new(BootstrapCore {
            application: ApplicationContainer::new(application_providers),
            request_providers: Arc::new(request_providers),
        });
        BootstrapCore::seed_catalog(&core);

        let environment = core.configure_environment()?;
        core.run_application_startup_tasks()?;
        core.record_startup(&environment)?;

        debug!("bootstrapper initialised");
        Ok(Self { core, environment })
    }

    /// The container for `context`, created on first use and owned by the
    /// context afterwards. Different contexts always receive independent
    /// containers.
    ///
    /// # Errors
    ///
    /// Returns an error when a request startup task fails or a request
    /// service cannot be resolved while the container is prepared.
    pub fn request_container(
        &self,
        context: &Arc<RequestContext>,
    ) -> Result<RequestContainer, BootstrapError> {
        self.core.request_container(context)
    }

    /// The application-level container.
    pub fn application_container(&self) -> &ApplicationContainer {
        &self.core.application
    }

    /// The environment assembled by the registered
    /// [`EnvironmentConfigurator`] during `initialise`.
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Resolves the engine the host hands inbound requests to.
    ///
    /// # Errors
    ///
    /// Returns an error when the engine registration fails to resolve.
    pub fn engine(&self) -> Result<Arc<dyn Engine>, BootstrapError> {
        Ok(self.core.application.resolve(key::of())?)
    }

    /// Every module registered with the host, resolved through `context`'s
    /// container in registration order.
    ///
    /// # Errors
    ///
    /// See [`ModuleCatalog::all_modules`].
    pub fn all_modules(
        &self,
        context: &Arc<RequestContext>,
    ) -> Result<Vec<Arc<dyn Module>>, BootstrapError> {
        self.core.all_modules(context)
    }

    /// The module registered under `name`, resolved through `context`'s
    /// container.
    ///
    /// # Errors
    ///
    /// See [`ModuleCatalog::module_by_name`].
    pub fn module_by_name(
        &self,
        context: &Arc<RequestContext>,
        name: &str,
    ) -> Result<Arc<dyn Module>, BootstrapError> {
        self.core.module_by_name(context, name)
    }

    fn finish_registrars(
        application: Registrar,
        request: Registrar,
    ) -> Result<(ProviderMap, ProviderMap), BootstrapError> {
        match (application.finish(), request.finish()) {
            (Ok(application), Ok(request)) => Ok((application, request)),
            (Err(err), Ok(_)) | (Ok(_), Err(err)) => {
                Err(BootstrapError::Configuration { source: err })
            }
            (Err(application), Err(request)) => Err(BootstrapError::Configuration {
                source: ConfigError::Aggregated {
                    errors: vec![application, request],
                },
            }),
        }
    }
}

impl Debug for Bootstrapper {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Bootstrapper").finish_non_exhaustive()
    }
}

struct BootstrapCore {
    application: ApplicationContainer,
    request_providers: Arc<ProviderMap>,
}

impl BootstrapCore {
    fn seed_catalog(core: &Arc<Self>) {
        let catalog: Arc<dyn ModuleCatalog> = Arc::new(BootstrapCatalog {
            core: Arc::downgrade(core),
        });
        core.application.seed(
            Box::new(key::of::<Arc<dyn ModuleCatalog>>()),
            Box::new(catalog),
        );
    }

    fn configure_environment(&self) -> Result<Environment, BootstrapError> {
        let configurator: Arc<dyn EnvironmentConfigurator> =
            self.application.resolve(key::of())?;
        let mut environment = Environment::new();
        configurator.configure(&mut environment);
        Ok(environment)
    }

    fn run_application_startup_tasks(&self) -> Result<(), BootstrapError> {
        let tasks: Vec<Arc<dyn ApplicationStartupTask>> = self.application.resolve_all()?;
        for task in tasks {
            trace!(task = task.name(), "running application startup task");
            task.on_startup(&self.application)
                .map_err(|err| BootstrapError::StartupTask {
                    name: task.name(),
                    source: err,
                })?;
        }
        Ok(())
    }

    fn record_startup(&self, environment: &Environment) -> Result<(), BootstrapError> {
        let diagnostics: Arc<dyn Diagnostics> = self.application.resolve(key::of())?;
        let tracing_state = environment.get("request-tracing").unwrap_or("unset");
        diagnostics.record(&format!(
            "application container initialised, request-tracing {tracing_state}"
        ));
        Ok(())
    }

    fn request_container(
        &self,
        context: &Arc<RequestContext>,
    ) -> Result<RequestContainer, BootstrapError> {
        context.container_or_create(|| self.create_request_container(context))
    }

    fn create_request_container(
        &self,
        context: &Arc<RequestContext>,
    ) -> Result<RequestContainer, BootstrapError> {
        let container = RequestContainer::new(
            self.application.clone(),
            Arc::clone(&self.request_providers),
        );
        container.seed(
            Box::new(key::of::<Arc<RequestContext>>()),
            Box::new(Arc::clone(context)),
        );

        let tasks: Vec<Arc<dyn RequestStartupTask>> = container.resolve_all()?;
        for task in tasks {
            trace!(task = task.name(), "running request startup task");
            task.on_request(&container, context)
                .map_err(|err| BootstrapError::StartupTask {
                    name: task.name(),
                    source: err,
                })?;
        }

        trace!(path = context.path(), "request container created");
        Ok(container)
    }

    fn all_modules(
        &self,
        context: &Arc<RequestContext>,
    ) -> Result<Vec<Arc<dyn Module>>, BootstrapError> {
        let container = self.request_container(context)?;
        Ok(container.resolve_all()?)
    }

    fn module_by_name(
        &self,
        context: &Arc<RequestContext>,
        name: &str,
    ) -> Result<Arc<dyn Module>, BootstrapError> {
        let container = self.request_container(context)?;
        let key = container
            .registered_keys(TypeId::of::<Arc<dyn Module>>())
            .into_iter()
            .find(|key| key.discriminator() == Some(name));
        let Some(key) = key else {
            return Err(BootstrapError::UnknownModule {
                name: name.to_owned(),
            });
        };

        match container.dyn_resolve(key.as_ref())?.downcast::<Arc<dyn Module>>() {
            Ok(module) => Ok(*module),
            Err(_) => unreachable!("the key's target type is `Arc<dyn Module>`"),
        }
    }
}

/// The catalog seeded into the application container, backed by a weak
/// reference so the container's own cache cannot keep the bootstrap core
/// alive.
struct BootstrapCatalog {
    core: Weak<BootstrapCore>,
}

impl BootstrapCatalog {
    fn core(&self) -> Result<Arc<BootstrapCore>, BootstrapError> {
        self.core.upgrade().ok_or(BootstrapError::Detached {})
    }
}

impl ModuleCatalog for BootstrapCatalog {
    fn all_modules(
        &self,
        context: &Arc<RequestContext>,
    ) -> Result<Vec<Arc<dyn Module>>, BootstrapError> {
        self.core()?.all_modules(context)
    }

    fn module_by_name(
        &self,
        context: &Arc<RequestContext>,
        name: &str,
    ) -> Result<Arc<dyn Module>, BootstrapError> {
        self.core()?.module_by_name(context, name)
    }
}

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum BootstrapError {
    /// Registration-time failures, collected across every hook.
    #[snafu(context(false))]
    #[snafu(display("could not configure the containers"))]
    #[non_exhaustive]
    Configuration { source: ConfigError },
    /// A framework service failed to resolve.
    #[snafu(context(false))]
    #[snafu(display("could not resolve a framework service"))]
    #[non_exhaustive]
    ServiceResolution { source: ResolveError },
    #[snafu(display("the startup task {name} failed"))]
    #[non_exhaustive]
    StartupTask {
        name: &'static str,
        source: Box<dyn Error + Send + Sync>,
    },
    #[snafu(display("no module is registered under the name {name:?}"))]
    #[non_exhaustive]
    UnknownModule { name: String },
    #[snafu(display("the module catalog outlived its bootstrapper"))]
    #[non_exhaustive]
    Detached {},
}
