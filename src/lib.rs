#![allow(clippy::new_without_default)]

pub mod bootstrap;
pub mod container;
pub mod key;
pub mod provider;
pub mod scope;
pub mod services;
mod util;

pub mod prelude {
    pub use crate::bootstrap::configuration::InternalConfiguration;
    pub use crate::bootstrap::context::RequestContext;
    pub use crate::bootstrap::registrations::{
        CollectionRegistration, InstanceRegistration, ModuleRegistration, TypeRegistration,
    };
    pub use crate::bootstrap::{BootstrapError, Bootstrapper, Host};
    pub use crate::container::registry::{bind, ConfigError, Registrar};
    pub use crate::container::resolve::{Deferred, Resolve, ResolveError, Resolver};
    pub use crate::container::{ApplicationContainer, RequestContainer};
    pub use crate::key;
    pub use crate::provider::factory::FactoryProvider;
    pub use crate::provider::instance::InstanceProvider;
    pub use crate::scope::Lifetime;
    pub use crate::services::modules::Module;
    pub use crate::services::startup::{ApplicationStartupTask, RequestStartupTask};
}
