use std::error::Error;
use std::sync::Arc;

use crate::container::registry::provider_map::{ProviderEntry, ProviderMap};
use crate::container::registry::{ConfigError, RegistrationLevel};
use crate::container::SharedManaged;
use crate::key::{Key, TypedKey};
use crate::provider::instance::InstanceProvider;
use crate::provider::{Provider, SharedProvider, TypedProvider, TypedSharedProvider};
use crate::scope::Lifetime;

/// Collects registrations for one container level, accumulating errors
/// instead of failing fast so that every configuration mistake is reported
/// together when the bootstrapper finishes.
pub struct Registrar {
    level: RegistrationLevel,
    providers: ProviderMap,
    errors: Vec<ConfigError>,
}

impl Registrar {
    pub(crate) fn application() -> Self {
        Self::new(RegistrationLevel::Application)
    }

    pub(crate) fn request() -> Self {
        Self::new(RegistrationLevel::Request)
    }

    fn new(level: RegistrationLevel) -> Self {
        Self {
            level,
            providers: ProviderMap::new(),
            errors: Vec::new(),
        }
    }

    /// The container level this registrar is collecting for.
    pub fn level(&self) -> RegistrationLevel {
        self.level
    }

    /// Registers a transient entry: `provider` runs on every resolution of
    /// `key`.
    pub fn register<K, P>(&mut self, key: K, provider: P)
    where
        K: TypedKey,
        P: TypedProvider<Output = K::Target>,
    {
        self.dyn_register_owned(Box::new(key), Arc::new(provider));
    }

    /// Registers an entry cached at this registrar's level: the provider
    /// runs once and every later resolution of `key` receives the same
    /// instance.
    pub fn register_scoped<K, P>(&mut self, key: K, provider: P)
    where
        K: TypedKey<Target: SharedManaged>,
        P: TypedSharedProvider<Output = K::Target>,
    {
        self.dyn_register_shared(Box::new(key), Arc::new(provider));
    }

    /// Registers a pre-built instance, cached at this registrar's level.
    pub fn register_instance<K>(&mut self, key: K, instance: K::Target)
    where
        K: TypedKey<Target: SharedManaged + Clone>,
    {
        self.dyn_register_shared(Box::new(key), Arc::new(InstanceProvider::new(instance)));
    }

    pub(crate) fn dyn_register_owned(&mut self, key: Box<dyn Key>, provider: Arc<dyn Provider>) {
        if self.providers.contains(key.as_ref()) {
            self.errors.push(ConfigError::KeyDuplicated {
                key: key.dyn_clone(),
            });
        } else {
            self.providers.insert(ProviderEntry::new_owned(key, provider));
        }
    }

    pub(crate) fn dyn_register_shared(
        &mut self,
        key: Box<dyn Key>,
        provider: Arc<dyn SharedProvider>,
    ) {
        if self.providers.contains(key.as_ref()) {
            self.errors.push(ConfigError::KeyDuplicated {
                key: key.dyn_clone(),
            });
        } else {
            self.providers
                .insert(ProviderEntry::new_shared(key, provider));
        }
    }

    pub(crate) fn report_invalid_lifetime(&mut self, key: Box<dyn Key>, lifetime: Lifetime) {
        self.errors.push(ConfigError::InvalidLifetime {
            key,
            lifetime,
            level: self.level,
        });
    }

    pub(crate) fn report_host_error(
        &mut self,
        hook: &'static str,
        err: Box<dyn Error + Send + Sync>,
    ) {
        self.errors.push(ConfigError::HostHook { hook, source: err });
    }

    pub(crate) fn finish(self) -> Result<ProviderMap, ConfigError> {
        let mut errors = self.errors;
        match errors.len() {
            0 => Ok(self.providers),
            1 => Err(errors.remove(0)),
            _ => Err(ConfigError::Aggregated { errors }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::key;

    use super::*;

    #[test]
    fn registrar_finish_succeeds() {
        let mut registrar = Registrar::application();
        registrar.register(key::of::<i32>(), InstanceProvider::new(42i32));
        registrar.register_scoped(
            key::of::<Arc<i32>>(),
            InstanceProvider::new(Arc::new(42i32)),
        );
        registrar.register_instance(key::named::<Arc<u32>>("limit"), Arc::new(16u32));

        let map = registrar.finish().unwrap();
        assert_eq!(map.len(), 3);
        assert!(map.contains(&key::of::<i32>() as &dyn Key));
        assert!(map.contains(&key::named::<Arc<u32>>("limit") as &dyn Key));
    }

    #[test]
    fn registrar_finish_fails_when_key_is_duplicated() {
        let mut registrar = Registrar::application();
        registrar.register(key::of::<i32>(), InstanceProvider::new(42i32));
        registrar.register(key::of::<i32>(), InstanceProvider::new(0i32));

        let err = registrar.finish().unwrap_err();
        assert!(matches!(err, ConfigError::KeyDuplicated { .. }));
    }

    #[test]
    fn registrar_finish_aggregates_multiple_errors() {
        let mut registrar = Registrar::request();
        registrar.register(key::of::<i32>(), InstanceProvider::new(42i32));
        registrar.register(key::of::<i32>(), InstanceProvider::new(0i32));
        registrar.report_host_error("configure_request", "hook went sideways".into());

        let err = registrar.finish().unwrap_err();
        let ConfigError::Aggregated { errors } = err else {
            panic!("expected an aggregated error");
        };
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], ConfigError::KeyDuplicated { .. }));
        assert!(matches!(errors[1], ConfigError::HostHook { .. }));
    }

    #[test]
    fn registrar_reports_invalid_lifetime_with_level() {
        let mut registrar = Registrar::application();
        registrar.report_invalid_lifetime(Box::new(key::of::<Arc<i32>>()), Lifetime::PerRequest);

        let err = registrar.finish().unwrap_err();
        let ConfigError::InvalidLifetime {
            lifetime, level, ..
        } = err
        else {
            panic!("expected an invalid lifetime error");
        };
        assert_eq!(lifetime, Lifetime::PerRequest);
        assert_eq!(level, RegistrationLevel::Application);
    }
}
