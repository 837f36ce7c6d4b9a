use std::marker::PhantomData;
use std::sync::Arc;

use crate::container::registry::{RegistrationLevel, Registrar};
use crate::container::SharedManaged;
use crate::key::{self, Key, TypedKey};
use crate::provider::instance::InstanceProvider;
use crate::provider::{Provider, SharedProvider, TypedSharedProvider};
use crate::scope::Lifetime;
use crate::services::modules::Module;

/// One declarative registration: a key, the provider constructing its
/// implementation, and the lifetime policy.
///
/// The registration applies itself to a [`Registrar`]; lifetimes the
/// registrar's level cannot satisfy are reported as configuration errors
/// instead of being silently reinterpreted.
#[derive(Debug)]
pub struct TypeRegistration {
    key: Box<dyn Key>,
    lifetime: Lifetime,
    shared: Arc<dyn SharedProvider>,
    owned: Arc<dyn Provider>,
}

impl TypeRegistration {
    pub fn new<K, P>(key: K, provider: P, lifetime: Lifetime) -> Self
    where
        K: TypedKey<Target: SharedManaged>,
        P: TypedSharedProvider<Output = K::Target>,
    {
        // Both erased views share the one provider allocation.
        let provider = Arc::new(provider);
        Self {
            key: Box::new(key),
            lifetime,
            shared: Arc::clone(&provider) as Arc<dyn SharedProvider>,
            owned: provider,
        }
    }

    pub fn key(&self) -> &dyn Key {
        self.key.as_ref()
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    pub fn apply_to(&self, registrar: &mut Registrar) {
        match (self.lifetime, registrar.level()) {
            (Lifetime::Transient, _) => {
                registrar.dyn_register_owned(self.key.dyn_clone(), Arc::clone(&self.owned));
            }
            (Lifetime::Singleton, RegistrationLevel::Application)
            | (Lifetime::PerRequest, RegistrationLevel::Request) => {
                registrar.dyn_register_shared(self.key.dyn_clone(), Arc::clone(&self.shared));
            }
            (lifetime, _) => {
                registrar.report_invalid_lifetime(self.key.dyn_clone(), lifetime);
            }
        }
    }
}

/// A pre-built instance registered as a level-wide singleton. Identity is
/// preserved: every resolution hands back the same `Arc`-shaped value.
#[derive(Debug)]
pub struct InstanceRegistration {
    key: Box<dyn Key>,
    provider: Arc<dyn SharedProvider>,
}

impl InstanceRegistration {
    pub fn new<K>(key: K, instance: K::Target) -> Self
    where
        K: TypedKey<Target: SharedManaged + Clone>,
    {
        Self {
            key: Box::new(key),
            provider: Arc::new(InstanceProvider::new(instance)),
        }
    }

    pub fn key(&self) -> &dyn Key {
        self.key.as_ref()
    }

    pub fn apply_to(&self, registrar: &mut Registrar) {
        registrar.dyn_register_shared(self.key.dyn_clone(), Arc::clone(&self.provider));
    }
}

/// An ordered set of implementations registered under one service type,
/// told apart by name. `resolve_all` hands the collection back in exactly
/// this order.
///
/// Members are scoped to the level they are applied at: singletons on the
/// application path, per-request on the request path.
#[derive(Debug)]
pub struct CollectionRegistration {
    entries: Vec<(Box<dyn Key>, Arc<dyn SharedProvider>)>,
}

impl CollectionRegistration {
    pub fn of<T: SharedManaged>() -> CollectionBuilder<T> {
        CollectionBuilder {
            entries: Vec::new(),
            _marker: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn apply_to(&self, registrar: &mut Registrar) {
        for (key, provider) in &self.entries {
            registrar.dyn_register_shared(key.dyn_clone(), Arc::clone(provider));
        }
    }
}

/// Builds a [`CollectionRegistration`] member by member.
pub struct CollectionBuilder<T: SharedManaged> {
    entries: Vec<(Box<dyn Key>, Arc<dyn SharedProvider>)>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: SharedManaged> CollectionBuilder<T> {
    pub fn with<P>(mut self, name: &'static str, provider: P) -> Self
    where
        P: TypedSharedProvider<Output = T>,
    {
        self.entries
            .push((Box::new(key::named::<T>(name)), Arc::new(provider)));
        self
    }

    pub fn with_instance(mut self, name: &'static str, instance: T) -> Self
    where
        T: Clone,
    {
        self.entries.push((
            Box::new(key::named::<T>(name)),
            Arc::new(InstanceProvider::new(instance)),
        ));
        self
    }

    pub fn build(self) -> CollectionRegistration {
        CollectionRegistration {
            entries: self.entries,
        }
    }
}

/// Registers one module under its name. Modules are per-request scoped, so
/// each request resolves its own instance wired to request-scoped
/// dependencies.
#[derive(Debug)]
pub struct ModuleRegistration {
    name: &'static str,
    provider: Arc<dyn SharedProvider>,
}

impl ModuleRegistration {
    pub fn new<P>(name: &'static str, provider: P) -> Self
    where
        P: TypedSharedProvider<Output = Arc<dyn Module>>,
    {
        Self {
            name,
            provider: Arc::new(provider),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn apply_to(&self, registrar: &mut Registrar) {
        registrar.dyn_register_shared(
            Box::new(key::named::<Arc<dyn Module>>(self.name)),
            Arc::clone(&self.provider),
        );
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use crate::container::registry::ConfigError;
    use crate::container::resolve::Resolver;
    use crate::container::ApplicationContainer;
    use crate::provider::factory::FactoryProvider;

    use super::*;

    #[test]
    fn type_registration_applies_transient_at_either_level() {
        let registration = TypeRegistration::new(
            key::of::<Arc<String>>(),
            InstanceProvider::new(Arc::new(String::from("svc"))),
            Lifetime::Transient,
        );

        for mut registrar in [Registrar::application(), Registrar::request()] {
            registration.apply_to(&mut registrar);
            let map = registrar.finish().unwrap();
            assert!(map.contains(registration.key()));
        }
    }

    #[test]
    fn type_registration_fails_when_lifetime_does_not_fit_the_level() {
        let per_request = TypeRegistration::new(
            key::of::<Arc<String>>(),
            InstanceProvider::new(Arc::new(String::from("svc"))),
            Lifetime::PerRequest,
        );
        let mut registrar = Registrar::application();
        per_request.apply_to(&mut registrar);
        assert!(matches!(
            registrar.finish().unwrap_err(),
            ConfigError::InvalidLifetime {
                lifetime: Lifetime::PerRequest,
                ..
            }
        ));

        let singleton = TypeRegistration::new(
            key::of::<Arc<String>>(),
            InstanceProvider::new(Arc::new(String::from("svc"))),
            Lifetime::Singleton,
        );
        let mut registrar = Registrar::request();
        singleton.apply_to(&mut registrar);
        assert!(matches!(
            registrar.finish().unwrap_err(),
            ConfigError::InvalidLifetime {
                lifetime: Lifetime::Singleton,
                ..
            }
        ));
    }

    #[test]
    fn instance_registration_preserves_identity() {
        let instance = Arc::new(String::from("the one"));
        let registration = InstanceRegistration::new(key::of::<Arc<String>>(), Arc::clone(&instance));

        let mut registrar = Registrar::application();
        registration.apply_to(&mut registrar);
        let container = ApplicationContainer::new(registrar.finish().unwrap());

        let resolved: Arc<String> = container.resolve(key::of()).unwrap();
        assert!(Arc::ptr_eq(&resolved, &instance));
    }

    #[test]
    fn collection_registration_preserves_member_order() {
        let collection = CollectionRegistration::of::<Arc<String>>()
            .with_instance("first", Arc::new(String::from("a")))
            .with(
                "second",
                FactoryProvider::new(|_| {
                    Ok(Ok::<_, Infallible>(Arc::new(String::from("b"))))
                }),
            )
            .with_instance("third", Arc::new(String::from("c")))
            .build();
        assert_eq!(collection.len(), 3);

        let mut registrar = Registrar::application();
        collection.apply_to(&mut registrar);
        let container = ApplicationContainer::new(registrar.finish().unwrap());

        let all: Vec<Arc<String>> = container.resolve_all().unwrap();
        let values: Vec<&str> = all.iter().map(|s| s.as_str()).collect();
        assert_eq!(values, vec!["a", "b", "c"]);
    }

    #[test]
    fn module_registration_registers_under_its_name() {
        struct Files;

        impl Module for Files {
            fn name(&self) -> &str {
                "files"
            }
        }

        let registration = ModuleRegistration::new(
            "files",
            FactoryProvider::new(|_| {
                Ok(Ok::<_, Infallible>(Arc::new(Files) as Arc<dyn Module>))
            }),
        );
        assert_eq!(registration.name(), "files");

        let mut registrar = Registrar::request();
        registration.apply_to(&mut registrar);
        let map = registrar.finish().unwrap();
        assert!(map.contains(&key::named::<Arc<dyn Module>>("files") as &dyn Key));
    }
}
