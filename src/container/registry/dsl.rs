use crate::container::registry::Registrar;
use crate::container::{Managed, SharedManaged};
use crate::key::{self, KeyImpl};
use crate::provider::factory::{Factory, FactoryProvider};
use crate::provider::instance::InstanceProvider;
use crate::provider::{TypedProvider, TypedSharedProvider};

/// Starts a registration for `T`.
///
/// The chain picks a discriminator, a construction strategy, and finally a
/// lifetime by terminating with either [`set_on`](FactoryBinding::set_on)
/// (transient) or [`set_scoped_on`](FactoryBinding::set_scoped_on) (cached
/// at the registrar's level):
///
/// ```rust,ignore
/// bind::<Arc<dyn RouteResolver>>()
///     .named("fallback")
///     .to_factory(|resolver| {
///         let catalog = resolver.resolve(key::of::<Arc<dyn ModuleCatalog>>())?;
///         Ok(Ok::<_, Infallible>(Arc::new(PrefixResolver::new(catalog)) as _))
///     })
///     .set_scoped_on(registrar);
/// ```
pub fn bind<T: Managed>() -> Binding<T> {
    Binding { key: key::of::<T>() }
}

/// The first stage of a [`bind`] chain, fixing the target type and
/// discriminator.
pub struct Binding<T: Managed> {
    key: KeyImpl<T>,
}

impl<T: Managed> Binding<T> {
    /// Discriminates this registration by `name`.
    pub fn named(self, name: &'static str) -> Self {
        Self {
            key: key::named::<T>(name),
        }
    }

    /// Hands out clones of `instance`.
    pub fn to_instance(self, instance: T) -> InstanceBinding<T>
    where
        T: Clone,
    {
        InstanceBinding {
            key: self.key,
            instance,
        }
    }

    /// Constructs objects by running `factory`, which may resolve its
    /// dependencies through the resolver it receives.
    pub fn to_factory<F>(self, factory: F) -> FactoryBinding<F>
    where
        F: Factory<Output = T>,
    {
        FactoryBinding {
            key: self.key,
            factory,
        }
    }

    /// Constructs objects with a hand-written provider.
    pub fn to_provider<P>(self, provider: P) -> ProviderBinding<P>
    where
        P: TypedProvider<Output = T>,
    {
        ProviderBinding {
            key: self.key,
            provider,
        }
    }
}

pub struct InstanceBinding<T: Managed + Clone> {
    key: KeyImpl<T>,
    instance: T,
}

impl<T: Managed + Clone> InstanceBinding<T> {
    /// Registers as transient: every resolution receives a fresh clone.
    pub fn set_on(self, registrar: &mut Registrar) {
        registrar.register(self.key, InstanceProvider::new(self.instance));
    }

    /// Registers cached at the registrar's level.
    pub fn set_scoped_on(self, registrar: &mut Registrar)
    where
        T: SharedManaged,
    {
        registrar.register_instance(self.key, self.instance);
    }
}

pub struct FactoryBinding<F: Factory> {
    key: KeyImpl<<F as Factory>::Output>,
    factory: F,
}

impl<F: Factory> FactoryBinding<F> {
    /// Registers as transient: the factory runs on every resolution.
    pub fn set_on(self, registrar: &mut Registrar) {
        registrar.register(self.key, FactoryProvider::new(self.factory));
    }

    /// Registers cached at the registrar's level: the factory runs once.
    pub fn set_scoped_on(self, registrar: &mut Registrar)
    where
        <F as Factory>::Output: SharedManaged,
    {
        registrar.register_scoped(self.key, FactoryProvider::new(self.factory));
    }
}

pub struct ProviderBinding<P: TypedProvider> {
    key: KeyImpl<P::Output>,
    provider: P,
}

impl<P: TypedProvider> ProviderBinding<P> {
    /// Registers as transient.
    pub fn set_on(self, registrar: &mut Registrar) {
        registrar.register(self.key, self.provider);
    }

    /// Registers cached at the registrar's level.
    pub fn set_scoped_on(self, registrar: &mut Registrar)
    where
        P: TypedSharedProvider,
    {
        registrar.register_scoped(self.key, self.provider);
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::sync::Arc;

    use crate::key::Key;

    use super::*;

    #[test]
    fn bind_to_instance_succeeds() {
        let mut registrar = Registrar::application();
        bind::<i32>().to_instance(42).set_on(&mut registrar);
        bind::<Arc<i32>>()
            .named("limit")
            .to_instance(Arc::new(16))
            .set_scoped_on(&mut registrar);

        let map = registrar.finish().unwrap();
        assert!(map.contains(&key::of::<i32>() as &dyn Key));
        assert!(map.contains(&key::named::<Arc<i32>>("limit") as &dyn Key));
    }

    #[test]
    fn bind_to_factory_succeeds() {
        let mut registrar = Registrar::application();
        bind::<Arc<i32>>()
            .to_factory(|_| Ok(Ok::<_, Infallible>(Arc::new(42))))
            .set_scoped_on(&mut registrar);

        let map = registrar.finish().unwrap();
        assert!(map.contains(&key::of::<Arc<i32>>() as &dyn Key));
    }

    #[test]
    fn bind_to_provider_succeeds() {
        let mut registrar = Registrar::application();
        bind::<i32>()
            .to_provider(InstanceProvider::new(42))
            .set_on(&mut registrar);

        let map = registrar.finish().unwrap();
        assert!(map.contains(&key::of::<i32>() as &dyn Key));
    }
}
