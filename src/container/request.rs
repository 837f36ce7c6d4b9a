use std::any::TypeId;
use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::container::application::ApplicationContainer;
use crate::container::registry::{ProviderEntry, ProviderMap};
use crate::container::resolve::{
    deferred_handles, CachedObject, Deferred, ObjectMap, Resolve, ResolveError,
};
use crate::container::{Managed, SharedManaged};
use crate::key::Key;
use crate::provider::context::CallContext;
use crate::provider::{Provider, SharedProvider};

/// The request-level container: an overlay over the application container
/// with its own registrations and its own cache.
///
/// Request-scoped objects live exactly as long as this container. Keys not
/// registered here fall through to the application level, where singletons
/// are constructed and cached by the application container itself, so they
/// can never capture request-scoped dependencies. A key registered at both
/// levels resolves to the request-level registration.
#[derive(Clone)]
pub struct RequestContainer {
    core: Arc<RequestCore>,
}

impl RequestContainer {
    pub(crate) fn new(application: ApplicationContainer, providers: Arc<ProviderMap>) -> Self {
        Self {
            core: Arc::new(RequestCore::new(application, providers)),
        }
    }

    /// The application container this overlay falls back to.
    pub fn application(&self) -> &ApplicationContainer {
        &self.core.application
    }

    /// Returns one lazy handle per registration targeting `T` visible from
    /// this level, in registration order.
    pub fn resolve_all_deferred<T>(&self) -> Vec<Deferred<T>>
    where
        T: Managed,
    {
        deferred_handles(self)
    }

    /// Places a pre-built object straight into the request cache. The
    /// bootstrapper uses this to expose the request context itself.
    pub(crate) fn seed(&self, key: Box<dyn Key>, object: Box<dyn SharedManaged>) {
        self.core.seed(key, object);
    }
}

impl Resolve for RequestContainer {
    fn dyn_resolve(&self, key: &dyn Key) -> Result<Box<dyn Managed>, ResolveError> {
        let context = CallContext::new(key);
        self.core.get_object(&context)
    }

    fn dyn_resolve_dependency<'a>(
        &self,
        key: &dyn Key,
        context: &'a CallContext<'a>,
    ) -> Result<Box<dyn Managed>, ResolveError> {
        let context = context.append(key);
        self.core.get_object(&context)
    }

    fn registered_keys(&self, target: TypeId) -> Vec<Box<dyn Key>> {
        self.core.registered_keys(target)
    }
}

struct RequestCore {
    application: ApplicationContainer,
    providers: Arc<ProviderMap>,
    state: Mutex<RequestState>,
}

impl RequestCore {
    fn new(application: ApplicationContainer, providers: Arc<ProviderMap>) -> Self {
        Self {
            application,
            providers,
            state: Mutex::new(RequestState::new()),
        }
    }

    fn seed(&self, key: Box<dyn Key>, object: Box<dyn SharedManaged>) {
        self.state.lock().objects.insert(key, CachedObject::new(object));
    }

    fn get_object(&self, context: &CallContext<'_>) -> Result<Box<dyn Managed>, ResolveError> {
        let key = context.key();
        if let Some(object) = self.cached_object(key) {
            return Ok(object);
        }
        if let Some(entry) = self.providers.get(key) {
            return match entry {
                ProviderEntry::Shared { provider, .. } => {
                    self.get_shared_object(provider.as_ref(), context)
                }
                ProviderEntry::Owned { provider, .. } => {
                    self.get_owned_object(provider.as_ref(), context)
                }
            };
        }
        match self.application.core().providers().get(key) {
            Some(ProviderEntry::Owned { provider, .. }) => {
                self.get_owned_object(provider.as_ref(), context)
            }
            // Shared entries and seeded singletons both belong to the
            // application level: the singleton is constructed and cached
            // there, against application registrations only.
            _ => self.application.core().get_object(context),
        }
    }

    fn cached_object(&self, key: &dyn Key) -> Option<Box<dyn Managed>> {
        let state = self.state.lock();
        state.objects.get(key).map(|object| object.clone_managed())
    }

    fn get_owned_object(
        &self,
        provider: &dyn Provider,
        context: &CallContext<'_>,
    ) -> Result<Box<dyn Managed>, ResolveError> {
        let key = context.key();
        if context.trace().seen_before(key) {
            return Err(ResolveError::CyclicDependency {
                key: key.dyn_clone(),
            });
        }
        provider.dyn_provide(self, context)
    }

    fn get_shared_object(
        &self,
        provider: &dyn SharedProvider,
        context: &CallContext<'_>,
    ) -> Result<Box<dyn Managed>, ResolveError> {
        let key = context.key();
        let mut state = self.state.lock();
        if let Some(object) = state.objects.get(key) {
            return Ok(object.clone_managed());
        }
        if state.constructing.contains(key) {
            return Err(ResolveError::CyclicDependency {
                key: key.dyn_clone(),
            });
        }
        state.constructing.insert(key.dyn_clone());
        drop(state);

        trace!(key = %key, "constructing request scoped object");
        let constructed = provider.dyn_provide_shared(self, context);

        let mut state = self.state.lock();
        state.constructing.remove(key);
        match constructed {
            Ok(object) => {
                state
                    .objects
                    .insert(key.dyn_clone(), CachedObject::new(object.dyn_clone()));
                Ok(object.upcast_managed())
            }
            Err(err) => Err(err),
        }
    }

    fn registered_keys(&self, target: TypeId) -> Vec<Box<dyn Key>> {
        let mut keys = self.application.core().providers().keys(target);
        for key in self.providers.keys(target) {
            // A key registered at both levels is listed once, at its
            // application-level position.
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }
}

impl Resolve for RequestCore {
    fn dyn_resolve(&self, key: &dyn Key) -> Result<Box<dyn Managed>, ResolveError> {
        let context = CallContext::new(key);
        self.get_object(&context)
    }

    fn dyn_resolve_dependency<'a>(
        &self,
        key: &dyn Key,
        context: &'a CallContext<'a>,
    ) -> Result<Box<dyn Managed>, ResolveError> {
        let context = context.append(key);
        self.get_object(&context)
    }

    fn registered_keys(&self, target: TypeId) -> Vec<Box<dyn Key>> {
        self.registered_keys(target)
    }
}

struct RequestState {
    objects: ObjectMap,
    constructing: HashSet<Box<dyn Key>>,
}

impl RequestState {
    fn new() -> Self {
        Self {
            objects: ObjectMap::new(),
            constructing: HashSet::new(),
        }
    }
}
