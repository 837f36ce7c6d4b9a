use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use oneshot::{Receiver, Sender};
use parking_lot::{RwLock, RwLockWriteGuard};
use tracing::trace;

use crate::container::registry::{ProviderEntry, ProviderMap};
use crate::container::resolve::{
    deferred_handles, CachedObject, Deferred, ObjectMap, Resolve, ResolveError,
};
use crate::container::{Managed, SharedManaged};
use crate::key::Key;
use crate::provider::context::CallContext;
use crate::provider::{Provider, SharedProvider};

/// The application-level container, built once per bootstrapped host.
///
/// Singletons are cached here for the lifetime of the application. Handles
/// are cheap to clone and safe to share between threads; all clones resolve
/// against the same registrations and the same singleton cache.
#[derive(Clone)]
pub struct ApplicationContainer {
    core: Arc<ApplicationCore>,
}

impl ApplicationContainer {
    pub(crate) fn new(providers: ProviderMap) -> Self {
        Self {
            core: Arc::new(ApplicationCore::new(providers)),
        }
    }

    /// Returns one lazy handle per registration targeting `T`, in
    /// registration order. Nothing is resolved until a handle is polled.
    pub fn resolve_all_deferred<T>(&self) -> Vec<Deferred<T>>
    where
        T: Managed,
    {
        deferred_handles(self)
    }

    pub(crate) fn core(&self) -> &Arc<ApplicationCore> {
        &self.core
    }

    /// Places a pre-built object straight into the singleton cache, outside
    /// of any provider. The bootstrapper uses this to make its own services
    /// resolvable without handing the container an owning reference cycle.
    pub(crate) fn seed(&self, key: Box<dyn Key>, object: Box<dyn SharedManaged>) {
        self.core.seed(key, object);
    }
}

impl Resolve for ApplicationContainer {
    fn dyn_resolve(&self, key: &dyn Key) -> Result<Box<dyn Managed>, ResolveError> {
        self.core.dyn_resolve(key)
    }

    fn dyn_resolve_dependency<'a>(
        &self,
        key: &dyn Key,
        context: &'a CallContext<'a>,
    ) -> Result<Box<dyn Managed>, ResolveError> {
        self.core.dyn_resolve_dependency(key, context)
    }

    fn registered_keys(&self, target: TypeId) -> Vec<Box<dyn Key>> {
        self.core.registered_keys(target)
    }
}

pub(crate) struct ApplicationCore {
    providers: Arc<ProviderMap>,
    state: RwLock<SingletonState>,
}

impl ApplicationCore {
    fn new(providers: ProviderMap) -> Self {
        Self {
            providers: Arc::new(providers),
            state: RwLock::new(SingletonState::new()),
        }
    }

    pub(crate) fn providers(&self) -> &ProviderMap {
        &self.providers
    }

    pub(crate) fn seed(&self, key: Box<dyn Key>, object: Box<dyn SharedManaged>) {
        self.state.write().objects.insert(key, CachedObject::new(object));
    }

    pub(crate) fn get_object(
        &self,
        context: &CallContext<'_>,
    ) -> Result<Box<dyn Managed>, ResolveError> {
        let key = context.key();
        if let Some(object) = self.cached_object(key) {
            return Ok(object);
        }
        match self.providers.get(key) {
            Some(ProviderEntry::Shared { provider, .. }) => {
                self.get_shared_object(provider.as_ref(), context)
            }
            Some(ProviderEntry::Owned { provider, .. }) => {
                self.get_owned_object(provider.as_ref(), context)
            }
            None => Err(ResolveError::NotFound {
                key: key.dyn_clone(),
            }),
        }
    }

    fn cached_object(&self, key: &dyn Key) -> Option<Box<dyn Managed>> {
        let state = self.state.read();
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
        let mut state = self.state.write();

        // Another resolver may have finished constructing between the
        // unlocked cache probe and this write lock.
        if let Some(object) = state.objects.get(key) {
            return Ok(object.clone_managed());
        }

        if let Some(watch) = state.constructing.get(key) {
            if watch.is_held_by_current_thread() {
                Err(Self::abort_cyclic_construction(state, key))
            } else {
                self.wait_for_peer_construction(state, key)
            }
        } else {
            self.construct_shared_object(state, provider, context)
        }
    }

    fn construct_shared_object(
        &self,
        mut state: RwLockWriteGuard<'_, SingletonState>,
        provider: &dyn SharedProvider,
        context: &CallContext<'_>,
    ) -> Result<Box<dyn Managed>, ResolveError> {
        let key = context.key();
        state
            .constructing
            .insert(key.dyn_clone(), ConstructionWatch::held_by_current_thread());
        drop(state);

        trace!(key = %key, "constructing application scoped object");
        match provider.dyn_provide_shared(self, context) {
            Ok(object) => {
                let mut state = self.state.write();
                state
                    .objects
                    .insert(key.dyn_clone(), CachedObject::new(object.dyn_clone()));
                Self::notify_waiters(state, key, ConstructionSignal::Ready);
                Ok(object.upcast_managed())
            }
            Err(err) => {
                let state = self.state.write();
                Self::notify_waiters(state, key, ConstructionSignal::Failed(err.clone()));
                Err(err)
            }
        }
    }

    fn wait_for_peer_construction(
        &self,
        mut state: RwLockWriteGuard<'_, SingletonState>,
        key: &dyn Key,
    ) -> Result<Box<dyn Managed>, ResolveError> {
        let receiver = match state.constructing.get_mut(key) {
            Some(watch) => watch.add_waiter(),
            None => unreachable!("the construction watch was found under the same lock"),
        };
        drop(state);

        match receiver.recv() {
            Ok(ConstructionSignal::Ready) => match self.cached_object(key) {
                Some(object) => Ok(object),
                None => unreachable!("the object is cached before waiters are notified"),
            },
            Ok(ConstructionSignal::Failed(err)) => Err(err),
            Err(_) => unreachable!("the constructing side notifies every waiter"),
        }
    }

    fn abort_cyclic_construction(
        state: RwLockWriteGuard<'_, SingletonState>,
        key: &dyn Key,
    ) -> ResolveError {
        let err = ResolveError::CyclicDependency {
            key: key.dyn_clone(),
        };
        Self::notify_waiters(state, key, ConstructionSignal::Failed(err.clone()));
        err
    }

    fn notify_waiters(
        mut state: RwLockWriteGuard<'_, SingletonState>,
        key: &dyn Key,
        signal: ConstructionSignal,
    ) {
        if let Some(watch) = state.constructing.remove(key) {
            drop(state);
            watch.notify(signal);
        }
    }
}

impl Resolve for ApplicationCore {
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
        self.providers.keys(target)
    }
}

struct SingletonState {
    objects: ObjectMap,
    constructing: HashMap<Box<dyn Key>, ConstructionWatch>,
}

impl SingletonState {
    fn new() -> Self {
        Self {
            objects: ObjectMap::new(),
            constructing: HashMap::new(),
        }
    }
}

/// Bookkeeping for one in-flight singleton construction: the thread doing
/// the work, plus every other thread parked until it finishes.
struct ConstructionWatch {
    on_thread: ThreadId,
    waiters: Vec<Sender<ConstructionSignal>>,
}

impl ConstructionWatch {
    fn held_by_current_thread() -> Self {
        Self {
            on_thread: thread::current().id(),
            waiters: Vec::new(),
        }
    }

    fn is_held_by_current_thread(&self) -> bool {
        self.on_thread == thread::current().id()
    }

    fn add_waiter(&mut self) -> Receiver<ConstructionSignal> {
        let (sender, receiver) = oneshot::channel();
        self.waiters.push(sender);
        receiver
    }

    fn notify(self, signal: ConstructionSignal) {
        for waiter in self.waiters {
            // A waiter may already have hung up.
            let _ = waiter.send(signal.clone());
        }
    }
}

#[derive(Clone)]
enum ConstructionSignal {
    Ready,
    Failed(ResolveError),
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::container::resolve::Resolver;
    use crate::key;
    use crate::provider::factory::FactoryProvider;
    use crate::provider::instance::InstanceProvider;

    use super::*;

    #[derive(Debug)]
    struct Gateway {
        target: String,
    }

    fn counting_gateway(counter: &Arc<AtomicUsize>) -> ProviderEntry {
        let counter = Arc::clone(counter);
        let provider = FactoryProvider::new(move |resolver: &dyn Resolve| {
            counter.fetch_add(1, Ordering::SeqCst);
            let target: String = resolver.resolve(key::of())?;
            Ok(Ok::<_, Infallible>(Arc::new(Gateway { target })))
        });
        ProviderEntry::new_shared(Box::new(key::of::<Arc<Gateway>>()), Arc::new(provider))
    }

    #[test]
    fn application_container_caches_shared_objects() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut providers = ProviderMap::new();
        providers.insert(counting_gateway(&counter));
        providers.insert(ProviderEntry::new_owned(
            Box::new(key::of::<String>()),
            Arc::new(InstanceProvider::new(String::from("upstream"))),
        ));
        let container = ApplicationContainer::new(providers);

        let first: Arc<Gateway> = container.resolve(key::of()).unwrap();
        let second: Arc<Gateway> = container.resolve(key::of()).unwrap();

        assert_eq!(first.target, "upstream");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn application_container_constructs_owned_objects_each_time() {
        let counter = Arc::new(AtomicUsize::new(0));
        let provider = FactoryProvider::new({
            let counter = Arc::clone(&counter);
            move |_| Ok(Ok::<_, Infallible>(counter.fetch_add(1, Ordering::SeqCst)))
        });
        let mut providers = ProviderMap::new();
        providers.insert(ProviderEntry::new_owned(
            Box::new(key::of::<usize>()),
            Arc::new(provider),
        ));
        let container = ApplicationContainer::new(providers);

        assert_eq!(container.resolve(key::of::<usize>()).unwrap(), 0);
        assert_eq!(container.resolve(key::of::<usize>()).unwrap(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn application_container_shares_singletons_across_threads() {
        let counter = Arc::new(AtomicUsize::new(0));
        let provider = FactoryProvider::new({
            let counter = Arc::clone(&counter);
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                // Keep construction slow enough that other threads park on
                // the watch instead of winning the race outright.
                thread::sleep(Duration::from_millis(20));
                Ok(Ok::<_, Infallible>(Arc::new(String::from("shared"))))
            }
        });
        let mut providers = ProviderMap::new();
        providers.insert(ProviderEntry::new_shared(
            Box::new(key::of::<Arc<String>>()),
            Arc::new(provider),
        ));
        let container = ApplicationContainer::new(providers);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                thread::spawn({
                    let container = container.clone();
                    move || container.resolve(key::of::<Arc<String>>()).unwrap()
                })
            })
            .collect();
        let objects: Vec<Arc<String>> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(objects
            .iter()
            .all(|object| Arc::ptr_eq(object, &objects[0])));
    }

    #[test]
    fn application_container_fails_when_shared_construction_is_cyclic() {
        let provider = FactoryProvider::new(|resolver: &dyn Resolve| {
            let inner: Arc<String> = resolver.resolve(key::of())?;
            Ok(Ok::<_, Infallible>(inner))
        });
        let mut providers = ProviderMap::new();
        providers.insert(ProviderEntry::new_shared(
            Box::new(key::of::<Arc<String>>()),
            Arc::new(provider),
        ));
        let container = ApplicationContainer::new(providers);

        assert!(matches!(
            container.resolve(key::of::<Arc<String>>()),
            Err(ResolveError::CyclicDependency { .. })
        ));
    }

    #[test]
    fn application_container_fails_when_owned_construction_is_cyclic() {
        let provider = FactoryProvider::new(|resolver: &dyn Resolve| {
            let inner: i32 = resolver.resolve(key::of())?;
            Ok(Ok::<_, Infallible>(inner))
        });
        let mut providers = ProviderMap::new();
        providers.insert(ProviderEntry::new_owned(
            Box::new(key::of::<i32>()),
            Arc::new(provider),
        ));
        let container = ApplicationContainer::new(providers);

        assert!(matches!(
            container.resolve(key::of::<i32>()),
            Err(ResolveError::CyclicDependency { .. })
        ));
    }

    #[test]
    fn application_container_fails_when_key_not_found() {
        let container = ApplicationContainer::new(ProviderMap::new());

        assert!(matches!(
            container.resolve(key::of::<i32>()),
            Err(ResolveError::NotFound { .. })
        ));
    }

    #[test]
    fn application_container_serves_seeded_objects() {
        let container = ApplicationContainer::new(ProviderMap::new());
        container.seed(
            Box::new(key::of::<Arc<String>>()),
            Box::new(Arc::new(String::from("seeded"))),
        );

        let object: Arc<String> = container.resolve(key::of()).unwrap();
        assert_eq!(object.as_str(), "seeded");
    }
}
