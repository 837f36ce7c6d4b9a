use std::collections::HashMap;

use crate::container::{Managed, SharedManaged};
use crate::key::Key;

/// The cache of already-constructed shared objects owned by one container
/// level. Lookup is always by exact key; enumeration stays with the
/// provider map, which knows registration order.
#[derive(Debug, Default)]
pub struct ObjectMap {
    objects: HashMap<Box<dyn Key>, CachedObject>,
}

impl ObjectMap {
    pub fn new() -> Self {
        Self {
            objects: HashMap::new(),
        }
    }

    pub fn insert(&mut self, key: Box<dyn Key>, object: CachedObject) -> Option<CachedObject> {
        self.objects.insert(key, object)
    }

    pub fn get(&self, key: &dyn Key) -> Option<&CachedObject> {
        self.objects.get(key)
    }

    pub fn contains(&self, key: &dyn Key) -> bool {
        self.objects.contains_key(key)
    }
}

/// One cached shared object, duplicated on every cache hit.
pub struct CachedObject {
    object: Box<dyn SharedManaged>,
}

impl CachedObject {
    pub fn new(object: Box<dyn SharedManaged>) -> Self {
        Self { object }
    }

    pub fn clone_managed(&self) -> Box<dyn Managed> {
        self.object.dyn_clone().upcast_managed()
    }
}

impl std::fmt::Debug for CachedObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedObject").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::key;
    use crate::util::any::DowncastRef;

    use super::*;

    #[test]
    fn object_map_insert_then_get_succeeds() {
        let mut map = ObjectMap::new();
        let object = Arc::new(42i32);

        let key = key::of::<Arc<i32>>();
        let prev = map.insert(Box::new(key), CachedObject::new(Box::new(object)));
        assert!(prev.is_none());

        let cached = map.get(&key as &dyn Key).unwrap().clone_managed();
        assert_eq!(**cached.downcast_ref::<Arc<i32>>().unwrap(), 42);
    }

    #[test]
    fn object_map_get_fails_when_discriminator_differs() {
        let mut map = ObjectMap::new();
        let object = Arc::new(42i32);

        let key = key::named::<Arc<i32>>("answer");
        map.insert(Box::new(key), CachedObject::new(Box::new(object)));

        assert!(!map.contains(&key::of::<Arc<i32>>() as &dyn Key));
        assert!(map.contains(&key as &dyn Key));
    }
}
