mod implementation;

use std::any::TypeId;
use std::fmt::{Debug, Display};
use std::hash::{Hash, Hasher};

use crate::container::Managed;
use crate::util::any::AsAny;
use crate::util::hash::DynHash;

pub use crate::key::implementation::KeyImpl;

/// A type-erased registration key.
///
/// A key identifies one entry in a container: the target type to resolve,
/// plus an optional discriminator distinguishing multiple registrations of
/// the same type. Keys are comparable and hashable behind `dyn Key`, so
/// they can index the provider and object tables directly.
pub trait Key
where
    Self: Debug + Display + AsAny + DynHash + Send + Sync + 'static,
{
    /// The [`TypeId`] of the type this key resolves to.
    fn target_type(&self) -> TypeId;

    /// The discriminator, or `None` for the default registration.
    fn discriminator(&self) -> Option<&'static str>;

    fn dyn_clone(&self) -> Box<dyn Key>;
}

impl PartialEq for dyn Key {
    fn eq(&self, other: &Self) -> bool {
        self.dyn_eq(other.as_any())
    }
}

impl Eq for dyn Key {}

impl Hash for dyn Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.dyn_hash(state);
    }
}

/// A [`Key`] which still knows its target type at compile time, enabling
/// typed resolution without a downcast at the call site.
pub trait TypedKey: Key + Copy + Eq + Hash {
    type Target: Managed;
}

/// Returns the default key for `T`.
pub fn of<T: Managed>() -> KeyImpl<T> {
    KeyImpl::new(None)
}

/// Returns a key for `T` discriminated by `name`, so that several
/// implementations of one interface can coexist in a container.
pub fn named<T: Managed>(name: &'static str) -> KeyImpl<T> {
    KeyImpl::new(Some(name))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn key_eq_succeeds_when_type_and_discriminator_match() {
        let plain: Box<dyn Key> = Box::new(of::<i32>());
        let first: Box<dyn Key> = Box::new(named::<i32>("first"));
        let second: Box<dyn Key> = Box::new(named::<i32>("second"));

        assert_eq!(&plain, &of::<i32>().dyn_clone());
        assert_ne!(&plain, &first);
        assert_ne!(&first, &second);
    }

    #[test]
    fn key_eq_fails_when_target_type_differs() {
        let a: Box<dyn Key> = Box::new(of::<i32>());
        let b: Box<dyn Key> = Box::new(of::<u32>());
        assert_ne!(&a, &b);
    }

    #[test]
    fn key_usable_as_hash_set_element() {
        let mut keys: HashSet<Box<dyn Key>> = HashSet::new();
        keys.insert(Box::new(named::<i32>("first")));
        keys.insert(Box::new(named::<i32>("first")));
        keys.insert(Box::new(named::<i32>("second")));

        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&named::<i32>("first") as &dyn Key));
    }
}
