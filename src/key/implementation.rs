use std::any::{self, TypeId};
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::container::Managed;
use crate::key::{Key, TypedKey};

/// The standard [`TypedKey`] implementation backing [`of`](crate::key::of)
/// and [`named`](crate::key::named).
pub struct KeyImpl<T: Managed> {
    discriminator: Option<&'static str>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Managed> KeyImpl<T> {
    pub(crate) fn new(discriminator: Option<&'static str>) -> Self {
        Self {
            discriminator,
            _marker: PhantomData,
        }
    }
}

impl<T: Managed> Clone for KeyImpl<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Managed> Copy for KeyImpl<T> {}

impl<T: Managed> Debug for KeyImpl<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(self, f)
    }
}

impl<T: Managed> Display for KeyImpl<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self.discriminator {
            Some(name) => write!(f, "{}@{name:?}", any::type_name::<T>()),
            None => write!(f, "{}", any::type_name::<T>()),
        }
    }
}

impl<T: Managed> PartialEq for KeyImpl<T> {
    fn eq(&self, other: &Self) -> bool {
        self.discriminator == other.discriminator
    }
}

impl<T: Managed> Eq for KeyImpl<T> {}

impl<T: Managed> Hash for KeyImpl<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.discriminator.hash(state);
    }
}

impl<T: Managed> Key for KeyImpl<T> {
    fn target_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn discriminator(&self) -> Option<&'static str> {
        self.discriminator
    }

    fn dyn_clone(&self) -> Box<dyn Key> {
        Box::new(*self)
    }
}

impl<T: Managed> TypedKey for KeyImpl<T> {
    type Target = T;
}

#[cfg(test)]
mod tests {
    use crate::key;

    use super::*;

    #[test]
    fn key_impl_target_type_succeeds() {
        let plain: Box<dyn Key> = Box::new(key::of::<i32>());
        let named: Box<dyn Key> = Box::new(key::named::<i32>("fallback"));

        assert_eq!(plain.target_type(), TypeId::of::<i32>());
        assert_eq!(named.target_type(), TypeId::of::<i32>());
    }

    #[test]
    fn key_impl_discriminator_succeeds() {
        assert_eq!(key::of::<i32>().discriminator(), None);
        assert_eq!(
            key::named::<i32>("fallback").discriminator(),
            Some("fallback")
        );
    }

    #[test]
    fn key_impl_display_includes_discriminator() {
        let named = key::named::<i32>("fallback");
        assert_eq!(named.to_string(), "i32@\"fallback\"");
        assert_eq!(key::of::<i32>().to_string(), "i32");
    }
}
