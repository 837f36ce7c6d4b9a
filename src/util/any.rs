use std::any::{self, Any};
use std::ops::Deref;

/// An extension of [`Any`] which supports upcasting to `&dyn Any` and
/// `Box<dyn Any>`, so that concrete types can be recovered from the
/// type-erased objects the containers hand around.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    fn type_name(&self) -> &'static str;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn type_name(&self) -> &'static str {
        any::type_name::<T>()
    }
}

/// Checked downcasting for references to type-erased objects.
pub trait DowncastRef {
    fn is<T: Any>(&self) -> bool;

    fn downcast_ref<T: Any>(&self) -> Option<&T>;
}

impl<S> DowncastRef for S
where
    S: Deref,
    S::Target: AsAny,
{
    fn is<T: Any>(&self) -> bool {
        (**self).as_any().is::<T>()
    }

    fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (**self).as_any().downcast_ref::<T>()
    }
}

/// Checked downcasting for owned boxes, returning the original box when
/// the concrete type doesn't match.
pub trait Downcast: Sized {
    fn downcast<T: Any>(self) -> Result<Box<T>, Self>;
}

impl<S> Downcast for Box<S>
where
    S: AsAny + ?Sized,
{
    fn downcast<T: Any>(self) -> Result<Box<T>, Self> {
        if self.is::<T>() {
            let res = self.into_any().downcast::<T>();
            Ok(res.unwrap_or_else(|_| unreachable!("`self` should be a `Box<T>`")))
        } else {
            Err(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Service: AsAny {}

    struct Router;

    impl Service for Router {}

    #[test]
    fn downcast_ref_succeeds_when_type_matches() {
        let service: Box<dyn Service> = Box::new(Router);
        assert!(service.is::<Router>());
        assert!(service.downcast_ref::<Router>().is_some());
    }

    #[test]
    fn downcast_fails_when_type_differs() {
        let service: Box<dyn Service> = Box::new(Router);
        assert!(service.downcast::<i32>().is_err());
    }

    #[test]
    fn downcast_succeeds_when_type_matches() {
        let service: Box<dyn Service> = Box::new(Router);
        let res = service.downcast::<Router>();
        assert!(res.is_ok());
    }
}
