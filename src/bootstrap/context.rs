use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::bootstrap::BootstrapError;
use crate::container::RequestContainer;

/// State for one inbound request.
///
/// The host creates one context per request and passes it to every call
/// made on that request's behalf. The context owns the request container
/// once one has been created, so dropping the context releases every
/// request-scoped object on every exit path.
pub struct RequestContext {
    path: String,
    container: Mutex<Option<RequestContainer>>,
}

impl RequestContext {
    pub fn new(path: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            path: path.into(),
            container: Mutex::new(None),
        })
    }

    /// The request path being served.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The container attached to this context, if one has been created yet.
    pub fn container(&self) -> Option<RequestContainer> {
        self.container.lock().clone()
    }

    /// Returns the attached container, creating it with `create` on first
    /// use. Concurrent callers serialize on the context; the first one
    /// creates and every later caller receives a handle to the same
    /// container.
    pub(crate) fn container_or_create<F>(&self, create: F) -> Result<RequestContainer, BootstrapError>
    where
        F: FnOnce() -> Result<RequestContainer, BootstrapError>,
    {
        let mut slot = self.container.lock();
        if let Some(container) = slot.as_ref() {
            return Ok(container.clone());
        }
        let container = create()?;
        *slot = Some(container.clone());
        Ok(container)
    }
}

impl Debug for RequestContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("RequestContext")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use crate::container::{ApplicationContainer, RequestContainer};

    use super::*;

    fn empty_container() -> RequestContainer {
        let application = ApplicationContainer::new(Default::default());
        RequestContainer::new(application, Arc::new(Default::default()))
    }

    #[test]
    fn container_or_create_runs_create_once() {
        let context = RequestContext::new("/files");
        assert!(context.container().is_none());

        let mut calls = 0;
        context
            .container_or_create(|| {
                calls += 1;
                Ok(empty_container())
            })
            .unwrap();
        context
            .container_or_create(|| {
                calls += 1;
                Ok(empty_container())
            })
            .unwrap();

        assert_eq!(calls, 1);
        assert!(context.container().is_some());
    }

    #[test]
    fn container_or_create_fails_without_caching() {
        let context = RequestContext::new("/files");
        let res = context.container_or_create(|| {
            Err(BootstrapError::UnknownModule {
                name: String::from("files"),
            })
        });

        assert!(res.is_err());
        assert!(context.container().is_none());
    }
}
