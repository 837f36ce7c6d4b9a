use crate::key::Key;

/// Per-resolution state threaded through nested provider calls.
///
/// Each nested dependency resolution appends one frame, so the context
/// always carries the full chain of keys from the outermost request down
/// to the current one. The chain is borrowed from the caller's stack and
/// never allocates.
#[derive(Clone)]
pub struct CallContext<'a> {
    trace: ResolutionTrace<'a>,
}

impl<'a> CallContext<'a> {
    pub fn new(key: &'a dyn Key) -> Self {
        Self {
            trace: ResolutionTrace::new(key),
        }
    }

    pub fn append<'b>(&'b self, key: &'b dyn Key) -> CallContext<'b> {
        CallContext {
            trace: self.trace.append(key),
        }
    }

    pub fn key(&self) -> &dyn Key {
        self.trace.key()
    }

    pub fn trace(&self) -> &ResolutionTrace<'_> {
        &self.trace
    }
}

/// A linked list of the keys currently being resolved, most recent first.
#[derive(Clone)]
pub struct ResolutionTrace<'a> {
    key: &'a dyn Key,
    previous: Option<&'a ResolutionTrace<'a>>,
}

impl<'a> ResolutionTrace<'a> {
    pub fn new(key: &'a dyn Key) -> Self {
        Self {
            key,
            previous: None,
        }
    }

    pub fn append<'b>(&'b self, key: &'b dyn Key) -> ResolutionTrace<'b> {
        ResolutionTrace {
            key,
            previous: Some(self),
        }
    }

    pub fn key(&self) -> &dyn Key {
        self.key
    }

    pub fn previous(&self) -> Option<&ResolutionTrace<'a>> {
        self.previous
    }

    /// Whether `key` already appears in an earlier frame, which means a
    /// dependency chain has looped back onto itself.
    pub fn seen_before(&self, key: &dyn Key) -> bool {
        let mut this = self;
        while let Some(previous) = this.previous() {
            if previous.key() == key {
                return true;
            }
            this = previous;
        }
        false
    }
}
