use parking_lot::Mutex;

/// Collects human-readable events during startup and request processing.
pub trait Diagnostics: Send + Sync + 'static {
    fn record(&self, event: &str);

    fn events(&self) -> Vec<String>;
}

/// The stock implementation: an in-memory event log.
#[derive(Debug, Default)]
pub struct DefaultDiagnostics {
    events: Mutex<Vec<String>>,
}

impl DefaultDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Diagnostics for DefaultDiagnostics {
    fn record(&self, event: &str) {
        self.events.lock().push(event.to_owned());
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_record_preserves_order() {
        let diagnostics = DefaultDiagnostics::new();
        diagnostics.record("first");
        diagnostics.record("second");

        assert_eq!(diagnostics.events(), vec!["first", "second"]);
    }
}
