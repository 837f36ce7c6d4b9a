use std::collections::HashMap;

/// Key-value settings assembled once while the bootstrapper initialises
/// and read-only afterwards.
#[derive(Debug, Default, Clone)]
pub struct Environment {
    entries: HashMap<String, String>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

/// Fills in the [`Environment`] during initialisation. Hosts override the
/// default registration to enable framework features.
pub trait EnvironmentConfigurator: Send + Sync + 'static {
    fn configure(&self, environment: &mut Environment);
}

/// The stock configurator: everything optional stays off.
#[derive(Debug, Default)]
pub struct DefaultEnvironmentConfigurator;

impl EnvironmentConfigurator for DefaultEnvironmentConfigurator {
    fn configure(&self, environment: &mut Environment) {
        environment.set("request-tracing", "disabled");
    }
}
