mod dsl;
mod provider_map;
mod registrar;

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};

use snafu::prelude::*;

use crate::key::Key;
use crate::scope::Lifetime;

pub use dsl::{bind, Binding, FactoryBinding, InstanceBinding, ProviderBinding};
pub use registrar::Registrar;

pub(crate) use provider_map::{ProviderEntry, ProviderMap};

/// The container level a [`Registrar`] is collecting registrations for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistrationLevel {
    Application,
    Request,
}

impl RegistrationLevel {
    pub fn to_str(&self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::Request => "request",
        }
    }
}

impl Display for RegistrationLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.to_str())
    }
}

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum ConfigError {
    #[snafu(display("the key {key} is already registered at this level"))]
    #[non_exhaustive]
    KeyDuplicated { key: Box<dyn Key> },
    #[snafu(display("a {lifetime} registration for {key} is not allowed at the {level} level"))]
    #[non_exhaustive]
    InvalidLifetime {
        key: Box<dyn Key>,
        lifetime: Lifetime,
        level: RegistrationLevel,
    },
    #[snafu(display("the host's {hook} hook failed"))]
    #[non_exhaustive]
    HostHook {
        hook: &'static str,
        source: Box<dyn Error + Send + Sync>,
    },
    #[snafu(display("aggregated configuration errors:\n{}", AggregatedDisplayer::new(errors)))]
    Aggregated { errors: Vec<ConfigError> },
}

struct AggregatedDisplayer<'a> {
    errors: &'a [ConfigError],
}

impl<'a> AggregatedDisplayer<'a> {
    fn new(errors: &'a [ConfigError]) -> Self {
        Self { errors }
    }
}

impl Display for AggregatedDisplayer<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for (i, error) in self.errors.iter().enumerate() {
            writeln!(f, "{:4}: {}", i + 1, error)?;
        }
        Ok(())
    }
}
