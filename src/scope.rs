use std::fmt::{Display, Formatter, Result as FmtResult};

/// How long a resolved instance is retained and reused.
///
/// The container hierarchy has exactly two levels, so a registration's
/// lifetime is one of three cases: rebuilt on every resolution, cached in
/// the application container, or cached in one request container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// A fresh instance is constructed for every resolution.
    Transient,
    /// One instance is constructed and cached for the whole application.
    Singleton,
    /// One instance is constructed and cached per request container.
    PerRequest,
}

impl Lifetime {
    pub fn to_str(&self) -> &'static str {
        match self {
            Self::Transient => "Transient",
            Self::Singleton => "Singleton",
            Self::PerRequest => "PerRequest",
        }
    }
}

impl Display for Lifetime {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.to_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifetime_display_succeeds() {
        assert_eq!(Lifetime::Transient.to_string(), "Transient");
        assert_eq!(Lifetime::Singleton.to_string(), "Singleton");
        assert_eq!(Lifetime::PerRequest.to_string(), "PerRequest");
    }
}
