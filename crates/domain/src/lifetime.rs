//! Service lifetime value object

use serde::{Deserialize, Serialize};
use std::fmt;

/// How long a resolved service instance lives
///
/// Forwarded unchanged to the resolution context. Interception logic does not
/// depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceLifetime {
    /// A new instance for every resolution
    Transient,
    /// One instance per resolution scope
    Scoped,
    /// One instance for the whole provider
    #[default]
    Singleton,
}

impl ServiceLifetime {
    /// All lifetimes, shortest first
    pub const ALL: [Self; 3] = [Self::Transient, Self::Scoped, Self::Singleton];

    /// Get a human-readable label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::Scoped => "scoped",
            Self::Singleton => "singleton",
        }
    }
}

impl fmt::Display for ServiceLifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for ServiceLifetime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "transient" | "per-call" => Ok(Self::Transient),
            "scoped" | "per-scope" => Ok(Self::Scoped),
            "singleton" => Ok(Self::Singleton),
            _ => Err(format!(
                "Invalid lifetime: {s}. Use 'transient', 'scoped' or 'singleton'"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_singleton() {
        assert_eq!(ServiceLifetime::default(), ServiceLifetime::Singleton);
    }

    #[test]
    fn parses_labels_and_aliases() {
        assert_eq!(
            "Transient".parse::<ServiceLifetime>().unwrap(),
            ServiceLifetime::Transient
        );
        assert_eq!(
            "per-scope".parse::<ServiceLifetime>().unwrap(),
            ServiceLifetime::Scoped
        );
        assert!("forever".parse::<ServiceLifetime>().is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for lifetime in ServiceLifetime::ALL {
            assert_eq!(lifetime.to_string().parse::<ServiceLifetime>().unwrap(), lifetime);
        }
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&ServiceLifetime::Scoped).unwrap();
        assert_eq!(json, "\"scoped\"");
    }
}
