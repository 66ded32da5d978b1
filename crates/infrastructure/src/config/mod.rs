//! Chaos configuration
//!
//! Split into focused sub-modules:
//! - `rules`: declarative rules and how they are applied to affected services
//! - `reload`: hot-swapping settings at runtime
//!
//! Sources, later ones overriding earlier ones: built-in defaults, an
//! optional `chaos.toml` (or an explicit file), then `RUHROH_*` environment
//! variables such as `RUHROH_ENABLED=false` or `RUHROH_LOGGING__JSON=true`.

mod reload;
mod rules;

use std::path::Path;
use std::time::Duration;

use application::{AffectedServiceRegistry, ChaosSettings, DEFAULT_TRIGGER_PROBABILITY, Probability};
use domain::AuthoringError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::telemetry::LoggingConfig;

pub use reload::{ReloadableChaosConfig, spawn_config_reload_handler};
pub use rules::{ActionConfig, ArgConfig, ConfiguredRules, RuleConfig, TriggerConfig};

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "chaos.toml";

/// Prefix of environment variable overrides
pub const ENV_PREFIX: &str = "RUHROH";

const fn default_true() -> bool {
    true
}

const fn default_probability() -> f64 {
    DEFAULT_TRIGGER_PROBABILITY
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or deserialized
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A setting is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] AuthoringError),

    /// A declarative rule is invalid
    #[error("Invalid rule #{index} ({contract}.{method}): {source}")]
    Rule {
        index: usize,
        contract: String,
        method: String,
        #[source]
        source: AuthoringError,
    },

    /// The configuration could not be written back as TOML
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl ConfigError {
    pub(crate) fn rule(index: usize, rule: &RuleConfig, source: AuthoringError) -> Self {
        Self::Rule {
            index,
            contract: rule.contract.clone(),
            method: rule.method.clone(),
            source,
        }
    }
}

/// Root configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChaosConfig {
    /// Global switch; `false` makes every proxy pass calls through
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Probability for random triggers that do not name one
    #[serde(default = "default_probability")]
    pub default_probability: f64,

    /// Upper bound on injected delays, in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_delay_ms: Option<u64>,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Declarative rules, applied per contract
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

impl Default for ChaosConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_probability: DEFAULT_TRIGGER_PROBABILITY,
            max_delay_ms: None,
            logging: LoggingConfig::default(),
            rules: Vec::new(),
        }
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

impl ChaosConfig {
    /// Load from an optional `chaos.toml` and the environment
    ///
    /// # Errors
    ///
    /// Returns an error if a source is malformed.
    pub fn load() -> Result<Self, ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(DEFAULT_CONFIG_FILE).required(false))
            .add_source(environment())
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Load from `path` (which must exist) and the environment
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or a source is malformed.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(true))
            .add_source(environment())
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Parse TOML text, ignoring the environment
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid configuration.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Render as TOML
    ///
    /// # Errors
    ///
    /// Returns an error if a rule value has no TOML representation.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Engine settings described by this configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `default_probability` is outside
    /// `[0, 1]`.
    pub fn settings(&self) -> Result<ChaosSettings, ConfigError> {
        Probability::new(self.default_probability)?;
        Ok(ChaosSettings {
            enabled: self.enabled,
            default_probability: self.default_probability,
            max_delay: self.max_delay_ms.map(Duration::from_millis),
        })
    }

    /// Check the parts of every rule that do not depend on a contract
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting or rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.settings()?;
        for (index, rule) in self.rules.iter().enumerate() {
            let check = || -> Result<(), AuthoringError> {
                if rule.method.trim().is_empty() {
                    return Err(AuthoringError::EmptyMethodName);
                }
                if let Some(latency) = rule.action.latency() {
                    latency.validate()?;
                }
                rule.trigger.to_policy(self.default_probability)?;
                Ok(())
            };
            check().map_err(|source| ConfigError::rule(index, rule, source))?;
        }
        Ok(())
    }

    /// Rules targeting `contract`, with their index in the file
    pub fn rules_for<'a>(
        &'a self,
        contract: &'a str,
    ) -> impl Iterator<Item = (usize, &'a RuleConfig)> + 'a {
        self.rules
            .iter()
            .enumerate()
            .filter(move |(_, rule)| rule.contract == contract)
    }

    /// Check that every rule names a contract affected in `registry`
    ///
    /// # Errors
    ///
    /// Returns [`AuthoringError::UnknownContract`] for the first rule
    /// naming an unaffected contract.
    pub fn validate_contracts(&self, registry: &AffectedServiceRegistry) -> Result<(), ConfigError> {
        for (index, rule) in self.rules.iter().enumerate() {
            if registry.find_by_name(&rule.contract).is_none() {
                return Err(ConfigError::rule(
                    index,
                    rule,
                    AuthoringError::UnknownContract(rule.contract.clone()),
                ));
            }
        }
        Ok(())
    }
}
