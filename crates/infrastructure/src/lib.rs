//! Infrastructure layer - container, configuration and logging
//!
//! Implements the resolution port of the application layer with a small
//! service container, wires affected contracts into it, and loads chaos
//! settings and declarative rules from files and the environment.

pub mod affect;
pub mod config;
pub mod container;
pub mod telemetry;

pub use affect::ChaosServiceCollectionExt;
pub use config::{
    ActionConfig, ArgConfig, ChaosConfig, ConfigError, ConfiguredRules, ReloadableChaosConfig,
    RuleConfig, TriggerConfig, spawn_config_reload_handler,
};
pub use container::{ServiceCollection, ServiceDescriptor, ServiceProvider, ServiceScope};
pub use telemetry::{LoggingConfig, TelemetryError, init_logging};
