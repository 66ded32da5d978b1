//! Hot-reloadable chaos settings
//!
//! Provides SIGHUP signal handling for switching chaos on or off, or
//! changing probabilities and delay caps, without restarting the process.
//! Rules already applied to affected services are left untouched.

use std::path::PathBuf;
use std::sync::Arc;

use application::AffectedServiceRegistry;
use arc_swap::ArcSwap;
use tokio::sync::watch;
use tracing::{error, info, warn};

use super::{ChaosConfig, ConfigError};

/// A wrapper around [`ChaosConfig`] that pushes its settings into a registry
#[derive(Debug, Clone)]
pub struct ReloadableChaosConfig {
    inner: Arc<ArcSwap<ChaosConfig>>,
    registry: Arc<AffectedServiceRegistry>,
    /// File re-read on reload; `None` means the default sources
    source: Option<PathBuf>,
    /// Bumped after every successful replace
    notify: watch::Sender<u64>,
    receiver: watch::Receiver<u64>,
}

impl ReloadableChaosConfig {
    /// Wrap `config` and apply its settings to `registry`
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid; the registry is
    /// left unchanged.
    pub fn new(
        config: ChaosConfig,
        registry: Arc<AffectedServiceRegistry>,
        source: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        registry.apply_settings(config.settings()?);

        let (notify, receiver) = watch::channel(0);
        Ok(Self {
            inner: Arc::new(ArcSwap::from_pointee(config)),
            registry,
            source,
            notify,
            receiver,
        })
    }

    /// Configuration currently in effect
    #[must_use]
    pub fn load(&self) -> Arc<ChaosConfig> {
        self.inner.load_full()
    }

    /// Registry receiving the settings
    pub const fn registry(&self) -> &Arc<AffectedServiceRegistry> {
        &self.registry
    }

    /// Re-read the configuration sources and apply the result
    ///
    /// Failures are logged and leave the current configuration in place.
    pub fn reload(&self) -> bool {
        let loaded = match &self.source {
            Some(path) => ChaosConfig::load_from(path),
            None => ChaosConfig::load(),
        };

        match loaded.and_then(|config| self.replace(config)) {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to reload chaos configuration: {}", e);
                false
            },
        }
    }

    /// Swap in `config` and apply its settings
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid; the current one
    /// stays in effect.
    pub fn replace(&self, config: ChaosConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.registry.apply_settings(config.settings()?);

        let old_config = self.inner.swap(Arc::new(config));
        info!(
            was_enabled = old_config.enabled,
            old_default_probability = old_config.default_probability,
            "Chaos configuration reloaded successfully"
        );

        self.notify.send_modify(|version| *version += 1);
        Ok(())
    }

    /// Version counter, starting at 0 and bumped by every successful replace
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.receiver.clone()
    }
}

/// Reload `config` from its source on every SIGHUP
///
/// Must be called inside a tokio runtime. The returned value shares state
/// with the background task.
#[cfg(unix)]
pub fn spawn_config_reload_handler(config: ReloadableChaosConfig) -> ReloadableChaosConfig {
    use tokio::signal::unix::{SignalKind, signal};

    let hangups = match signal(SignalKind::hangup()) {
        Ok(hangups) => hangups,
        Err(e) => {
            error!("Cannot listen for SIGHUP, chaos settings stay fixed: {}", e);
            return config;
        },
    };

    let reloader = config.clone();
    tokio::spawn(async move {
        let mut hangups = hangups;
        while hangups.recv().await.is_some() {
            info!(source = ?reloader.source, "SIGHUP received, reloading chaos settings");
            if !reloader.reload() {
                warn!("Keeping previous chaos settings");
            }
        }
    });

    config
}

/// SIGHUP does not exist here; settings change only through `replace`
#[cfg(not(unix))]
pub fn spawn_config_reload_handler(config: ReloadableChaosConfig) -> ReloadableChaosConfig {
    warn!("Chaos settings reload on SIGHUP is unavailable on this platform");
    config
}
