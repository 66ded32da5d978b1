//! Global switches applied to every interceptor

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;

use super::trigger::DEFAULT_TRIGGER_PROBABILITY;

/// Settings shared by the registry and all interceptors it hands out
pub type SharedSettings = Arc<ArcSwap<ChaosSettings>>;

/// Engine-wide chaos settings
#[derive(Debug, Clone, PartialEq)]
pub struct ChaosSettings {
    /// When `false`, every proxied call passes straight through
    pub enabled: bool,
    /// Probability used by `at_random()` without an explicit value
    pub default_probability: f64,
    /// Upper bound on any injected delay
    pub max_delay: Option<Duration>,
}

impl Default for ChaosSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            default_probability: DEFAULT_TRIGGER_PROBABILITY,
            max_delay: None,
        }
    }
}

impl ChaosSettings {
    /// Settings with interception switched off
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Wrap into a shareable, atomically swappable handle
    pub fn shared(self) -> SharedSettings {
        Arc::new(ArcSwap::from_pointee(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_chaos() {
        let settings = ChaosSettings::default();
        assert!(settings.enabled);
        assert!((settings.default_probability - 1.0).abs() < f64::EPSILON);
        assert!(settings.max_delay.is_none());
    }

    #[test]
    fn shared_settings_can_be_swapped() {
        let shared = ChaosSettings::default().shared();
        shared.store(Arc::new(ChaosSettings::disabled()));
        assert!(!shared.load().enabled);
    }
}
