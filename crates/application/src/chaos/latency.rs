//! Latency distributions for delay actions

use std::fmt;
use std::time::Duration;

use domain::AuthoringError;
use rand::Rng;
use serde::{Deserialize, Serialize};

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// How long a delay action waits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LatencyDistribution {
    /// Always the same duration
    Constant(Duration),
    /// Uniformly distributed between `min` and `max`, inclusive
    Uniform { min: Duration, max: Duration },
    /// Bell curve around `mean`, never negative
    Normal { mean: Duration, std_dev: Duration },
    /// Exponential with mean halfway between `min` and `max`, clamped to both
    Exponential { min: Duration, max: Duration },
}

impl LatencyDistribution {
    /// Create a constant latency (no variation)
    pub const fn constant(duration: Duration) -> Self {
        Self::Constant(duration)
    }

    /// Create a uniformly distributed latency range
    pub const fn uniform(min: Duration, max: Duration) -> Self {
        Self::Uniform { min, max }
    }

    /// Create a normally distributed latency (bell curve)
    pub const fn normal(mean: Duration, std_dev: Duration) -> Self {
        Self::Normal { mean, std_dev }
    }

    /// Create an exponentially distributed latency clamped to a range
    pub const fn exponential(min: Duration, max: Duration) -> Self {
        Self::Exponential { min, max }
    }

    /// Check that the parameters describe a usable distribution
    ///
    /// # Errors
    ///
    /// Returns [`AuthoringError::InvalidLatency`] for inverted ranges or an
    /// exponential range with a zero upper bound.
    pub fn validate(&self) -> Result<(), AuthoringError> {
        match *self {
            Self::Constant(_) | Self::Normal { .. } => Ok(()),
            Self::Uniform { min, max } if min > max => Err(AuthoringError::InvalidLatency(
                format!("minimum {min:?} exceeds maximum {max:?}"),
            )),
            Self::Exponential { min, max } if min > max => Err(AuthoringError::InvalidLatency(
                format!("minimum {min:?} exceeds maximum {max:?}"),
            )),
            Self::Exponential { max, .. } if max.is_zero() => Err(
                AuthoringError::InvalidLatency("exponential latency needs a non-zero maximum".into()),
            ),
            Self::Uniform { .. } | Self::Exponential { .. } => Ok(()),
        }
    }

    /// Sample a latency value from this distribution
    ///
    /// Samples saturate at [`Duration::MAX`] instead of overflowing.
    #[allow(clippy::cast_possible_truncation)]
    pub fn sample(&self) -> Duration {
        let mut rng = rand::rng();

        match *self {
            Self::Constant(duration) => duration,
            Self::Uniform { min, max } => {
                let range = max.as_nanos().saturating_sub(min.as_nanos());
                if range == 0 {
                    return min;
                }
                let random_nanos = rng.random_range(0..=range);
                let offset = Duration::new(
                    u64::try_from(random_nanos / NANOS_PER_SEC).unwrap_or(u64::MAX),
                    (random_nanos % NANOS_PER_SEC) as u32,
                );
                min.saturating_add(offset).min(max)
            },
            Self::Normal { mean, std_dev } => {
                // Box-Muller transform; u1 lies in (0, 1] so ln is finite
                let u1: f64 = 1.0 - rng.random::<f64>();
                let u2: f64 = rng.random();
                let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();

                let sample = std_dev.as_secs_f64().mul_add(z0, mean.as_secs_f64());
                Duration::try_from_secs_f64(sample.max(0.0)).unwrap_or(Duration::MAX)
            },
            Self::Exponential { min, max } => {
                let mean = f64::midpoint(min.as_secs_f64(), max.as_secs_f64());
                if mean <= 0.0 {
                    return min;
                }
                let u: f64 = 1.0 - rng.random::<f64>();
                let sample = (-u.ln() * mean).clamp(min.as_secs_f64(), max.as_secs_f64());
                Duration::try_from_secs_f64(sample)
                    .unwrap_or(max)
                    .clamp(min, max)
            },
        }
    }
}

impl Default for LatencyDistribution {
    fn default() -> Self {
        Self::uniform(Duration::from_millis(100), Duration::from_millis(500))
    }
}

impl fmt::Display for LatencyDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(duration) => write!(f, "{duration:?}"),
            Self::Uniform { min, max } => write!(f, "{min:?}..={max:?}"),
            Self::Normal { mean, std_dev } => write!(f, "{mean:?}±{std_dev:?}"),
            Self::Exponential { min, max } => write!(f, "exp({min:?}..={max:?})"),
        }
    }
}
