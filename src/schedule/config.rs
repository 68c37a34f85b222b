//! Scheduler configuration.

use super::types::DriftReduction;
use crate::error::{AnnealError, Result};

/// Configuration shared by [`AdaptiveScheduler`](super::AdaptiveScheduler)
/// and [`FixedSchedule`](super::FixedSchedule).
///
/// Read-only once a scheduler is built; each scheduler owns its own copy.
///
/// # Stability Law
///
/// The adaptive scheduler only cools while `||P_t - P_{t-1}||_F <= k_safe * epsilon_t`.
/// Larger `k_safe` tolerates more drift per unit temperature and brakes
/// less often.
///
/// # Examples
///
/// ```
/// use eph_anneal::schedule::SchedulerConfig;
///
/// let config = SchedulerConfig::default()
///     .with_init_epsilon(2.0)
///     .with_min_epsilon(0.05)
///     .with_decay_rate(0.9)
///     .with_k_safe(1.0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SchedulerConfig {
    /// Starting temperature. Must be finite and positive.
    pub init_epsilon: f64,

    /// Temperature floor, in `(0, init_epsilon]`.
    pub min_epsilon: f64,

    /// Per-step multiplicative cooling factor in `(0, 1)`.
    /// Typical values: 0.9–0.99.
    pub decay_rate: f64,

    /// Safety slope: tolerated drift per unit temperature. Must be positive.
    pub k_safe: f64,

    /// How drift is reduced across batch elements.
    pub drift_reduction: DriftReduction,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            init_epsilon: 1.0,
            min_epsilon: 0.01,
            decay_rate: 0.95,
            k_safe: 0.5,
            drift_reduction: DriftReduction::default(),
        }
    }
}

impl SchedulerConfig {
    /// Configuration with the four core parameters and pooled drift.
    pub fn new(init_epsilon: f64, min_epsilon: f64, decay_rate: f64, k_safe: f64) -> Self {
        Self {
            init_epsilon,
            min_epsilon,
            decay_rate,
            k_safe,
            drift_reduction: DriftReduction::default(),
        }
    }

    /// Sets the starting temperature.
    pub fn with_init_epsilon(mut self, epsilon: f64) -> Self {
        self.init_epsilon = epsilon;
        self
    }

    /// Sets the temperature floor.
    pub fn with_min_epsilon(mut self, epsilon: f64) -> Self {
        self.min_epsilon = epsilon;
        self
    }

    /// Sets the per-step cooling factor.
    pub fn with_decay_rate(mut self, rate: f64) -> Self {
        self.decay_rate = rate;
        self
    }

    /// Sets the safety slope of the stability law.
    pub fn with_k_safe(mut self, k_safe: f64) -> Self {
        self.k_safe = k_safe;
        self
    }

    /// Sets how drift is reduced across batch elements.
    pub fn with_drift_reduction(mut self, reduction: DriftReduction) -> Self {
        self.drift_reduction = reduction;
        self
    }

    /// One cooling step: `max(min_epsilon, epsilon * decay_rate)`.
    pub fn cool(&self, epsilon: f64) -> f64 {
        (epsilon * self.decay_rate).max(self.min_epsilon)
    }

    /// Drift tolerated at temperature `epsilon`.
    pub fn threshold(&self, epsilon: f64) -> f64 {
        self.k_safe * epsilon
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(self.init_epsilon.is_finite() && self.init_epsilon > 0.0) {
            return Err(AnnealError::invalid_parameter(
                "init_epsilon",
                format!("must be finite and positive, got {}", self.init_epsilon),
            ));
        }
        if !(self.min_epsilon > 0.0) {
            return Err(AnnealError::invalid_parameter(
                "min_epsilon",
                format!("must be positive, got {}", self.min_epsilon),
            ));
        }
        if self.min_epsilon > self.init_epsilon {
            return Err(AnnealError::invalid_parameter(
                "min_epsilon",
                format!(
                    "must not exceed init_epsilon ({} > {})",
                    self.min_epsilon, self.init_epsilon
                ),
            ));
        }
        if !(self.decay_rate > 0.0 && self.decay_rate < 1.0) {
            return Err(AnnealError::invalid_parameter(
                "decay_rate",
                format!("must be in (0, 1), got {}", self.decay_rate),
            ));
        }
        if !(self.k_safe.is_finite() && self.k_safe > 0.0) {
            return Err(AnnealError::invalid_parameter(
                "k_safe",
                format!("must be finite and positive, got {}", self.k_safe),
            ));
        }
        Ok(())
    }
}
