//! Blind exponential cooling.

use super::config::SchedulerConfig;
use super::types::TemperatureSchedule;
use crate::error::Result;
use crate::sinkhorn::TransportPlan;

/// Standard annealing: cools by `decay_rate` on every observation,
/// regardless of how far the plan moved.
///
/// Used as the reference arm when comparing against
/// [`AdaptiveScheduler`](super::AdaptiveScheduler). `k_safe` and
/// `drift_reduction` in the configuration are ignored.
#[derive(Debug, Clone)]
pub struct FixedSchedule {
    config: SchedulerConfig,
    epsilon: f64,
    steps: usize,
}

impl FixedSchedule {
    /// Starts at `config.init_epsilon`.
    ///
    /// # Errors
    /// [`AnnealError::InvalidParameter`](crate::AnnealError::InvalidParameter)
    /// if the configuration does not validate.
    pub fn new(config: SchedulerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            epsilon: config.init_epsilon,
            steps: 0,
        })
    }

    /// Current temperature.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Number of cooling steps applied so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Closed form temperature after `step` cooling steps.
    pub fn epsilon_at(&self, step: usize) -> f64 {
        let exponent = i32::try_from(step).unwrap_or(i32::MAX);
        (self.config.init_epsilon * self.config.decay_rate.powi(exponent))
            .max(self.config.min_epsilon)
    }

    /// Applies one cooling step and returns the new temperature.
    pub fn advance(&mut self) -> f64 {
        self.epsilon = self.config.cool(self.epsilon);
        self.steps += 1;
        self.epsilon
    }
}

impl TemperatureSchedule for FixedSchedule {
    fn epsilon(&self) -> f64 {
        self.epsilon
    }

    fn observe(&mut self, _plan: &TransportPlan) -> Result<f64> {
        Ok(self.advance())
    }
}
