//! Drift-braked exponential cooling.

use super::config::SchedulerConfig;
use super::types::{DriftReduction, StepRecord, TemperatureSchedule};
use crate::error::{AnnealError, Result};
use crate::sinkhorn::TransportPlan;

/// Adaptive temperature scheduler enforcing `||P_t - P_{t-1}||_F <= k_safe * epsilon_t`.
///
/// The first observed plan only seeds the drift reference. Every later
/// observation measures drift against the previous plan and either cools
/// (`epsilon = max(min_epsilon, epsilon * decay_rate)`) or brakes (holds
/// `epsilon`) when the drift exceeds `k_safe * epsilon`.
///
/// Each instance owns its configuration, previous plan and history, so
/// independent simulations never interfere.
///
/// # Examples
///
/// ```
/// use eph_anneal::schedule::{AdaptiveScheduler, SchedulerConfig};
/// use eph_anneal::sinkhorn::{solve, CostMatrix};
///
/// let mut scheduler = AdaptiveScheduler::new(SchedulerConfig::default()).unwrap();
/// let cost = CostMatrix::filled(1, 4, 0.0).unwrap();
///
/// for _ in 0..3 {
///     let plan = solve(&cost, scheduler.epsilon(), 20).unwrap();
///     scheduler.observe(&plan).unwrap();
/// }
/// assert_eq!(scheduler.history().len(), 2);
/// assert!(scheduler.epsilon() < 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct AdaptiveScheduler {
    config: SchedulerConfig,
    epsilon: f64,
    previous: Option<TransportPlan>,
    history: Vec<StepRecord>,
}

impl AdaptiveScheduler {
    /// Creates a scheduler at `init_epsilon` with no previous plan.
    ///
    /// # Errors
    /// [`AnnealError::InvalidParameter`] if the configuration is invalid.
    pub fn new(config: SchedulerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            epsilon: config.init_epsilon,
            previous: None,
            history: Vec::new(),
        })
    }

    /// Current temperature.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Configuration this scheduler was built with.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// One record per steady-state step, oldest first.
    pub fn history(&self) -> &[StepRecord] {
        &self.history
    }

    /// The most recently observed plan, if any.
    #[cfg(test)]
    pub(crate) fn previous_plan(&self) -> Option<&TransportPlan> {
        self.previous.as_ref()
    }

    /// Number of steps where cooling was held.
    pub fn braking_steps(&self) -> usize {
        self.history.iter().filter(|r| r.braking).count()
    }

    /// Whether the temperature has reached `min_epsilon`.
    pub fn is_at_floor(&self) -> bool {
        self.epsilon <= self.config.min_epsilon
    }

    /// Records `plan` and returns the temperature for the next step.
    ///
    /// The plan is copied; later changes to the caller's plan do not
    /// affect the scheduler. On error the scheduler is left untouched.
    ///
    /// # Errors
    /// - [`AnnealError::InvalidState`] if `plan` differs in shape from the
    ///   previously observed plan.
    /// - [`AnnealError::NumericDegeneracy`] if `plan` has non-finite entries.
    pub fn observe(&mut self, plan: &TransportPlan) -> Result<f64> {
        let non_finite = plan.count_non_finite();
        if non_finite > 0 {
            return Err(AnnealError::numeric_degeneracy(non_finite));
        }

        let Some(previous) = self.previous.as_mut() else {
            log::debug!(
                "first observation: epsilon={:.6} shape={}",
                self.epsilon,
                plan.shape()
            );
            self.previous = Some(plan.clone());
            return Ok(self.epsilon);
        };

        if previous.shape() != plan.shape() {
            return Err(AnnealError::invalid_state(previous.shape(), plan.shape()));
        }

        let drift = match self.config.drift_reduction {
            DriftReduction::Pooled => previous.frobenius_distance(plan)?,
            DriftReduction::PerElementMean => {
                let per_element = previous.element_distances(plan)?;
                per_element.iter().sum::<f64>() / per_element.len() as f64
            }
        };
        let threshold = self.config.threshold(self.epsilon);
        let braking = drift > threshold;

        if braking {
            log::debug!(
                "braking: drift={drift:.6} > threshold={threshold:.6}, holding epsilon={:.6}",
                self.epsilon
            );
        } else {
            self.epsilon = self.config.cool(self.epsilon);
            log::debug!(
                "cooling: drift={drift:.6} <= threshold={threshold:.6}, epsilon -> {:.6}",
                self.epsilon
            );
        }

        previous.clone_from(plan);
        self.history.push(StepRecord {
            epsilon: self.epsilon,
            drift,
            threshold,
            braking,
        });

        Ok(self.epsilon)
    }
}

impl TemperatureSchedule for AdaptiveScheduler {
    fn epsilon(&self) -> f64 {
        self.epsilon
    }

    fn observe(&mut self, plan: &TransportPlan) -> Result<f64> {
        AdaptiveScheduler::observe(self, plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinkhorn::{solve, CostMatrix, Shape};
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn plan_of(values: &[f64]) -> TransportPlan {
        // one value -> 1x1x1, four values -> 1x2x2
        match values.len() {
            1 => TransportPlan::new(1, 1, values.to_vec()).unwrap(),
            4 => TransportPlan::new(1, 2, values.to_vec()).unwrap(),
            len => panic!("unsupported plan length {len}"),
        }
    }

    fn scheduler(init: f64, min: f64, decay: f64, k_safe: f64) -> AdaptiveScheduler {
        AdaptiveScheduler::new(SchedulerConfig::new(init, min, decay, k_safe)).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let err = AdaptiveScheduler::new(SchedulerConfig::default().with_decay_rate(1.0))
            .unwrap_err();
        assert!(matches!(err, AnnealError::InvalidParameter { .. }));
    }

    #[test]
    fn test_first_observation_returns_init() {
        let mut s = scheduler(1.0, 0.01, 0.95, 0.5);
        let eps = s.observe(&plan_of(&[0.3, 0.7, 0.7, 0.3])).unwrap();
        assert_eq!(eps, 1.0);
        assert!(s.history().is_empty());
        assert!(s.previous_plan().is_some());
    }

    #[test]
    fn test_braking_when_drift_exceeds_threshold() {
        let mut s = scheduler(1.0, 0.01, 0.95, 0.5);
        s.observe(&plan_of(&[0.0, 0.0, 0.0, 0.0])).unwrap();
        let eps = s.observe(&plan_of(&[0.6, 0.0, 0.0, 0.0])).unwrap();

        assert_eq!(eps, 1.0);
        let record = s.history()[0];
        assert!(record.braking);
        assert!((record.drift - 0.6).abs() < 1e-12);
        assert!((record.threshold - 0.5).abs() < 1e-12);
        assert_eq!(s.braking_steps(), 1);
    }

    #[test]
    fn test_cooling_when_drift_within_threshold() {
        let mut s = scheduler(1.0, 0.01, 0.95, 0.5);
        s.observe(&plan_of(&[0.0, 0.0, 0.0, 0.0])).unwrap();
        let eps = s.observe(&plan_of(&[0.3, 0.0, 0.2, 0.0])).unwrap();

        assert_eq!(eps, 1.0 * 0.95);
        let record = s.history()[0];
        assert!(!record.braking);
        assert!((record.drift - 0.13f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_drift_equal_to_threshold_cools() {
        let mut s = scheduler(1.0, 0.01, 0.5, 0.5);
        s.observe(&plan_of(&[0.0])).unwrap();
        assert_eq!(s.observe(&plan_of(&[0.5])).unwrap(), 0.5);
    }

    #[test]
    fn test_floor_clamps_exactly() {
        let mut s = scheduler(1.0, 0.3, 0.5, 10.0);
        let plan = plan_of(&[0.25]);
        s.observe(&plan).unwrap();
        assert_eq!(s.observe(&plan).unwrap(), 0.5);
        assert_eq!(s.observe(&plan).unwrap(), 0.3);
        for _ in 0..100 {
            assert_eq!(s.observe(&plan).unwrap(), 0.3);
        }
        assert!(s.is_at_floor());
    }

    #[test]
    fn test_braking_still_reported_at_floor() {
        let mut s = scheduler(1.0, 0.5, 0.5, 0.5);
        s.observe(&plan_of(&[0.0])).unwrap();
        s.observe(&plan_of(&[0.0])).unwrap();
        assert!(s.is_at_floor());

        s.observe(&plan_of(&[1.0])).unwrap();
        let last = s.history().last().unwrap();
        assert!(last.braking);
        assert_eq!(last.epsilon, 0.5);
    }

    #[test]
    fn test_shape_mismatch_leaves_state_untouched() {
        let mut s = scheduler(1.0, 0.01, 0.95, 0.5);
        let first = plan_of(&[0.1, 0.2, 0.3, 0.4]);
        s.observe(&first).unwrap();
        s.observe(&first).unwrap();
        let eps = s.epsilon();

        let err = s.observe(&plan_of(&[0.1])).unwrap_err();
        assert_eq!(
            err,
            AnnealError::invalid_state(Shape::new(1, 2), Shape::new(1, 1))
        );
        assert_eq!(s.epsilon(), eps);
        assert_eq!(s.history().len(), 1);
        assert_eq!(s.previous_plan(), Some(&first));
    }

    #[test]
    fn test_non_finite_plan_rejected() {
        let mut s = scheduler(1.0, 0.01, 0.95, 0.5);
        let err = s.observe(&plan_of(&[f64::NAN])).unwrap_err();
        assert!(matches!(err, AnnealError::NumericDegeneracy { non_finite: 1 }));
        assert!(s.previous_plan().is_none());
    }

    #[test]
    fn test_stores_plan_by_value() {
        let mut s = scheduler(1.0, 0.01, 0.95, 0.5);
        let mut plan = plan_of(&[0.0, 0.0, 0.0, 0.0]);
        s.observe(&plan).unwrap();
        plan.as_mut_slice()[0] = 99.0;
        assert_eq!(s.previous_plan().unwrap().as_slice()[0], 0.0);
    }

    #[test]
    fn test_per_element_mean_drift() {
        let config = SchedulerConfig::new(1.0, 0.01, 0.95, 0.5)
            .with_drift_reduction(DriftReduction::PerElementMean);
        let mut s = AdaptiveScheduler::new(config).unwrap();
        let zero = TransportPlan::filled(2, 1, 0.0).unwrap();
        let moved = TransportPlan::new(2, 1, vec![0.6, 0.0]).unwrap();
        s.observe(&zero).unwrap();
        s.observe(&moved).unwrap();

        // pooled drift would be 0.6 and brake; the mean over elements is 0.3
        let record = s.history()[0];
        assert!((record.drift - 0.3).abs() < 1e-12);
        assert!(!record.braking);
    }

    #[test]
    fn test_independent_instances() {
        let mut a = scheduler(1.0, 0.01, 0.9, 0.5);
        let mut b = scheduler(1.0, 0.01, 0.9, 0.5);
        let plan = plan_of(&[0.5]);
        a.observe(&plan).unwrap();
        a.observe(&plan).unwrap();
        assert_eq!(a.epsilon(), 0.9);
        assert_eq!(b.epsilon(), 1.0);
        assert_eq!(b.observe(&plan).unwrap(), 1.0);
    }

    #[test]
    fn test_static_cost_cools_on_schedule() {
        let mut rng = StdRng::seed_from_u64(42);
        let data = (0..100).map(|_| rng.random_range(-1.0..1.0)).collect();
        let cost = CostMatrix::new(1, 10, data).unwrap();
        let mut s = scheduler(1.0, 0.01, 0.95, 0.5);

        let mut trajectory = Vec::new();
        for _ in 0..5 {
            let plan = solve(&cost, s.epsilon(), 20).unwrap();
            trajectory.push(s.observe(&plan).unwrap());
        }

        let expected = [1.0, 0.95, 0.9025, 0.857375, 0.81450625];
        for (got, want) in trajectory.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12, "got {got}, want {want}");
        }
        assert_eq!(s.braking_steps(), 0);
        assert_eq!(s.history()[0].drift, 0.0);
    }

    proptest! {
        #[test]
        fn prop_epsilon_non_increasing_and_bounded(
            values in prop::collection::vec(0.0f64..2.0, 1..60),
            k_safe in 0.01f64..2.0,
            decay in 0.5f64..0.99,
        ) {
            let mut s = scheduler(1.0, 0.05, decay, k_safe);
            let mut prev = s.epsilon();
            for v in values {
                let eps = s.observe(&plan_of(&[v])).unwrap();
                prop_assert!(eps <= prev);
                prop_assert!(eps >= 0.05);
                prev = eps;
            }
        }

        #[test]
        fn prop_first_observation_is_identity(v in -10.0f64..10.0, init in 0.1f64..5.0) {
            let mut s = scheduler(init, 0.01, 0.9, 0.5);
            prop_assert_eq!(s.observe(&plan_of(&[v])).unwrap(), init);
        }
    }
}
