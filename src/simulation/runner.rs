//! Side-by-side annealing runs.

use super::config::SimulationConfig;
use crate::error::Result;
use crate::schedule::{
    AdaptiveScheduler, FixedSchedule, SchedulerConfig, StepRecord, TemperatureSchedule,
};
use crate::sinkhorn::{CostMatrix, SinkhornLayer};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Per-epoch diagnostics for one schedule.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArmTrace {
    /// Temperature used for the solve at each epoch.
    pub epsilons: Vec<f64>,

    /// Mean row entropy of the plan produced at each epoch.
    pub entropies: Vec<f64>,

    /// Temperature returned by the last observation.
    pub final_epsilon: f64,
}

impl ArmTrace {
    /// Entropy of the last plan, or `None` for an empty trace.
    pub fn final_entropy(&self) -> Option<f64> {
        self.entropies.last().copied()
    }
}

/// Result of a standard-vs-adaptive comparison over one cost stream.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationResult {
    /// Blind exponential cooling.
    pub baseline: ArmTrace,

    /// Drift-braked cooling.
    pub adaptive: ArmTrace,

    /// Adaptive scheduler history, one record per epoch after the first.
    pub history: Vec<StepRecord>,
}

impl SimulationResult {
    /// Number of epochs where the adaptive schedule held its temperature.
    pub fn braking_steps(&self) -> usize {
        self.history.iter().filter(|r| r.braking).count()
    }
}

/// Drives Sinkhorn solves and temperature schedules over a cost stream.
///
/// # Usage
///
/// ```
/// use eph_anneal::schedule::SchedulerConfig;
/// use eph_anneal::simulation::{SimulationConfig, SimulationRunner};
///
/// let config = SimulationConfig::default().with_epochs(10);
/// let result = SimulationRunner::run(&config, &SchedulerConfig::default()).unwrap();
/// assert_eq!(result.adaptive.epsilons.len(), 10);
/// assert!(result.adaptive.final_epsilon >= result.baseline.final_epsilon);
/// ```
pub struct SimulationRunner;

impl SimulationRunner {
    /// Runs both schedules over the same seeded cost stream.
    ///
    /// Each arm owns its schedule; the Sinkhorn layer is shared read-only.
    pub fn run(config: &SimulationConfig, schedule: &SchedulerConfig) -> Result<SimulationResult> {
        let costs = config.cost_stream()?;
        let layer = SinkhornLayer::new(config.sinkhorn_iterations);

        log::info!(
            "simulating {} epochs, shape {}x{}x{}, seed {}",
            config.epochs,
            config.batch_size,
            config.n_points,
            config.n_points,
            config.seed
        );

        let mut fixed = FixedSchedule::new(*schedule)?;
        let baseline = Self::drive(&mut fixed, &costs, &layer)?;

        let mut adaptive_schedule = AdaptiveScheduler::new(*schedule)?;
        let adaptive = Self::drive(&mut adaptive_schedule, &costs, &layer)?;

        let result = SimulationResult {
            baseline,
            adaptive,
            history: adaptive_schedule.history().to_vec(),
        };

        log::info!(
            "done: baseline epsilon {:.4}, adaptive epsilon {:.4}{}, {} braking steps",
            result.baseline.final_epsilon,
            result.adaptive.final_epsilon,
            if adaptive_schedule.is_at_floor() { " (floor)" } else { "" },
            result.braking_steps()
        );

        Ok(result)
    }

    /// Runs one schedule over `costs`: read epsilon, solve, observe.
    ///
    /// Stops at the first error; the schedule keeps whatever state it had
    /// after the last successful step.
    pub fn drive<S: TemperatureSchedule>(
        schedule: &mut S,
        costs: &[CostMatrix],
        layer: &SinkhornLayer,
    ) -> Result<ArmTrace> {
        let mut epsilons = Vec::with_capacity(costs.len());
        let mut entropies = Vec::with_capacity(costs.len());

        for cost in costs {
            let epsilon = schedule.epsilon();
            let plan = layer.forward(cost, epsilon)?;
            epsilons.push(epsilon);
            entropies.push(plan.entropy());
            schedule.observe(&plan)?;
        }

        Ok(ArmTrace {
            epsilons,
            entropies,
            final_epsilon: schedule.epsilon(),
        })
    }

    /// Runs many independent comparisons, one scheduler pair per run.
    ///
    /// With the `parallel` feature the runs execute on the rayon pool.
    pub fn run_many(runs: &[(SimulationConfig, SchedulerConfig)]) -> Vec<Result<SimulationResult>> {
        #[cfg(feature = "parallel")]
        {
            runs.par_iter()
                .map(|(config, schedule)| Self::run(config, schedule))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            runs.iter()
                .map(|(config, schedule)| Self::run(config, schedule))
                .collect()
        }
    }
}
