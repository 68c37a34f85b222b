//! Scheduler records and the common schedule trait.

use crate::error::Result;
use crate::sinkhorn::TransportPlan;

/// How the step-to-step drift of a batched plan is reduced to one scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DriftReduction {
    /// One Frobenius norm over the flattened batch.
    ///
    /// With batch size > 1 this mixes drift of independent batch elements.
    #[default]
    Pooled,

    /// Frobenius norm per batch element, then the arithmetic mean.
    PerElementMean,
}

/// Diagnostics for one steady-state scheduler step.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepRecord {
    /// Temperature after this step.
    pub epsilon: f64,

    /// Frobenius distance between this plan and the previous one.
    pub drift: f64,

    /// `k_safe * epsilon` evaluated at the temperature in force before the step.
    pub threshold: f64,

    /// Whether cooling was held because `drift > threshold`.
    pub braking: bool,
}

/// A temperature trajectory driven by observed transport plans.
///
/// The caller reads [`epsilon`](Self::epsilon), solves with it, and hands
/// the plan back to [`observe`](Self::observe), which returns the
/// temperature for the next step.
pub trait TemperatureSchedule {
    /// Temperature to use for the next solve.
    fn epsilon(&self) -> f64;

    /// Feeds the plan solved at [`epsilon`](Self::epsilon) and returns the
    /// next temperature.
    fn observe(&mut self, plan: &TransportPlan) -> Result<f64>;
}
