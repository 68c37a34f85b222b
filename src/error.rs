//! Error types for eph-anneal.

use crate::sinkhorn::Shape;
use thiserror::Error;

/// Result type alias for eph-anneal operations.
pub type Result<T> = std::result::Result<T, AnnealError>;

/// Errors raised by the solver, the schedulers and the simulation driver.
///
/// Every variant is fail-fast: nothing in this crate retries or silently
/// corrects the offending input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnnealError {
    /// Temperature passed to the solver was not a finite positive number.
    #[error("Invalid temperature: epsilon must be finite and > 0, got {epsilon}")]
    InvalidTemperature {
        /// The rejected temperature
        epsilon: f64,
    },

    /// Cost matrix or plan is not a well-formed batch of square matrices.
    #[error("Invalid shape: {reason}")]
    InvalidShape {
        /// Description of the malformed dimension
        reason: String,
    },

    /// Observed plan does not match the shape of the stored previous plan.
    #[error("Invalid scheduler state: previous plan has shape {expected}, observed plan has shape {got}")]
    InvalidState {
        /// Shape of the stored previous plan
        expected: Shape,
        /// Shape of the plan passed to `observe`
        got: Shape,
    },

    /// Solver output contains NaN or infinite entries.
    #[error("Numeric degeneracy: {non_finite} non-finite entries in transport plan")]
    NumericDegeneracy {
        /// Number of non-finite entries found
        non_finite: usize,
    },

    /// Configuration or argument value out of range.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// Reason why it's invalid
        reason: String,
    },
}

impl AnnealError {
    /// Create an invalid temperature error
    pub fn invalid_temperature(epsilon: f64) -> Self {
        Self::InvalidTemperature { epsilon }
    }

    /// Create an invalid shape error
    pub fn invalid_shape(reason: impl Into<String>) -> Self {
        Self::InvalidShape {
            reason: reason.into(),
        }
    }

    /// Create a scheduler state error
    pub fn invalid_state(expected: Shape, got: Shape) -> Self {
        Self::InvalidState { expected, got }
    }

    /// Create a numeric degeneracy error
    pub fn numeric_degeneracy(non_finite: usize) -> Self {
        Self::NumericDegeneracy { non_finite }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
