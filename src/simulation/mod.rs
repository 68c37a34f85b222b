//! Standard-vs-adaptive annealing simulations.
//!
//! Drives a Sinkhorn layer with two schedules over the same seeded stream
//! of synthetic cost matrices and records, per epoch, the temperature used
//! and the entropy of the resulting plan. A blindly cooled schedule tends
//! to collapse the plan's entropy while the cost signal is still noisy;
//! the adaptive schedule brakes until the plans stop drifting.
//!
//! # Key Types
//!
//! - [`SimulationConfig`]: problem size, epoch count, seed, [`CostNoise`]
//! - [`SimulationRunner`]: runs comparisons, single schedules, or many
//!   independent runs at once
//! - [`SimulationResult`]: per-arm [`ArmTrace`]s plus the adaptive history

mod config;
mod runner;

pub use config::{CostNoise, SimulationConfig};
pub use runner::{ArmTrace, SimulationResult, SimulationRunner};
