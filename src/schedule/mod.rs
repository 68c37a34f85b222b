//! Temperature schedules for Sinkhorn annealing.
//!
//! The [`AdaptiveScheduler`] watches consecutive transport plans and only
//! cools while the plan drift satisfies the linear stability law
//!
//! ```text
//! ||P_t - P_{t-1}||_F <= k_safe * epsilon_t
//! ```
//!
//! When the drift is larger it holds the temperature (a "thermodynamic
//! pause") so the plan cannot collapse to a low-entropy solution before
//! the cost signal has settled. [`FixedSchedule`] is the blind
//! exponential baseline.
//!
//! # Key Types
//!
//! - [`SchedulerConfig`]: init/min temperature, decay rate, safety slope
//! - [`AdaptiveScheduler`]: drift-braked cooling with per-step [`StepRecord`]s
//! - [`FixedSchedule`]: cools on every step
//! - [`TemperatureSchedule`]: common interface for simulation drivers

mod baseline;
mod config;
mod scheduler;
mod types;

pub use baseline::FixedSchedule;
pub use config::SchedulerConfig;
pub use scheduler::AdaptiveScheduler;
pub use types::{DriftReduction, StepRecord, TemperatureSchedule};
