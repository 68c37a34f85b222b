//! Entropic optimal transport with adaptive temperature annealing.
//!
//! Provides the two pieces needed to anneal a Sinkhorn layer without
//! collapsing its transport plans too early:
//!
//! - **Sinkhorn Solver** ([`sinkhorn`]): log-domain Sinkhorn normalization
//!   turning a batch of square cost matrices and a temperature into
//!   approximately doubly-stochastic transport plans.
//! - **Adaptive Scheduler** ([`schedule`]): observes successive plans and
//!   cools the temperature on an exponential schedule only while the plan
//!   drift stays within `k_safe * epsilon`; otherwise it holds the
//!   temperature ("braking").
//! - **Simulation** ([`simulation`]): seeded synthetic cost streams and
//!   side-by-side runs of blind vs adaptive cooling.
//!
//! # Control Flow
//!
//! ```
//! use eph_anneal::schedule::{AdaptiveScheduler, SchedulerConfig};
//! use eph_anneal::sinkhorn::{CostMatrix, SinkhornLayer};
//!
//! let layer = SinkhornLayer::default();
//! let mut scheduler = AdaptiveScheduler::new(SchedulerConfig::default())?;
//! let cost = CostMatrix::from_matrix(vec![vec![0.0, 1.0], vec![1.0, 0.0]])?;
//!
//! for _ in 0..5 {
//!     let plan = layer.forward(&cost, scheduler.epsilon())?;
//!     scheduler.observe(&plan)?;
//! }
//! assert_eq!(scheduler.history().len(), 4);
//! # Ok::<(), eph_anneal::AnnealError>(())
//! ```
//!
//! There is no global state: every scheduler owns its temperature,
//! previous plan and history, and the solver is a pure function.

pub mod error;
pub mod schedule;
pub mod simulation;
pub mod sinkhorn;

pub use error::{AnnealError, Result};
