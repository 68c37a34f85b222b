//! Log-domain Sinkhorn solver.
//!
//! Turns a batch of square cost matrices `C` and a temperature `epsilon`
//! into entropic transport plans `P = exp(L)`, where `L` starts at
//! `-C / epsilon` and is alternately row- and column-normalized with
//! log-sum-exp for a fixed number of sweeps.
//!
//! Working in log space keeps `exp(-C / epsilon)` from underflowing or
//! overflowing as `epsilon -> 0`.
//!
//! # Key Types
//!
//! - [`SquareBatch`]: `B x N x N` storage, aliased as [`CostMatrix`] and
//!   [`TransportPlan`]
//! - [`SinkhornLayer`]: reusable operator with a fixed iteration count
//!
//! # References
//!
//! - Sinkhorn & Knopp (1967), "Concerning nonnegative matrices and doubly stochastic matrices"
//! - Cuturi (2013), "Sinkhorn Distances: Lightspeed Computation of Optimal Transport"

mod solver;
mod types;

pub use solver::{log_sinkhorn, solve, SinkhornLayer, DEFAULT_ITERATIONS};
pub use types::{CostMatrix, Shape, SquareBatch, TransportPlan, ENTROPY_EPS};
