//! Log-domain Sinkhorn normalization.

use super::types::{CostMatrix, SquareBatch, TransportPlan};
use crate::error::{AnnealError, Result};

/// Default number of row/column normalization sweeps.
pub const DEFAULT_ITERATIONS: usize = 20;

/// Runs `iterations` alternating row/column log-normalizations on a
/// log-domain batch and returns `exp` of the result.
///
/// Each sweep subtracts the log-sum-exp of every row (so rows of the
/// exponentiated matrix sum to 1), then of every column. After a finite
/// number of sweeps the plan is only approximately doubly-stochastic:
/// columns sum to 1 exactly, rows approach 1 as `iterations` grows.
///
/// # Errors
/// - [`AnnealError::InvalidParameter`] if `iterations` is zero.
/// - [`AnnealError::NumericDegeneracy`] if the plan contains NaN or
///   infinite entries, e.g. a row whose entries are all `-inf`.
pub fn log_sinkhorn(mut log_alpha: SquareBatch, iterations: usize) -> Result<TransportPlan> {
    if iterations == 0 {
        return Err(AnnealError::invalid_parameter(
            "iterations",
            "must be at least 1",
        ));
    }

    let n = log_alpha.n();

    for matrix in log_alpha.matrices_mut() {
        for _ in 0..iterations {
            for i in 0..n {
                normalize_lane(matrix, i * n, 1, n);
            }
            for j in 0..n {
                normalize_lane(matrix, j, n, n);
            }
        }
        for x in matrix.iter_mut() {
            *x = x.exp();
        }
    }

    let non_finite = log_alpha.count_non_finite();
    if non_finite > 0 {
        log::warn!(
            "sinkhorn produced {non_finite} non-finite entries for shape {}",
            log_alpha.shape()
        );
        return Err(AnnealError::numeric_degeneracy(non_finite));
    }

    Ok(log_alpha)
}

/// Computes the entropic transport plan for `cost` at temperature `epsilon`.
///
/// Equivalent to `log_sinkhorn(-cost / epsilon, iterations)`. Pure and
/// deterministic: identical inputs give bit-identical plans.
///
/// # Errors
/// - [`AnnealError::InvalidTemperature`] if `epsilon` is not finite and
///   strictly positive.
/// - [`AnnealError::InvalidParameter`] if `iterations` is zero.
/// - [`AnnealError::NumericDegeneracy`] if the plan is not finite.
///
/// # Examples
///
/// ```
/// use eph_anneal::sinkhorn::{solve, CostMatrix};
///
/// let cost = CostMatrix::from_matrix(vec![
///     vec![0.0, 1.0],
///     vec![1.0, 0.0],
/// ]).unwrap();
/// let plan = solve(&cost, 0.1, 20).unwrap();
/// assert!(plan.get(0, 0, 0) > plan.get(0, 0, 1));
/// ```
pub fn solve(cost: &CostMatrix, epsilon: f64, iterations: usize) -> Result<TransportPlan> {
    if !(epsilon.is_finite() && epsilon > 0.0) {
        return Err(AnnealError::invalid_temperature(epsilon));
    }
    log_sinkhorn(cost.map(|c| -c / epsilon), iterations)
}

/// Reusable Sinkhorn operator with a fixed iteration count.
///
/// Holds no mutable state, so one layer can be shared by any number of
/// concurrent simulations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SinkhornLayer {
    /// Number of row/column normalization sweeps.
    pub iterations: usize,
}

impl Default for SinkhornLayer {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl SinkhornLayer {
    /// Layer running `iterations` sweeps per solve.
    pub fn new(iterations: usize) -> Self {
        Self { iterations }
    }

    /// Transport plan for `cost` at temperature `epsilon`. See [`solve`].
    pub fn forward(&self, cost: &CostMatrix, epsilon: f64) -> Result<TransportPlan> {
        solve(cost, epsilon, self.iterations)
    }
}

/// Shifts the `len` entries `matrix[start]`, `matrix[start + stride]`, ...
/// so that their exponentials sum to 1.
///
/// The shift is computed relative to the lane's peak. A lane whose peak is
/// infinite is shifted by the peak itself, so an all `-inf` lane becomes
/// NaN and surfaces as degeneracy after exponentiation.
fn normalize_lane(matrix: &mut [f64], start: usize, stride: usize, len: usize) {
    let lane = (0..len).map(|k| start + k * stride);
    let peak = lane.clone().map(|idx| matrix[idx]).fold(f64::NEG_INFINITY, f64::max);
    let shift = if peak.is_infinite() {
        peak
    } else {
        let mass: f64 = lane.clone().map(|idx| (matrix[idx] - peak).exp()).sum();
        peak + mass.ln()
    };
    for idx in lane {
        matrix[idx] -= shift;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_cost(batch: usize, n: usize, seed: u64) -> CostMatrix {
        let mut rng = StdRng::seed_from_u64(seed);
        let data = (0..batch * n * n)
            .map(|_| rng.random_range(-2.0..2.0))
            .collect();
        CostMatrix::new(batch, n, data).unwrap()
    }

    #[test]
    fn test_normalize_lane_large_magnitudes() {
        // Row 0 at +1000, row 1 at -1000; exp of either would overflow or vanish.
        let mut matrix = vec![1000.0, 1000.0, -1000.0, -1000.0];
        normalize_lane(&mut matrix, 0, 1, 2);
        normalize_lane(&mut matrix, 2, 1, 2);
        for &x in &matrix {
            assert!((x + 2f64.ln()).abs() < 1e-9, "got {x}");
        }
    }

    #[test]
    fn test_normalize_lane_strided_column() {
        let mut matrix = vec![0.0, 5.0, 0.0, 7.0];
        normalize_lane(&mut matrix, 1, 2, 2);
        assert_eq!(matrix[0], 0.0);
        assert_eq!(matrix[2], 0.0);
        let mass = matrix[1].exp() + matrix[3].exp();
        assert!((mass - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_lane_all_neg_infinity() {
        let mut matrix = vec![f64::NEG_INFINITY, f64::NEG_INFINITY, 0.0, 0.0];
        normalize_lane(&mut matrix, 0, 1, 2);
        assert!(matrix[0].is_nan() && matrix[1].is_nan());
        assert_eq!(&matrix[2..], &[0.0, 0.0]);
    }

    #[test]
    fn test_uniform_cost_gives_uniform_plan() {
        let n = 5;
        let cost = CostMatrix::filled(2, n, 3.0).unwrap();
        let plan = solve(&cost, 0.7, 1).unwrap();
        for &p in plan.as_slice() {
            assert!((p - 1.0 / n as f64).abs() < 1e-12);
        }
    }

    #[test]
    fn test_columns_exact_rows_approximate() {
        let cost = random_cost(1, 8, 7);
        let plan = solve(&cost, 0.5, 3).unwrap();
        for s in plan.col_sums(0) {
            assert!((s - 1.0).abs() < 1e-12, "column sum {s}");
        }
        // Rows are off individually but still carry the total mass N.
        let rows = plan.row_sums(0);
        assert!(rows.iter().all(|&s| s > 0.0));
        assert!((rows.iter().sum::<f64>() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_marginal_error_shrinks_with_iterations() {
        let cost = random_cost(2, 10, 42);
        let mut prev = f64::INFINITY;
        for k in [1, 2, 5, 10, 20, 100] {
            let err = solve(&cost, 1.0, k).unwrap().max_marginal_error();
            assert!(err <= prev + 1e-12, "k={k}: {err} > {prev}");
            prev = err;
        }
        assert!(prev < 1e-6, "expected convergence, got {prev}");
    }

    #[test]
    fn test_low_temperature_prefers_cheap_entries() {
        let cost = CostMatrix::from_matrix(vec![
            vec![0.0, 1.0, 1.0],
            vec![1.0, 0.0, 1.0],
            vec![1.0, 1.0, 0.0],
        ])
        .unwrap();
        let plan = solve(&cost, 0.01, 20).unwrap();
        for i in 0..3 {
            assert!(plan.get(0, i, i) > 0.99);
        }
        assert!(plan.entropy() < 0.05);
    }

    #[test]
    fn test_tiny_temperature_stays_finite() {
        let cost = random_cost(1, 10, 3);
        let plan = solve(&cost, 1e-4, 20).unwrap();
        assert_eq!(plan.count_non_finite(), 0);
    }

    #[test]
    fn test_rejects_bad_temperature() {
        let cost = random_cost(1, 3, 1);
        for eps in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = solve(&cost, eps, 20).unwrap_err();
            assert!(matches!(err, AnnealError::InvalidTemperature { .. }));
        }
    }

    #[test]
    fn test_rejects_zero_iterations() {
        let cost = random_cost(1, 3, 1);
        let err = solve(&cost, 1.0, 0).unwrap_err();
        assert!(matches!(err, AnnealError::InvalidParameter { .. }));
    }

    #[test]
    fn test_infinite_cost_row_is_degenerate() {
        let mut cost = random_cost(1, 4, 9);
        for j in 0..4 {
            cost.as_mut_slice()[j] = f64::INFINITY;
        }
        let err = solve(&cost, 1.0, 20).unwrap_err();
        assert!(matches!(err, AnnealError::NumericDegeneracy { .. }));
    }

    #[test]
    fn test_deterministic() {
        let cost = random_cost(3, 6, 11);
        let a = solve(&cost, 0.3, 20).unwrap();
        let b = solve(&cost, 0.3, 20).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_layer_matches_solve() {
        let cost = random_cost(1, 4, 5);
        let layer = SinkhornLayer::default();
        assert_eq!(layer.iterations, DEFAULT_ITERATIONS);
        assert_eq!(layer.forward(&cost, 0.2).unwrap(), solve(&cost, 0.2, 20).unwrap());
    }

    proptest! {
        #[test]
        fn prop_plan_finite_non_negative(
            n in 1usize..8,
            batch in 1usize..4,
            seed in any::<u64>(),
            epsilon in 0.01f64..10.0,
            iterations in 1usize..30,
        ) {
            let cost = random_cost(batch, n, seed);
            let plan = solve(&cost, epsilon, iterations).unwrap();
            prop_assert_eq!(plan.shape(), cost.shape());
            for &p in plan.as_slice() {
                prop_assert!(p.is_finite() && p >= 0.0);
            }
        }
    }
}
