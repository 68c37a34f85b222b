//! Batched square matrices for cost inputs and transport plans.

use crate::error::{AnnealError, Result};
use std::fmt;

/// Offset applied inside the logarithm when measuring plan entropy.
pub const ENTROPY_EPS: f64 = 1e-8;

/// Dimensions of a batch of `batch` square `n x n` matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Shape {
    /// Number of independent matrices in the batch.
    pub batch: usize,
    /// Side length of every matrix.
    pub n: usize,
}

impl Shape {
    /// Shape of `batch` matrices of size `n x n`. Not validated; see
    /// [`SquareBatch::new`].
    pub fn new(batch: usize, n: usize) -> Self {
        Self { batch, n }
    }

    /// Number of entries in one matrix.
    pub fn matrix_len(&self) -> usize {
        self.n * self.n
    }

    /// Number of entries in the whole batch.
    pub fn len(&self) -> usize {
        self.batch * self.matrix_len()
    }

    /// Whether the batch holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.batch, self.n, self.n)
    }
}

/// A batch of `B` square `N x N` matrices stored contiguously,
/// batch-major then row-major: entry `(b, i, j)` lives at
/// `b * N * N + i * N + j`.
///
/// The same container carries both solver inputs ([`CostMatrix`]) and
/// solver outputs ([`TransportPlan`]). Values are owned; cloning a plan
/// yields an independent copy, so holders of a clone never observe
/// later mutation of the original.
///
/// With the `serde` feature, deserialization goes through
/// [`SquareBatch::new`], so malformed payloads fail with
/// [`AnnealError::InvalidShape`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawSquareBatch", into = "RawSquareBatch")
)]
pub struct SquareBatch {
    shape: Shape,
    data: Vec<f64>,
}

/// Unchecked wire form of [`SquareBatch`].
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct RawSquareBatch {
    shape: Shape,
    data: Vec<f64>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawSquareBatch> for SquareBatch {
    type Error = AnnealError;

    fn try_from(raw: RawSquareBatch) -> Result<Self> {
        Self::new(raw.shape.batch, raw.shape.n, raw.data)
    }
}

#[cfg(feature = "serde")]
impl From<SquareBatch> for RawSquareBatch {
    fn from(batch: SquareBatch) -> Self {
        Self {
            shape: batch.shape,
            data: batch.data,
        }
    }
}

/// Cost of matching source point `i` to target point `j` in batch element `b`.
pub type CostMatrix = SquareBatch;

/// Approximately doubly-stochastic matrices produced by the Sinkhorn solver.
pub type TransportPlan = SquareBatch;

impl SquareBatch {
    /// Wraps a flat buffer of `batch * n * n` values.
    ///
    /// # Errors
    /// [`AnnealError::InvalidShape`] if `batch` or `n` is zero or the buffer
    /// length does not equal `batch * n * n`.
    pub fn new(batch: usize, n: usize, data: Vec<f64>) -> Result<Self> {
        if batch == 0 {
            return Err(AnnealError::invalid_shape("batch dimension must be non-zero"));
        }
        if n == 0 {
            return Err(AnnealError::invalid_shape("matrix dimension must be non-zero"));
        }
        let shape = Shape::new(batch, n);
        if data.len() != shape.len() {
            return Err(AnnealError::invalid_shape(format!(
                "expected {} values for shape {shape}, got {}",
                shape.len(),
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    /// Builds a batch from nested `[batch][row][col]` vectors.
    ///
    /// # Errors
    /// [`AnnealError::InvalidShape`] if the batch is empty, any matrix is
    /// not square, or matrices differ in size.
    pub fn from_matrices(matrices: Vec<Vec<Vec<f64>>>) -> Result<Self> {
        let Some(first) = matrices.first() else {
            return Err(AnnealError::invalid_shape("batch dimension must be non-zero"));
        };
        let n = first.len();
        let mut data = Vec::with_capacity(matrices.len() * n * n);
        for (b, matrix) in matrices.iter().enumerate() {
            if matrix.len() != n {
                return Err(AnnealError::invalid_shape(format!(
                    "batch element {b} has {} rows, expected {n}",
                    matrix.len()
                )));
            }
            for (i, row) in matrix.iter().enumerate() {
                if row.len() != n {
                    return Err(AnnealError::invalid_shape(format!(
                        "batch element {b} row {i} has {} columns, expected {n} (matrix must be square)",
                        row.len()
                    )));
                }
                data.extend_from_slice(row);
            }
        }
        Self::new(matrices.len(), n, data)
    }

    /// Builds a batch of one from a nested `[row][col]` matrix.
    pub fn from_matrix(matrix: Vec<Vec<f64>>) -> Result<Self> {
        Self::from_matrices(vec![matrix])
    }

    /// A batch with every entry set to `value`.
    pub fn filled(batch: usize, n: usize, value: f64) -> Result<Self> {
        Self::new(batch, n, vec![value; batch * n * n])
    }

    /// Batch and matrix dimensions.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Number of matrices `B`.
    pub fn batch(&self) -> usize {
        self.shape.batch
    }

    /// Side length `N` of every matrix.
    pub fn n(&self) -> usize {
        self.shape.n
    }

    /// Entry `(b, i, j)`.
    ///
    /// # Panics
    /// Panics if any index is out of range.
    pub fn get(&self, b: usize, i: usize, j: usize) -> f64 {
        let n = self.shape.n;
        assert!(b < self.shape.batch && i < n && j < n, "index out of range");
        self.data[b * n * n + i * n + j]
    }

    /// Flat view of all entries.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable flat view of all entries.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Row-major entries of batch element `b`.
    ///
    /// # Panics
    /// Panics if `b >= self.batch()`.
    pub fn matrix(&self, b: usize) -> &[f64] {
        let len = self.shape.matrix_len();
        &self.data[b * len..(b + 1) * len]
    }

    /// Iterator over the row-major entries of each batch element.
    pub fn matrices(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.shape.matrix_len())
    }

    pub(crate) fn matrices_mut(&mut self) -> impl Iterator<Item = &mut [f64]> {
        let len = self.shape.matrix_len();
        self.data.chunks_exact_mut(len)
    }

    /// Applies `f` to every entry, keeping the shape.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            shape: self.shape,
            data: self.data.iter().map(|&x| f(x)).collect(),
        }
    }

    /// Copies the batch back into nested `[batch][row][col]` vectors.
    pub fn to_matrices(&self) -> Vec<Vec<Vec<f64>>> {
        let n = self.shape.n;
        self.matrices()
            .map(|m| m.chunks_exact(n).map(<[f64]>::to_vec).collect())
            .collect()
    }

    /// Row sums of batch element `b`.
    ///
    /// # Panics
    /// Panics if `b >= self.batch()`.
    pub fn row_sums(&self, b: usize) -> Vec<f64> {
        self.matrix(b)
            .chunks_exact(self.shape.n)
            .map(|row| row.iter().sum())
            .collect()
    }

    /// Column sums of batch element `b`.
    ///
    /// # Panics
    /// Panics if `b >= self.batch()`.
    pub fn col_sums(&self, b: usize) -> Vec<f64> {
        let n = self.shape.n;
        let mut sums = vec![0.0; n];
        for row in self.matrix(b).chunks_exact(n) {
            for (s, &x) in sums.iter_mut().zip(row) {
                *s += x;
            }
        }
        sums
    }

    /// Largest `|sum - 1|` over every row and column of every batch element.
    ///
    /// Zero for an exactly doubly-stochastic plan; shrinks as the Sinkhorn
    /// iteration count grows.
    pub fn max_marginal_error(&self) -> f64 {
        (0..self.shape.batch)
            .flat_map(|b| self.row_sums(b).into_iter().chain(self.col_sums(b)))
            .map(|s| (s - 1.0).abs())
            .fold(0.0, f64::max)
    }

    /// Number of NaN or infinite entries.
    pub fn count_non_finite(&self) -> usize {
        self.data.iter().filter(|x| !x.is_finite()).count()
    }

    /// Frobenius norm of `self - other`, pooled over the flattened batch.
    ///
    /// # Errors
    /// [`AnnealError::InvalidShape`] if the shapes differ.
    pub fn frobenius_distance(&self, other: &Self) -> Result<f64> {
        self.check_same_shape(other)?;
        Ok(squared_distance(&self.data, &other.data).sqrt())
    }

    /// Frobenius norm of `self - other` for each batch element separately.
    ///
    /// # Errors
    /// [`AnnealError::InvalidShape`] if the shapes differ.
    pub fn element_distances(&self, other: &Self) -> Result<Vec<f64>> {
        self.check_same_shape(other)?;
        Ok(self
            .matrices()
            .zip(other.matrices())
            .map(|(a, b)| squared_distance(a, b).sqrt())
            .collect())
    }

    /// Mean row entropy `-sum_j P_ij ln(P_ij + 1e-8)`, averaged over all
    /// rows of all batch elements.
    ///
    /// Near `ln N` for a uniform plan and near zero for a permutation.
    pub fn entropy(&self) -> f64 {
        let n = self.shape.n;
        let rows = self.shape.batch * n;
        let total: f64 = self
            .data
            .chunks_exact(n)
            .map(|row| -row.iter().map(|&p| p * (p + ENTROPY_EPS).ln()).sum::<f64>())
            .sum();
        total / rows as f64
    }

    fn check_same_shape(&self, other: &Self) -> Result<()> {
        if self.shape != other.shape {
            return Err(AnnealError::invalid_shape(format!(
                "shape mismatch: {} vs {}",
                self.shape, other.shape
            )));
        }
        Ok(())
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}


#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;
    use crate::sinkhorn::solve;

    #[test]
    fn test_json_round_trip() {
        let batch = SquareBatch::new(2, 2, vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8]).unwrap();
        let json = serde_json::to_string(&batch).unwrap();
        let back: SquareBatch = serde_json::from_str(&json).unwrap();
        assert_eq!(back, batch);
    }

    #[test]
    fn test_json_rejects_zero_dimension() {
        let err = serde_json::from_str::<CostMatrix>(r#"{"shape":{"batch":1,"n":0},"data":[]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("Invalid shape"));
    }

    #[test]
    fn test_json_rejects_wrong_length() {
        let parsed =
            serde_json::from_str::<CostMatrix>(r#"{"shape":{"batch":2,"n":3},"data":[0.5]}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_deserialized_cost_solves() {
        let cost: CostMatrix =
            serde_json::from_str(r#"{"shape":{"batch":1,"n":2},"data":[0.0,1.0,1.0,0.0]}"#)
                .unwrap();
        let plan = solve(&cost, 0.5, 20).unwrap();
        assert!(plan.as_slice().iter().all(|&p| p >= 0.0));
    }
}
