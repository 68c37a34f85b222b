//! Simulation configuration and synthetic cost streams.

use crate::error::{AnnealError, Result};
use crate::sinkhorn::{CostMatrix, DEFAULT_ITERATIONS};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// How the synthetic cost matrix evolves from epoch to epoch.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CostNoise {
    /// One standard-normal matrix reused for every epoch.
    Static,

    /// A fresh standard-normal matrix every epoch.
    #[default]
    Gaussian,

    /// A fresh standard-normal matrix scaled by
    /// `max(floor, 1 - epoch / horizon)`, imitating a cost model that
    /// becomes less noisy as it trains.
    Decaying {
        /// Smallest noise scale, in `[0, 1]`.
        floor: f64,
        /// Epoch count over which the scale falls from 1 to `floor`.
        horizon: f64,
    },
}

impl CostNoise {
    /// Multiplier applied to the standard-normal entries at `epoch`.
    pub fn scale(&self, epoch: usize) -> f64 {
        match *self {
            CostNoise::Static | CostNoise::Gaussian => 1.0,
            CostNoise::Decaying { floor, horizon } => (1.0 - epoch as f64 / horizon).max(floor),
        }
    }
}

/// Configuration for a side-by-side annealing simulation.
///
/// # Examples
///
/// ```
/// use eph_anneal::simulation::{CostNoise, SimulationConfig};
///
/// let config = SimulationConfig::default()
///     .with_n_points(20)
///     .with_batch_size(4)
///     .with_epochs(50)
///     .with_noise(CostNoise::Decaying { floor: 0.1, horizon: 20.0 })
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationConfig {
    /// Side length `N` of every cost matrix.
    pub n_points: usize,

    /// Number of matrices `B` per epoch.
    pub batch_size: usize,

    /// Number of solve/observe steps.
    pub epochs: usize,

    /// Sinkhorn sweeps per solve.
    pub sinkhorn_iterations: usize,

    /// Seed of the cost stream. Equal seeds give equal streams.
    pub seed: u64,

    /// Cost stream shape over time.
    pub noise: CostNoise,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            n_points: 10,
            batch_size: 1,
            epochs: 100,
            sinkhorn_iterations: DEFAULT_ITERATIONS,
            seed: 42,
            noise: CostNoise::default(),
        }
    }
}

impl SimulationConfig {
    /// Sets the matrix side length `N`.
    pub fn with_n_points(mut self, n: usize) -> Self {
        self.n_points = n;
        self
    }

    /// Sets the batch size `B`.
    pub fn with_batch_size(mut self, b: usize) -> Self {
        self.batch_size = b;
        self
    }

    /// Sets the number of epochs.
    pub fn with_epochs(mut self, n: usize) -> Self {
        self.epochs = n;
        self
    }

    /// Sets the Sinkhorn sweeps per solve.
    pub fn with_sinkhorn_iterations(mut self, n: usize) -> Self {
        self.sinkhorn_iterations = n;
        self
    }

    /// Sets the cost stream seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets how costs change between epochs.
    pub fn with_noise(mut self, noise: CostNoise) -> Self {
        self.noise = noise;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("n_points", self.n_points),
            ("batch_size", self.batch_size),
            ("epochs", self.epochs),
            ("sinkhorn_iterations", self.sinkhorn_iterations),
        ] {
            if value == 0 {
                return Err(AnnealError::invalid_parameter(name, "must be at least 1"));
            }
        }
        if let CostNoise::Decaying { floor, horizon } = self.noise {
            if !(0.0..=1.0).contains(&floor) {
                return Err(AnnealError::invalid_parameter(
                    "noise.floor",
                    format!("must be in [0, 1], got {floor}"),
                ));
            }
            if !(horizon.is_finite() && horizon > 0.0) {
                return Err(AnnealError::invalid_parameter(
                    "noise.horizon",
                    format!("must be finite and positive, got {horizon}"),
                ));
            }
        }
        Ok(())
    }

    /// Generates the full cost stream, one batch per epoch.
    pub fn cost_stream(&self) -> Result<Vec<CostMatrix>> {
        self.validate()?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let len = self.batch_size * self.n_points * self.n_points;

        let mut sample = |scale: f64| -> Result<CostMatrix> {
            let data = (0..len)
                .map(|_| rng.sample::<f64, _>(StandardNormal) * scale)
                .collect();
            CostMatrix::new(self.batch_size, self.n_points, data)
        };

        match self.noise {
            CostNoise::Static => {
                let cost = sample(1.0)?;
                Ok(vec![cost; self.epochs])
            }
            noise => (0..self.epochs)
                .map(|epoch| sample(noise.scale(epoch)))
                .collect(),
        }
    }
}
