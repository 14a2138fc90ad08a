//! Random-walk Metropolis sampling from a one-dimensional density

use crate::error::{ModelError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, Normal as NormalDensity};

/// Unnormalised log density the chain targets
pub trait TargetDensity: Send + Sync {
    fn log_density(&self, x: f64) -> f64;
}

/// N(0, 1)
#[derive(Debug, Clone)]
pub struct StandardNormal {
    density: NormalDensity,
}

impl StandardNormal {
    pub fn new() -> Result<Self> {
        let density = NormalDensity::new(0.0, 1.0).map_err(|e| ModelError::InvalidConfig {
            name: "target density",
            reason: e.to_string(),
        })?;
        Ok(Self { density })
    }
}

impl TargetDensity for StandardNormal {
    fn log_density(&self, x: f64) -> f64 {
        self.density.ln_pdf(x)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    pub seed: u64,
    /// Draws discarded before collection starts
    pub burn_in: usize,
    /// Keep every `thinning`-th draw
    pub thinning: usize,
    /// Standard deviation of the Gaussian proposal
    pub proposal_scale: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            seed: 7,
            burn_in: 1_000,
            thinning: 5,
            proposal_scale: 2.4,
        }
    }
}

impl SamplerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.thinning == 0 {
            return Err(ModelError::InvalidConfig {
                name: "thinning",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(self.proposal_scale.is_finite() && self.proposal_scale > 0.0) {
            return Err(ModelError::InvalidConfig {
                name: "proposal_scale",
                reason: format!("{} is not a positive number", self.proposal_scale),
            });
        }
        Ok(())
    }
}

/// Draws from a [`TargetDensity`] with a seeded chain
#[derive(Debug, Clone)]
pub struct MetropolisSampler {
    config: SamplerConfig,
}

/// Kept draws and the chain's acceptance rate
#[derive(Debug, Clone, PartialEq)]
pub struct Draws {
    pub values: Vec<f64>,
    pub acceptance_rate: f64,
}

impl MetropolisSampler {
    pub fn new(config: SamplerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Run the chain until `count` thinned draws are collected
    ///
    /// The chain starts at 0 and is fully determined by the seed.
    pub fn sample<T: TargetDensity + ?Sized>(&self, target: &T, count: usize) -> Result<Draws> {
        let proposal = Normal::new(0.0, self.config.proposal_scale).map_err(|e| {
            ModelError::InvalidConfig {
                name: "proposal_scale",
                reason: e.to_string(),
            }
        })?;
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        let mut current = 0.0;
        let mut current_density = target.log_density(current);
        if !current_density.is_finite() {
            return Err(ModelError::NonFinite("target density at chain start"));
        }

        let total = self.config.burn_in + count * self.config.thinning;
        let mut values = Vec::with_capacity(count);
        let mut accepted = 0usize;

        for iteration in 0..total {
            let candidate = current + proposal.sample(&mut rng);
            let candidate_density = target.log_density(candidate);
            let threshold: f64 = rng.gen_range(0.0..1.0);
            if candidate_density.is_finite() && threshold.ln() < candidate_density - current_density {
                current = candidate;
                current_density = candidate_density;
                accepted += 1;
            }

            if iteration >= self.config.burn_in
                && (iteration - self.config.burn_in + 1) % self.config.thinning == 0
            {
                values.push(current);
            }
        }

        Ok(Draws {
            values,
            acceptance_rate: accepted as f64 / total.max(1) as f64,
        })
    }
}
