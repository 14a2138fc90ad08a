use super::sampler::{MetropolisSampler, SamplerConfig, StandardNormal, TargetDensity};
use crate::error::{ModelError, ensure_finite};
use forecast_core::{
    AdapterOutput, ForecastError, ModelAdapter, ModelKind, OneStepModel, Result, WindowSet,
    walk_forward,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

const KIND: ModelKind = ModelKind::Simulation;

/// Geometric Brownian motion coefficients
///
/// These are fixed rather than estimated from the history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiffusionParams {
    /// Annualised drift
    pub rate: f64,
    /// Annualised volatility
    pub volatility: f64,
    /// Step length in years
    pub dt: f64,
}

impl Default for DiffusionParams {
    fn default() -> Self {
        Self {
            rate: 0.05,
            volatility: 0.2,
            dt: 1.0 / 252.0,
        }
    }
}

impl DiffusionParams {
    /// `S · exp((r − σ²/2)·dt + σ·√dt·z)`
    pub fn step(&self, price: f64, z: f64) -> f64 {
        let drift = (self.rate - 0.5 * self.volatility * self.volatility) * self.dt;
        price * (drift + self.volatility * self.dt.sqrt() * z).exp()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub diffusion: DiffusionParams,
    /// Simulated paths averaged into each step
    pub paths: usize,
    /// Pair every draw with its negation
    pub antithetic: bool,
    pub sampler: SamplerConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            diffusion: DiffusionParams::default(),
            paths: 200,
            antithetic: true,
            sampler: SamplerConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Sampled innovations consumed per step
    fn draws_per_step(&self) -> usize {
        if self.antithetic {
            self.paths.div_ceil(2)
        } else {
            self.paths
        }
    }
}

/// Sampled-innovation diffusion behind the adapter contract
///
/// Nothing is fitted: each step moves the last known price by the mean of
/// the simulated one-step outcomes. The sampler seed makes runs repeatable.
#[derive(Clone)]
pub struct SimulationAdapter {
    config: SimulationConfig,
    target: Arc<dyn TargetDensity>,
}

impl std::fmt::Debug for SimulationAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationAdapter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SimulationAdapter {
    /// Standard normal innovations
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let target = StandardNormal::new().map_err(into_error)?;
        Ok(Self::with_target(config, Arc::new(target)))
    }

    /// Innovations from a custom density
    pub fn with_target(config: SimulationConfig, target: Arc<dyn TargetDensity>) -> Self {
        Self { config, target }
    }
}

impl ModelAdapter for SimulationAdapter {
    fn kind(&self) -> ModelKind {
        KIND
    }

    fn run(&self, window: &WindowSet) -> Result<AdapterOutput> {
        if self.config.paths == 0 {
            return Err(into_error(ModelError::InvalidConfig {
                name: "paths",
                reason: "must be at least 1".to_string(),
            }));
        }
        let last_train = window
            .train
            .last()
            .map(|p| p.close)
            .ok_or_else(|| into_error(ModelError::TooShort { needed: 1, got: 0 }))?;

        let steps = window.validation.len() + window.horizon();
        let sampler = MetropolisSampler::new(self.config.sampler).map_err(into_error)?;
        let draws = sampler
            .sample(self.target.as_ref(), steps * self.config.draws_per_step())
            .map_err(into_error)?;
        debug!(
            draws = draws.values.len(),
            acceptance_rate = draws.acceptance_rate,
            "Innovations sampled"
        );

        let mut stepper = DiffusionStepper {
            config: &self.config,
            draws: &draws.values,
            cursor: 0,
            price: last_train,
        };
        let predicted = walk_forward(&mut stepper, &window.validation_closes())?;

        let forecast = (0..window.horizon())
            .map(|_| {
                let next = stepper.predict_next()?;
                stepper.price = next;
                Ok(next)
            })
            .collect::<Result<Vec<f64>>>()?;

        AdapterOutput::assemble(KIND, window, predicted, &forecast)
    }
}

/// Walks through the sampled innovations, one block per step
struct DiffusionStepper<'a> {
    config: &'a SimulationConfig,
    draws: &'a [f64],
    cursor: usize,
    price: f64,
}

impl OneStepModel for DiffusionStepper<'_> {
    fn predict_next(&mut self) -> Result<f64> {
        let width = self.config.draws_per_step();
        let draws = self.draws;
        let block = draws
            .get(self.cursor..self.cursor + width)
            .ok_or_else(|| into_error(ModelError::NonFinite("exhausted innovation draws")))?;
        self.cursor += width;

        let params = &self.config.diffusion;
        let (sum, count) = block.iter().fold((0.0, 0usize), |(sum, count), &z| {
            if self.config.antithetic {
                (
                    sum + params.step(self.price, z) + params.step(self.price, -z),
                    count + 2,
                )
            } else {
                (sum + params.step(self.price, z), count + 1)
            }
        });

        ensure_finite(sum / count as f64, "simulated price").map_err(into_error)
    }

    fn observe(&mut self, actual: f64) -> Result<()> {
        self.price = actual;
        Ok(())
    }
}

fn into_error(err: ModelError) -> ForecastError {
    err.into_forecast_error(KIND)
}
