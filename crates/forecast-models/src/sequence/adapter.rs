use super::network::{Network, Sample, TrainingConfig};
use crate::error::{ModelError, ensure_finite};
use crate::linalg::mean_variance;
use forecast_core::{
    AdapterOutput, ForecastError, ModelAdapter, ModelKind, OneStepModel, Result, WindowSet,
    walk_forward,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

const KIND: ModelKind = ModelKind::Sequence;

/// Lookback length in trading days
pub const DEFAULT_LOOKBACK: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SequenceConfig {
    pub lookback: usize,
    pub hidden_units: usize,
    pub training: TrainingConfig,
    /// Seeds weight initialisation and shuffling
    pub seed: u64,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            lookback: DEFAULT_LOOKBACK,
            hidden_units: 16,
            training: TrainingConfig::default(),
            seed: 42,
        }
    }
}

/// Standardisation fitted on training returns
#[derive(Debug, Clone, Copy)]
struct Scaler {
    mean: f64,
    std: f64,
}

impl Scaler {
    fn fit(values: &[f64]) -> Self {
        let (mean, variance) = mean_variance(values);
        Self {
            mean,
            std: variance.sqrt().max(1e-8),
        }
    }

    fn scale(&self, value: f64) -> f64 {
        (value - self.mean) / self.std
    }

    fn unscale(&self, value: f64) -> f64 {
        value * self.std + self.mean
    }
}

/// Windowed network predicting the next standardised log return
///
/// Trained once on the training window. Validation slides the lookback
/// across revealed prices without retraining; the forecast rolls the
/// network forward on its own predictions.
#[derive(Debug, Clone, Default)]
pub struct SequenceAdapter {
    config: SequenceConfig,
}

impl SequenceAdapter {
    pub fn new(config: SequenceConfig) -> Self {
        Self { config }
    }
}

impl ModelAdapter for SequenceAdapter {
    fn kind(&self) -> ModelKind {
        KIND
    }

    /// A full lookback of returns plus one target
    fn min_training_len(&self) -> usize {
        self.config.lookback + 2
    }

    fn run(&self, window: &WindowSet) -> Result<AdapterOutput> {
        let lookback = self.config.lookback;
        if lookback == 0 {
            return Err(into_error(ModelError::InvalidConfig {
                name: "lookback",
                reason: "must be positive".to_string(),
            }));
        }

        let train = window.train_closes();
        let returns = log_returns(&train).map_err(into_error)?;
        if returns.len() <= lookback {
            return Err(into_error(ModelError::TooShort {
                needed: self.min_training_len(),
                got: train.len(),
            }));
        }

        let scaler = Scaler::fit(&returns);
        let scaled: Vec<f64> = returns.iter().map(|r| scaler.scale(*r)).collect();
        let samples: Vec<Sample> = (lookback..scaled.len())
            .map(|t| (scaled[t - lookback..t].to_vec(), scaled[t]))
            .collect();

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut network = Network::new(lookback, self.config.hidden_units, &mut rng);
        let loss = network
            .train(&samples, &self.config.training, &mut rng)
            .map_err(into_error)?;
        debug!(samples = samples.len(), loss, "Sequence network trained");

        let mut stepper = RollingStepper {
            network: &network,
            scaler,
            recent: scaled[scaled.len() - lookback..].iter().copied().collect(),
            last_price: train.last().copied().unwrap_or_default(),
        };
        let predicted = walk_forward(&mut stepper, &window.validation_closes())?;

        let forecast = (0..window.horizon())
            .map(|_| stepper.roll())
            .collect::<Result<Vec<f64>>>()?;

        AdapterOutput::assemble(KIND, window, predicted, &forecast)
    }
}

/// Lookback state carried through validation and forecasting
struct RollingStepper<'a> {
    network: &'a Network,
    scaler: Scaler,
    recent: VecDeque<f64>,
    last_price: f64,
}

impl RollingStepper<'_> {
    fn next_scaled(&self) -> Result<f64> {
        let input: Vec<f64> = self.recent.iter().copied().collect();
        ensure_finite(self.network.predict(&input), "network output").map_err(into_error)
    }

    fn push(&mut self, scaled: f64) {
        self.recent.pop_front();
        self.recent.push_back(scaled);
    }

    fn price_after(&self, scaled: f64) -> Result<f64> {
        let price = self.last_price * self.scaler.unscale(scaled).exp();
        ensure_finite(price, "price reconstruction").map_err(into_error)
    }

    /// Advance on the model's own prediction
    fn roll(&mut self) -> Result<f64> {
        let scaled = self.next_scaled()?;
        let price = self.price_after(scaled)?;
        self.push(scaled);
        self.last_price = price;
        Ok(price)
    }
}

impl OneStepModel for RollingStepper<'_> {
    fn predict_next(&mut self) -> Result<f64> {
        let scaled = self.next_scaled()?;
        self.price_after(scaled)
    }

    fn observe(&mut self, actual: f64) -> Result<()> {
        if actual <= 0.0 {
            return Err(into_error(ModelError::NonPositivePrice(actual)));
        }
        let log_return = (actual / self.last_price).ln();
        self.push(self.scaler.scale(log_return));
        self.last_price = actual;
        Ok(())
    }
}

fn log_returns(prices: &[f64]) -> crate::error::Result<Vec<f64>> {
    if let Some(bad) = prices.iter().find(|p| **p <= 0.0) {
        return Err(ModelError::NonPositivePrice(*bad));
    }
    Ok(prices.windows(2).map(|w| (w[1] / w[0]).ln()).collect())
}

fn into_error(err: ModelError) -> ForecastError {
    err.into_forecast_error(KIND)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use forecast_core::{PricePoint, PriceSeries, business_days_after, compute_windows};

    fn window(prices: impl Fn(usize) -> f64) -> WindowSet {
        let start = NaiveDate::from_ymd_opt(2022, 6, 1).unwrap();
        let points = business_days_after(start, 320)
            .into_iter()
            .enumerate()
            .map(|(i, d)| PricePoint::new(d, prices(i)))
            .collect();
        let series = PriceSeries::new("SEQ", points).unwrap();
        compute_windows(&series, 60, 15, DEFAULT_LOOKBACK + 2).unwrap()
    }

    fn quick() -> SequenceAdapter {
        SequenceAdapter::new(SequenceConfig {
            training: TrainingConfig {
                epochs: 10,
                ..TrainingConfig::default()
            },
            ..SequenceConfig::default()
        })
    }

    #[test]
    fn test_forecast_is_positive_and_finite() {
        let window = window(|i| 50.0 + 5.0 * (i as f64 / 9.0).sin() + 0.05 * i as f64);
        let output = quick().run(&window).unwrap();

        assert_eq!(output.forecast.len(), 15);
        assert!(output.forecast.values().iter().all(|v| v.is_finite() && *v > 0.0));
        assert_eq!(output.validation.predicted.len(), window.validation.len());
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let window = window(|i| 80.0 + (i as f64 / 4.0).cos());
        let first = quick().run(&window).unwrap();
        let second = quick().run(&window).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_min_training_len_tracks_lookback() {
        let adapter = SequenceAdapter::new(SequenceConfig {
            lookback: 10,
            ..SequenceConfig::default()
        });
        assert_eq!(adapter.min_training_len(), 12);
        assert_eq!(SequenceAdapter::default().min_training_len(), 62);
    }

    #[test]
    fn test_non_positive_prices_fail_the_model() {
        let window = window(|i| if i == 5 { -1.0 } else { 10.0 + i as f64 });
        let err = quick().run(&window).unwrap_err();
        assert!(matches!(err, ForecastError::Adapter(ref e) if e.model == ModelKind::Sequence));
    }
}
