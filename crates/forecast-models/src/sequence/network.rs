//! A single-hidden-layer feed-forward network trained by mini-batch SGD

use crate::error::{ModelError, Result, ensure_finite};
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Optimiser settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 40,
            batch_size: 32,
            learning_rate: 0.01,
        }
    }
}

/// Input vector and scalar target
pub type Sample = (Vec<f64>, f64);

/// tanh hidden layer, linear scalar output
#[derive(Debug, Clone)]
pub struct Network {
    hidden_weights: Vec<Vec<f64>>,
    hidden_bias: Vec<f64>,
    output_weights: Vec<f64>,
    output_bias: f64,
}

impl Network {
    /// Xavier-uniform initialisation from `rng`
    pub fn new(inputs: usize, hidden: usize, rng: &mut StdRng) -> Self {
        let hidden_limit = (6.0 / (inputs + hidden) as f64).sqrt();
        let output_limit = (6.0 / (hidden + 1) as f64).sqrt();

        let hidden_weights = (0..hidden)
            .map(|_| {
                (0..inputs)
                    .map(|_| rng.gen_range(-hidden_limit..hidden_limit))
                    .collect()
            })
            .collect();
        let output_weights = (0..hidden)
            .map(|_| rng.gen_range(-output_limit..output_limit))
            .collect();

        Self {
            hidden_weights,
            hidden_bias: vec![0.0; hidden],
            output_weights,
            output_bias: 0.0,
        }
    }

    pub fn inputs(&self) -> usize {
        self.hidden_weights.first().map_or(0, Vec::len)
    }

    fn hidden(&self, input: &[f64]) -> Vec<f64> {
        self.hidden_weights
            .iter()
            .zip(&self.hidden_bias)
            .map(|(weights, bias)| {
                let z: f64 = weights.iter().zip(input).map(|(w, x)| w * x).sum();
                (z + bias).tanh()
            })
            .collect()
    }

    pub fn predict(&self, input: &[f64]) -> f64 {
        let hidden = self.hidden(input);
        self.output_bias
            + hidden
                .iter()
                .zip(&self.output_weights)
                .map(|(h, w)| h * w)
                .sum::<f64>()
    }

    /// Mean squared error over `samples`
    pub fn loss(&self, samples: &[Sample]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        samples
            .iter()
            .map(|(x, y)| (self.predict(x) - y).powi(2))
            .sum::<f64>()
            / samples.len() as f64
    }

    /// Train in place; returns the final training loss
    ///
    /// Samples are reshuffled from `rng` every epoch.
    pub fn train(
        &mut self,
        samples: &[Sample],
        config: &TrainingConfig,
        rng: &mut StdRng,
    ) -> Result<f64> {
        if samples.is_empty() {
            return Err(ModelError::TooShort { needed: 1, got: 0 });
        }
        if config.batch_size == 0 || config.learning_rate <= 0.0 {
            return Err(ModelError::InvalidConfig {
                name: "training",
                reason: "batch size and learning rate must be positive".to_string(),
            });
        }
        if samples.iter().any(|(x, _)| x.len() != self.inputs()) {
            return Err(ModelError::InvalidConfig {
                name: "sample",
                reason: format!("expected {} inputs", self.inputs()),
            });
        }

        let mut order: Vec<usize> = (0..samples.len()).collect();
        for _ in 0..config.epochs {
            order.shuffle(rng);
            for batch in order.chunks(config.batch_size) {
                self.step(samples, batch, config.learning_rate);
            }
            ensure_finite(self.output_bias, "training")?;
        }

        ensure_finite(self.loss(samples), "training loss")
    }

    /// One averaged gradient step over `batch`
    fn step(&mut self, samples: &[Sample], batch: &[usize], learning_rate: f64) {
        let hidden_len = self.hidden_bias.len();
        let inputs = self.inputs();
        let mut grad_hidden_w = vec![vec![0.0; inputs]; hidden_len];
        let mut grad_hidden_b = vec![0.0; hidden_len];
        let mut grad_out_w = vec![0.0; hidden_len];
        let mut grad_out_b = 0.0;

        for &index in batch {
            let (x, y) = &samples[index];
            let hidden = self.hidden(x);
            let prediction = self.output_bias
                + hidden
                    .iter()
                    .zip(&self.output_weights)
                    .map(|(h, w)| h * w)
                    .sum::<f64>();
            // d(0.5 e²)/d prediction
            let error = prediction - y;

            grad_out_b += error;
            for j in 0..hidden_len {
                grad_out_w[j] += error * hidden[j];
                let delta = error * self.output_weights[j] * (1.0 - hidden[j] * hidden[j]);
                grad_hidden_b[j] += delta;
                for (g, xi) in grad_hidden_w[j].iter_mut().zip(x) {
                    *g += delta * xi;
                }
            }
        }

        let scale = learning_rate / batch.len() as f64;
        self.output_bias -= scale * grad_out_b;
        for j in 0..hidden_len {
            self.output_weights[j] -= scale * grad_out_w[j];
            self.hidden_bias[j] -= scale * grad_hidden_b[j];
            for (w, g) in self.hidden_weights[j].iter_mut().zip(&grad_hidden_w[j]) {
                *w -= scale * g;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn linear_samples() -> Vec<Sample> {
        (0..200)
            .map(|i| {
                let a = f64::from(i % 20) / 10.0 - 1.0;
                let b = f64::from(i % 7) / 3.5 - 1.0;
                (vec![a, b], 0.5 * a - 0.3 * b)
            })
            .collect()
    }

    #[test]
    fn test_training_reduces_loss() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut net = Network::new(2, 8, &mut rng);
        let samples = linear_samples();

        let before = net.loss(&samples);
        let after = net
            .train(
                &samples,
                &TrainingConfig {
                    epochs: 200,
                    batch_size: 16,
                    learning_rate: 0.05,
                },
                &mut rng,
            )
            .unwrap();

        assert!(after < before);
        assert!(after < 0.02);
    }

    #[test]
    fn test_same_seed_same_network() {
        let samples = linear_samples();
        let config = TrainingConfig::default();
        let train = || {
            let mut rng = StdRng::seed_from_u64(9);
            let mut net = Network::new(2, 4, &mut rng);
            net.train(&samples, &config, &mut rng).unwrap();
            net.predict(&[0.3, -0.2])
        };
        assert_eq!(train().to_bits(), train().to_bits());
    }

    #[test]
    fn test_rejects_bad_input() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut net = Network::new(3, 4, &mut rng);
        let config = TrainingConfig::default();

        assert!(net.train(&[], &config, &mut rng).is_err());
        assert!(net.train(&[(vec![1.0], 0.0)], &config, &mut rng).is_err());
    }
}
