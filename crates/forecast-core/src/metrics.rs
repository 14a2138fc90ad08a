//! Comparable accuracy statistics for validation replays

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// Accuracy of one model over the validation window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorMetrics {
    /// Mean of squared differences
    pub mean_squared_error: f64,
    /// Symmetric mean absolute percentage error, in percent (0..=200)
    pub scale_free_percent_error: f64,
    /// Fraction of one-step moves whose direction was called correctly (0..=1)
    pub directional_accuracy: f64,
}

/// Score `predicted` against `actual`
///
/// Both slices must have the same length and at least two points.
pub fn compute_errors(actual: &[f64], predicted: &[f64]) -> Result<ErrorMetrics> {
    if actual.len() != predicted.len() {
        return Err(ForecastError::LengthMismatch {
            actual: actual.len(),
            predicted: predicted.len(),
        });
    }
    if actual.len() < 2 {
        return Err(ForecastError::DegenerateInput(format!(
            "need at least 2 points to score a forecast, got {}",
            actual.len()
        )));
    }

    Ok(ErrorMetrics {
        mean_squared_error: mean_squared_error(actual, predicted),
        scale_free_percent_error: smape(actual, predicted),
        directional_accuracy: directional_accuracy(actual, predicted),
    })
}

fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    sum / actual.len() as f64
}

fn smape(actual: &[f64], predicted: &[f64]) -> f64 {
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| {
            let denom = a.abs() + p.abs();
            if denom == 0.0 {
                0.0
            } else {
                2.0 * (a - p).abs() / denom
            }
        })
        .sum();
    sum * 100.0 / actual.len() as f64
}

/// Moves are measured from the previous *actual* price, so each step scores
/// a one-step call rather than the drift of the predicted path.
fn directional_accuracy(actual: &[f64], predicted: &[f64]) -> f64 {
    let steps = actual.len() - 1;
    let correct = (1..actual.len())
        .filter(|&i| {
            let actual_up = actual[i] - actual[i - 1] >= 0.0;
            let predicted_up = predicted[i] - actual[i - 1] >= 0.0;
            actual_up == predicted_up
        })
        .count();
    correct as f64 / steps as f64
}
