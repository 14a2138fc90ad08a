//! The contract every forecasting model implements
//!
//! An adapter consumes a [`WindowSet`] and returns a walk-forward validation
//! replay (scored with [`compute_errors`]) plus a forecast keyed by the
//! window's forecast dates. Adapters hold no state shared with each other,
//! so the orchestrator can run them on independent worker threads.

use crate::error::{ForecastError, Result};
use crate::metrics::{ErrorMetrics, compute_errors};
use crate::window::WindowSet;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The model families taking part in a forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Auto-selected ARIMA
    Statistical,
    /// Windowed neural sequence predictor
    Sequence,
    /// Sampled-innovation diffusion
    Simulation,
}

impl ModelKind {
    /// Every kind, in reporting order
    pub const ALL: [ModelKind; 3] = [Self::Statistical, Self::Sequence, Self::Simulation];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Statistical => "statistical",
            Self::Sequence => "sequence",
            Self::Simulation => "simulation",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Walk-forward predictions over the validation window and their score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// One prediction per validation point, same order
    pub predicted: Vec<f64>,
    pub errors: ErrorMetrics,
}

/// A dated predicted price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Lower and upper bound around a forecast value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lower: f64,
    pub upper: f64,
}

/// A model's forecast over the horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    pub points: Vec<ForecastPoint>,
    /// Confidence bounds, when the model produces them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intervals: Option<Vec<Interval>>,
}

impl ForecastSeries {
    /// Pair `values` with `dates`; extra entries on either side are dropped
    pub fn from_parts(dates: &[NaiveDate], values: &[f64]) -> Self {
        Self {
            points: dates
                .iter()
                .zip(values)
                .map(|(&date, &value)| ForecastPoint { date, value })
                .collect(),
            intervals: None,
        }
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Everything one adapter run produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterOutput {
    pub validation: ValidationResult,
    pub forecast: ForecastSeries,
}

impl AdapterOutput {
    /// Score a validation replay and key forecast values by the window dates
    ///
    /// Non-finite output is reported as an adapter failure for `model`; a
    /// value count that differs from the window is reported as misalignment.
    pub fn assemble(
        model: ModelKind,
        window: &WindowSet,
        predicted_validation: Vec<f64>,
        forecast_values: &[f64],
    ) -> Result<Self> {
        if predicted_validation.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::adapter(
                model,
                "validation replay produced a non-finite prediction",
            ));
        }
        if forecast_values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::adapter(
                model,
                "forecast produced a non-finite value",
            ));
        }
        if forecast_values.len() != window.forecast_dates.len() {
            return Err(ForecastError::Alignment(format!(
                "{model} produced {} forecast values for {} dates",
                forecast_values.len(),
                window.forecast_dates.len()
            )));
        }

        let errors = compute_errors(&window.validation_closes(), &predicted_validation)?;

        Ok(Self {
            validation: ValidationResult {
                predicted: predicted_validation,
                errors,
            },
            forecast: ForecastSeries::from_parts(&window.forecast_dates, forecast_values),
        })
    }

    /// Attach `(lower, upper)` bounds to the forecast
    pub fn with_intervals(mut self, bounds: &[(f64, f64)]) -> Self {
        self.forecast.intervals = Some(
            bounds
                .iter()
                .map(|&(lower, upper)| Interval { lower, upper })
                .collect(),
        );
        self
    }
}

/// A forecasting model wrapped behind the common contract
pub trait ModelAdapter: Send + Sync {
    /// Which model family this is
    fn kind(&self) -> ModelKind;

    /// Fewest training observations the model can work with
    fn min_training_len(&self) -> usize {
        1
    }

    /// Validate on the window's validation slice and forecast its dates
    fn run(&self, window: &WindowSet) -> Result<AdapterOutput>;
}

/// A model that can be stepped through a walk-forward replay
pub trait OneStepModel {
    /// Predict the next value from what has been observed so far
    fn predict_next(&mut self) -> Result<f64>;

    /// Reveal the true value of the step just predicted
    fn observe(&mut self, actual: f64) -> Result<()>;
}

/// Sequential one-step validation
///
/// Each prediction uses only values strictly before the point being
/// predicted; the true value is revealed to the model right after.
pub fn walk_forward<M>(model: &mut M, actual: &[f64]) -> Result<Vec<f64>>
where
    M: OneStepModel + ?Sized,
{
    let mut predictions = Vec::with_capacity(actual.len());
    for &value in actual {
        predictions.push(model.predict_next()?);
        model.observe(value)?;
    }
    Ok(predictions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::PricePoint;
    use chrono::Days;

    /// Predicts the last observed value
    struct Persistence {
        last: f64,
        seen: Vec<f64>,
    }

    impl OneStepModel for Persistence {
        fn predict_next(&mut self) -> Result<f64> {
            Ok(self.last)
        }

        fn observe(&mut self, actual: f64) -> Result<()> {
            self.seen.push(actual);
            self.last = actual;
            Ok(())
        }
    }

    fn window() -> WindowSet {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let point = |i: u64, close: f64| PricePoint::new(start + Days::new(i), close);
        WindowSet {
            train: vec![point(0, 10.0), point(1, 11.0)],
            validation: vec![point(2, 12.0), point(3, 11.5), point(4, 13.0)],
            forecast_dates: vec![start + Days::new(5), start + Days::new(8)],
        }
    }

    #[test]
    fn test_walk_forward_reveals_after_predicting() {
        let mut model = Persistence {
            last: 11.0,
            seen: Vec::new(),
        };
        let predictions = walk_forward(&mut model, &[12.0, 11.5, 13.0]).unwrap();

        assert_eq!(predictions, vec![11.0, 12.0, 11.5]);
        assert_eq!(model.seen, vec![12.0, 11.5, 13.0]);
    }

    #[test]
    fn test_assemble_scores_and_dates() {
        let window = window();
        let output = AdapterOutput::assemble(
            ModelKind::Statistical,
            &window,
            vec![12.0, 11.5, 13.0],
            &[13.5, 14.0],
        )
        .unwrap();

        assert_eq!(output.validation.errors.mean_squared_error, 0.0);
        assert_eq!(output.forecast.dates(), window.forecast_dates);
        assert_eq!(output.forecast.values(), vec![13.5, 14.0]);
        assert!(output.forecast.intervals.is_none());

        let output = output.with_intervals(&[(13.0, 14.0), (13.0, 15.0)]);
        assert_eq!(output.forecast.intervals.unwrap().len(), 2);
    }

    #[test]
    fn test_assemble_rejects_non_finite() {
        let err = AdapterOutput::assemble(
            ModelKind::Sequence,
            &window(),
            vec![12.0, f64::NAN, 13.0],
            &[1.0, 2.0],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ForecastError::Adapter(ref e) if e.model == ModelKind::Sequence
        ));
    }

    #[test]
    fn test_assemble_rejects_wrong_horizon() {
        let err =
            AdapterOutput::assemble(ModelKind::Simulation, &window(), vec![1.0, 2.0, 3.0], &[1.0])
                .unwrap_err();
        assert!(matches!(err, ForecastError::Alignment(_)));
    }

    #[test]
    fn test_assemble_propagates_metric_errors() {
        let err =
            AdapterOutput::assemble(ModelKind::Simulation, &window(), vec![1.0, 2.0], &[1.0, 2.0])
                .unwrap_err();
        assert!(matches!(err, ForecastError::LengthMismatch { .. }));
    }

    #[test]
    fn test_model_kind_names() {
        assert_eq!(ModelKind::Statistical.to_string(), "statistical");
        assert_eq!(ModelKind::ALL.len(), 3);
    }
}
