//! Merged, reportable output of a forecast run

use crate::adapter::{AdapterOutput, ForecastPoint, ForecastSeries, ModelKind};
use crate::config::HorizonConfig;
use crate::error::{AdapterError, ForecastError, Result};
use crate::metrics::ErrorMetrics;
use crate::series::PricePoint;
use crate::window::WindowSet;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// What one adapter returned: its output, or why it has none
pub type ModelOutcome = std::result::Result<AdapterOutput, AdapterError>;

/// Per-model status in the comparison table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ModelStatus {
    Completed { errors: ErrorMetrics },
    Failed { reason: String },
}

impl ModelStatus {
    pub fn errors(&self) -> Option<&ErrorMetrics> {
        match self {
            Self::Completed { errors } => Some(errors),
            Self::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Validation metrics side by side, one entry per model that took part
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComparisonTable(BTreeMap<ModelKind, ModelStatus>);

impl ComparisonTable {
    pub fn get(&self, kind: ModelKind) -> Option<&ModelStatus> {
        self.0.get(&kind)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ModelKind, &ModelStatus)> {
        self.0.iter()
    }

    /// Models that produced metrics
    pub fn completed(&self) -> impl Iterator<Item = (ModelKind, &ErrorMetrics)> {
        self.0
            .iter()
            .filter_map(|(kind, status)| status.errors().map(|e| (*kind, e)))
    }

    /// Models flagged as failed
    pub fn missing(&self) -> Vec<ModelKind> {
        self.0
            .iter()
            .filter(|(_, status)| status.is_failed())
            .map(|(kind, _)| *kind)
            .collect()
    }

    /// Completed model with the lowest validation MSE
    pub fn best_by_mse(&self) -> Option<ModelKind> {
        self.completed()
            .min_by(|a, b| a.1.mean_squared_error.total_cmp(&b.1.mean_squared_error))
            .map(|(kind, _)| kind)
    }
}

/// One forecast date across all models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub date: NaiveDate,
    /// `None` for a model that failed
    pub predictions: BTreeMap<ModelKind, Option<f64>>,
    pub ensemble: f64,
}

/// Historical tail plus the per-date forecast rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastTable {
    pub history: Vec<PricePoint>,
    pub rows: Vec<ForecastRow>,
}

/// Per-date mean of the available models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleForecast {
    pub points: Vec<ForecastPoint>,
    /// Models that contributed
    pub models: Vec<ModelKind>,
}

impl EnsembleForecast {
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }
}

/// Everything a caller needs to present one forecast run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastReport {
    pub id: Uuid,
    pub symbol: String,
    pub generated_at: DateTime<Utc>,
    pub horizon: HorizonConfig,
    pub comparison: ComparisonTable,
    pub forecast_table: ForecastTable,
    pub ensemble: EnsembleForecast,
    /// Dated validation replay of each completed model
    pub validation: BTreeMap<ModelKind, Vec<ForecastPoint>>,
    /// Full forecast of each completed model, including any bounds
    pub forecasts: BTreeMap<ModelKind, ForecastSeries>,
}

impl ForecastReport {
    /// Merge adapter outcomes into a report
    ///
    /// Successful outcomes must already carry exactly `window.forecast_dates`.
    pub fn assemble(
        symbol: &str,
        horizon: HorizonConfig,
        window: &WindowSet,
        outcomes: &BTreeMap<ModelKind, ModelOutcome>,
    ) -> Result<Self> {
        let completed: BTreeMap<ModelKind, &AdapterOutput> = outcomes
            .iter()
            .filter_map(|(kind, outcome)| outcome.as_ref().ok().map(|out| (*kind, out)))
            .collect();

        if completed.is_empty() {
            let failures = outcomes
                .values()
                .filter_map(|outcome| outcome.as_ref().err().cloned())
                .collect();
            return Err(ForecastError::AllModelsFailed(failures));
        }

        let comparison = ComparisonTable(
            outcomes
                .iter()
                .map(|(kind, outcome)| {
                    let status = match outcome {
                        Ok(output) => ModelStatus::Completed {
                            errors: output.validation.errors,
                        },
                        Err(err) => ModelStatus::Failed {
                            reason: err.cause.clone(),
                        },
                    };
                    (*kind, status)
                })
                .collect(),
        );

        let mut rows = Vec::with_capacity(window.horizon());
        let mut ensemble_points = Vec::with_capacity(window.horizon());
        for (step, &date) in window.forecast_dates.iter().enumerate() {
            let predictions: BTreeMap<ModelKind, Option<f64>> = outcomes
                .iter()
                .map(|(kind, outcome)| {
                    let value = outcome
                        .as_ref()
                        .ok()
                        .and_then(|out| out.forecast.points.get(step))
                        .map(|p| p.value);
                    (*kind, value)
                })
                .collect();

            let available: Vec<f64> = predictions.values().flatten().copied().collect();
            let ensemble = available.iter().sum::<f64>() / available.len() as f64;

            ensemble_points.push(ForecastPoint {
                date,
                value: ensemble,
            });
            rows.push(ForecastRow {
                date,
                predictions,
                ensemble,
            });
        }

        let validation_dates = window.validation_dates();
        let validation = completed
            .iter()
            .map(|(kind, out)| {
                let series = ForecastSeries::from_parts(&validation_dates, &out.validation.predicted);
                (*kind, series.points)
            })
            .collect();

        let forecasts = completed
            .iter()
            .map(|(kind, out)| (*kind, out.forecast.clone()))
            .collect();

        Ok(Self {
            id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            generated_at: Utc::now(),
            horizon,
            comparison,
            forecast_table: ForecastTable {
                history: window.history(),
                rows,
            },
            ensemble: EnsembleForecast {
                points: ensemble_points,
                models: completed.keys().copied().collect(),
            },
            validation,
            forecasts,
        })
    }
}
