//! Forecast orchestration
//!
//! [`Forecaster`] windows a series once, runs every adapter on its own
//! blocking worker, checks that the successful forecasts line up and merges
//! them into a [`ForecastReport`].

use crate::adapter::{ModelAdapter, ModelKind};
use crate::config::{FailurePolicy, ForecastConfig, HorizonConfig};
use crate::error::{AdapterError, ForecastError, Result};
use crate::result::{ForecastReport, ModelOutcome};
use crate::series::PriceSeries;
use crate::window::{WindowSet, compute_windows};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runs a fixed set of model adapters over price histories
pub struct Forecaster {
    adapters: Vec<Arc<dyn ModelAdapter>>,
    config: ForecastConfig,
}

impl std::fmt::Debug for Forecaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Forecaster")
            .field("models", &self.kinds())
            .field("config", &self.config)
            .finish()
    }
}

impl Forecaster {
    /// Create a forecaster over `adapters`
    ///
    /// At least one adapter is required and no model kind may appear twice.
    pub fn new(adapters: Vec<Arc<dyn ModelAdapter>>) -> Result<Self> {
        if adapters.is_empty() {
            return Err(ForecastError::invalid_parameter(
                "adapters",
                "at least one model adapter is required",
            ));
        }

        let mut seen = BTreeSet::new();
        for adapter in &adapters {
            if !seen.insert(adapter.kind()) {
                return Err(ForecastError::invalid_parameter(
                    "adapters",
                    format!("duplicate {} adapter", adapter.kind()),
                ));
            }
        }

        Ok(Self {
            adapters,
            config: ForecastConfig::default(),
        })
    }

    /// Replace the orchestrator configuration
    pub fn with_config(mut self, config: ForecastConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Model kinds in registration order
    pub fn kinds(&self) -> Vec<ModelKind> {
        self.adapters.iter().map(|a| a.kind()).collect()
    }

    /// Largest training minimum among the adapters
    pub fn min_training_len(&self) -> usize {
        self.adapters
            .iter()
            .map(|a| a.min_training_len())
            .max()
            .unwrap_or(1)
    }

    /// Forecast `series` using the configured default horizon
    pub async fn forecast_default(&self, series: &PriceSeries) -> Result<ForecastReport> {
        self.forecast(series, self.config.horizon).await
    }

    /// Run every adapter on `series` and merge the results
    pub async fn forecast(
        &self,
        series: &PriceSeries,
        horizon: HorizonConfig,
    ) -> Result<ForecastReport> {
        if series.is_empty() {
            return Err(ForecastError::NoData {
                symbol: series.symbol().to_string(),
            });
        }
        horizon.validate()?;

        let started = Instant::now();
        info!(
            symbol = series.symbol(),
            points = series.len(),
            validation_days = horizon.validation_days,
            forecast_days = horizon.forecast_days,
            "Starting forecast run"
        );

        let window = Arc::new(compute_windows(
            series,
            horizon.validation_days,
            horizon.forecast_days,
            self.min_training_len(),
        )?);
        debug!(
            train = window.train.len(),
            validation = window.validation.len(),
            horizon = window.horizon(),
            "Windows computed"
        );

        let outcomes = self.run_adapters(&window).await?;
        check_alignment(&window, &outcomes)?;

        let failed: Vec<&AdapterError> = outcomes.values().filter_map(|o| o.as_ref().err()).collect();
        if !failed.is_empty() && failed.len() < outcomes.len() {
            match self.config.failure_policy {
                FailurePolicy::Abort => {
                    return Err(ForecastError::Adapter(failed[0].clone()));
                }
                FailurePolicy::Degrade => {
                    for failure in &failed {
                        warn!(
                            symbol = series.symbol(),
                            model = %failure.model,
                            cause = %failure.cause,
                            "Model failed, continuing without it"
                        );
                    }
                }
            }
        }

        let report = ForecastReport::assemble(series.symbol(), horizon, &window, &outcomes)?;

        info!(
            symbol = series.symbol(),
            models = report.ensemble.models.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Forecast run complete"
        );

        Ok(report)
    }

    /// Run every adapter on its own blocking worker and collect the outcomes
    ///
    /// Adapter failures (including panics) become per-model outcomes; any
    /// other error aborts the run.
    async fn run_adapters(
        &self,
        window: &Arc<WindowSet>,
    ) -> Result<BTreeMap<ModelKind, ModelOutcome>> {
        let tasks: Vec<_> = self
            .adapters
            .iter()
            .map(|adapter| {
                let adapter = Arc::clone(adapter);
                let window = Arc::clone(window);
                let kind = adapter.kind();
                let handle = tokio::task::spawn_blocking(move || {
                    let started = Instant::now();
                    let result = adapter.run(&window);
                    debug!(
                        model = %kind,
                        ok = result.is_ok(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Adapter finished"
                    );
                    result
                });
                async move { (kind, handle.await) }
            })
            .collect();

        let mut outcomes = BTreeMap::new();
        for (kind, joined) in futures::future::join_all(tasks).await {
            let outcome = match joined {
                Ok(Ok(output)) => Ok(output),
                Ok(Err(ForecastError::Adapter(err))) => Err(err),
                Ok(Err(other)) => return Err(other),
                Err(join_err) => Err(AdapterError::new(
                    kind,
                    format!("worker terminated abnormally: {join_err}"),
                )),
            };
            outcomes.insert(kind, outcome);
        }

        Ok(outcomes)
    }
}

/// Every successful forecast must carry exactly the window's forecast dates
fn check_alignment(window: &WindowSet, outcomes: &BTreeMap<ModelKind, ModelOutcome>) -> Result<()> {
    for (kind, outcome) in outcomes {
        let Ok(output) = outcome else { continue };
        if output.forecast.dates() != window.forecast_dates {
            return Err(ForecastError::Alignment(format!(
                "{kind} forecast dates differ from the forecast window ({} vs {} dates)",
                output.forecast.len(),
                window.horizon()
            )));
        }
    }
    Ok(())
}
