//! Page and API route handlers

use crate::error::ApiError;
use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::Html;
use forecast_core::{ForecastReport, HorizonConfig};
use forecast_stock::{ForecastService, LookupOutcome, SymbolLookup};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Budget for one forecast request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub service: ForecastService,
    pub lookup: SymbolLookup,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(service: ForecastService, lookup: SymbolLookup) -> Self {
        Self {
            service,
            lookup,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    pub symbol: String,
    pub validation_days: Option<u32>,
    pub forecast_days: Option<u32>,
}

impl ForecastQuery {
    /// Requested horizon, falling back to `defaults` per field
    pub fn horizon(&self, defaults: HorizonConfig) -> HorizonConfig {
        HorizonConfig {
            validation_days: self.validation_days.unwrap_or(defaults.validation_days),
            forecast_days: self.forecast_days.unwrap_or(defaults.forecast_days),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    #[serde(default)]
    pub q: String,
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "models": state.service.forecaster().kinds(),
    }))
}

/// `GET /api/forecast?symbol=AAPL&validation_days=90&forecast_days=30`
pub async fn forecast(
    State(state): State<AppState>,
    query: Result<Query<ForecastQuery>, QueryRejection>,
) -> Result<Json<ForecastReport>, ApiError> {
    let Query(query) = query?;
    let horizon = query.horizon(state.service.forecaster().config().horizon);
    let report = tokio::time::timeout(
        state.request_timeout,
        state.service.forecast(&query.symbol, horizon),
    )
    .await
    .map_err(|_| ApiError::Timeout(state.request_timeout))??;

    Ok(Json(report))
}

/// `GET /api/lookup?q=apple`
pub async fn lookup(
    State(state): State<AppState>,
    query: Result<Query<LookupQuery>, QueryRejection>,
) -> Result<Json<LookupOutcome>, ApiError> {
    let Query(query) = query?;
    let outcome = state.lookup.search(&query.q).await?;
    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizon_falls_back_per_field() {
        let query = ForecastQuery {
            symbol: "AAPL".to_string(),
            validation_days: None,
            forecast_days: Some(10),
        };
        let horizon = query.horizon(HorizonConfig::default());
        assert_eq!(horizon.validation_days, 90);
        assert_eq!(horizon.forecast_days, 10);
    }

    #[test]
    fn test_index_loads_chart_library() {
        assert!(INDEX_HTML.contains("plotly"));
        assert!(INDEX_HTML.contains("/api/forecast"));
    }
}
