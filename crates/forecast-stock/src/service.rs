//! Fetch a symbol's history and run the forecast engine on it

use crate::api::YahooFinanceClient;
use crate::config::StockConfig;
use crate::error::{Result, StockError};
use crate::session::ThrottledSource;
use crate::source::PriceSource;
use forecast_core::{ForecastConfig, ForecastReport, Forecaster, HorizonConfig};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use std::time::Instant;
use tracing::{info, warn};

/// Tickers as Yahoo spells them: `AAPL`, `BRK-B`, `7203.T`, `^GSPC`, `EURUSD=X`
static SYMBOL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\^?[A-Z0-9][A-Z0-9.\-]{0,14}(=X|=F)?$").expect("valid symbol pattern")
});

/// End-to-end forecasting for a ticker
#[derive(Clone)]
pub struct ForecastService {
    source: Arc<dyn PriceSource>,
    forecaster: Arc<Forecaster>,
}

impl ForecastService {
    pub fn new(source: Arc<dyn PriceSource>, forecaster: Arc<Forecaster>) -> Self {
        Self { source, forecaster }
    }

    /// Yahoo behind the cache and rate limiter, with the standard models
    pub fn from_config(stock: &StockConfig, forecast: ForecastConfig) -> Result<Self> {
        let yahoo = YahooFinanceClient::new(Arc::new(stock.clone()));
        let source = ThrottledSource::new(yahoo, stock)?;
        let forecaster = Forecaster::new(forecast_models::default_adapters()?)?.with_config(forecast);
        Ok(Self::new(Arc::new(source), Arc::new(forecaster)))
    }

    pub fn forecaster(&self) -> &Forecaster {
        &self.forecaster
    }

    /// Forecast `symbol` with the configured default horizon
    pub async fn forecast_default(&self, symbol: &str) -> Result<ForecastReport> {
        self.forecast(symbol, self.forecaster.config().horizon).await
    }

    /// Forecast `symbol` over `horizon`
    pub async fn forecast(&self, symbol: &str, horizon: HorizonConfig) -> Result<ForecastReport> {
        let symbol = normalize_symbol(symbol)?;
        horizon.validate()?;
        let started = Instant::now();

        let series = self.source.fetch_history(&symbol).await?;
        if series.is_empty() {
            return Err(StockError::no_data(&symbol));
        }
        info!(symbol = %symbol, points = series.len(), "History ready");

        let report = self
            .forecaster
            .forecast(&series, horizon)
            .await
            .inspect_err(|err| warn!(symbol = %symbol, error = %err, "Forecast failed"))?;

        info!(
            symbol = %symbol,
            models = report.ensemble.models.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Forecast served"
        );
        Ok(report)
    }
}

/// Trim and upper-case a ticker, rejecting anything that cannot be one
pub fn normalize_symbol(symbol: &str) -> Result<String> {
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(StockError::InvalidSymbol("symbol is empty".to_string()));
    }
    if !SYMBOL_PATTERN.is_match(&symbol) {
        return Err(StockError::InvalidSymbol(symbol));
    }
    Ok(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::source::MockPriceSource;
    use chrono::NaiveDate;
    use forecast_core::{
        AdapterOutput, ModelAdapter, ModelKind, PricePoint, PriceSeries, WindowSet,
        business_days_after,
    };
    use mockall::predicate::eq;

    struct LastValue;

    impl ModelAdapter for LastValue {
        fn kind(&self) -> ModelKind {
            ModelKind::Statistical
        }

        fn run(&self, window: &WindowSet) -> forecast_core::Result<AdapterOutput> {
            let last = window.history_closes().last().copied().unwrap_or_default();
            let mut predicted = vec![last];
            predicted.extend(window.validation_closes().iter().take(window.validation.len() - 1));
            AdapterOutput::assemble(
                ModelKind::Statistical,
                window,
                predicted,
                &vec![last; window.horizon()],
            )
        }
    }

    fn service(mock: MockPriceSource) -> ForecastService {
        let forecaster = Forecaster::new(vec![Arc::new(LastValue)]).unwrap();
        ForecastService::new(Arc::new(mock), Arc::new(forecaster))
    }

    fn history(symbol: &str, days: usize) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let points = business_days_after(start, days)
            .into_iter()
            .enumerate()
            .map(|(i, d)| PricePoint::new(d, 20.0 + (i % 7) as f64))
            .collect();
        PriceSeries::new(symbol, points).unwrap()
    }

    #[tokio::test]
    async fn test_forecast_normalizes_symbol() {
        let mut mock = MockPriceSource::new();
        mock.expect_fetch_history()
            .with(eq("MSFT"))
            .times(1)
            .returning(|symbol| Ok(history(symbol, 300)));

        let report = service(mock)
            .forecast(" msft ", HorizonConfig::new(30, 5).unwrap())
            .await
            .unwrap();
        assert_eq!(report.symbol, "MSFT");
        assert_eq!(report.ensemble.points.len(), 5);
    }

    #[tokio::test]
    async fn test_empty_history_fails_fast() {
        let mut mock = MockPriceSource::new();
        mock.expect_fetch_history()
            .returning(|symbol| Ok(PriceSeries::empty(symbol)));

        let err = service(mock).forecast_default("ZZZZ").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SymbolNotFound);
    }

    #[tokio::test]
    async fn test_short_history_is_reported_as_such() {
        let mut mock = MockPriceSource::new();
        mock.expect_fetch_history()
            .returning(|symbol| Ok(history(symbol, 10)));

        let err = service(mock).forecast_default("NEW").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotEnoughHistory);
    }

    #[tokio::test]
    async fn test_invalid_symbol_never_reaches_source() {
        let mut mock = MockPriceSource::new();
        mock.expect_fetch_history().never();

        let err = service(mock).forecast_default("not a ticker!").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_symbol_pattern() {
        for ok in ["AAPL", "brk-b", "7203.T", "^GSPC", "EURUSD=X"] {
            assert!(normalize_symbol(ok).is_ok(), "{ok}");
        }
        for bad in ["", "   ", "A B", "DROP;TABLE", "WAYTOOLONGSYMBOLNAME"] {
            assert!(normalize_symbol(bad).is_err(), "{bad}");
        }
    }
}
