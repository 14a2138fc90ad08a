//! Yahoo Finance history client

use crate::config::StockConfig;
use crate::error::{Result, StockError};
use crate::source::PriceSource;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use forecast_core::{PricePoint, PriceSeries};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};
use yahoo_finance_api as yahoo;

/// Yahoo error texts that mean the symbol has no history
const NO_DATA_MARKERS: [&str; 5] = ["no data", "not found", "empty", "no quotes", "no result"];

/// One bar as returned by the provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawQuote {
    /// Unix seconds
    pub timestamp: i64,
    pub close: f64,
    pub adjclose: f64,
}

/// Yahoo Finance API client
#[derive(Debug, Clone, Default)]
pub struct YahooFinanceClient {
    config: Arc<StockConfig>,
}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client
    pub fn new(config: Arc<StockConfig>) -> Self {
        Self { config }
    }

    /// Daily bars for the full available range
    async fn fetch_quotes(&self, symbol: &str) -> Result<Vec<RawQuote>> {
        let provider = yahoo::YahooConnector::new()
            .map_err(|e| StockError::YahooFinanceError(e.to_string()))?;

        let response = provider
            .get_quote_range(symbol, "1d", "max")
            .await
            .map_err(|e| classify(symbol, &e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| classify(symbol, &e.to_string()))?;

        Ok(quotes
            .iter()
            .map(|q| RawQuote {
                timestamp: q.timestamp as i64,
                close: q.close,
                adjclose: q.adjclose,
            })
            .collect())
    }
}

#[async_trait]
impl PriceSource for YahooFinanceClient {
    async fn fetch_history(&self, symbol: &str) -> Result<PriceSeries> {
        let mut attempt = 0;
        let quotes = loop {
            match self.fetch_quotes(symbol).await {
                Ok(quotes) => break quotes,
                Err(err @ StockError::Forecast(_)) => return Err(err),
                Err(err) if attempt + 1 >= self.config.max_retries => return Err(err),
                Err(err) => {
                    let backoff = self.config.retry_backoff(attempt);
                    warn!(symbol, attempt, error = %err, ?backoff, "Yahoo request failed, retrying");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
            }
        };

        let series = build_series(symbol, &quotes)?;
        debug!(symbol, points = series.len(), "Fetched price history");
        Ok(series)
    }
}

/// Map a provider error to `NoData` when it means "nothing there"
fn classify(symbol: &str, message: &str) -> StockError {
    let lower = message.to_lowercase();
    if NO_DATA_MARKERS.iter().any(|marker| lower.contains(marker)) {
        StockError::no_data(symbol)
    } else {
        StockError::YahooFinanceError(message.to_string())
    }
}

/// One adjusted close per trading day, oldest first
///
/// Later bars for the same day replace earlier ones; bars without a usable
/// price are skipped. An empty result is `NoData`.
pub fn build_series(symbol: &str, quotes: &[RawQuote]) -> Result<PriceSeries> {
    let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for quote in quotes {
        let Some(timestamp) = DateTime::from_timestamp(quote.timestamp, 0) else {
            continue;
        };
        let price = if quote.adjclose.is_finite() && quote.adjclose > 0.0 {
            quote.adjclose
        } else {
            quote.close
        };
        if price.is_finite() && price > 0.0 {
            by_day.insert(timestamp.date_naive(), price);
        }
    }

    if by_day.is_empty() {
        return Err(StockError::no_data(symbol));
    }

    let points = by_day
        .into_iter()
        .map(|(date, close)| PricePoint::new(date, close))
        .collect();
    Ok(PriceSeries::new(symbol, points)?)
}
