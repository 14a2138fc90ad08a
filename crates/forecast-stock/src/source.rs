//! The price-history seam between the forecast engine and data providers

use crate::error::Result;
use async_trait::async_trait;
use forecast_core::PriceSeries;
use std::sync::Arc;

/// Anything that can supply daily closing prices for a symbol
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Maximum available daily history for `symbol`
    ///
    /// Unknown symbols and empty histories are reported as
    /// [`forecast_core::ForecastError::NoData`].
    async fn fetch_history(&self, symbol: &str) -> Result<PriceSeries>;
}

#[async_trait]
impl<S: PriceSource + ?Sized> PriceSource for Arc<S> {
    async fn fetch_history(&self, symbol: &str) -> Result<PriceSeries> {
        (**self).fetch_history(symbol).await
    }
}
