//! Cached, rate-limited access to any [`PriceSource`]

use crate::cache::{CacheKey, ResponseCache};
use crate::config::StockConfig;
use crate::error::Result;
use crate::source::PriceSource;
use async_trait::async_trait;
use forecast_core::PriceSeries;
use governor::RateLimiter;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use std::sync::Arc;
use tracing::debug;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Wraps a source with a history cache and a request rate limit
///
/// The cache policy: a history is kept for `cache_ttl_history` after a
/// successful fetch, a failed fetch is never remembered, and a hit answers
/// without waiting on the limiter. The rate policy: every miss takes one
/// cell from the `rate_limit_requests` per `rate_limit_period` quota.
pub struct ThrottledSource<S> {
    inner: S,
    cache: ResponseCache<PriceSeries>,
    rate_limiter: SharedRateLimiter,
}

impl<S: PriceSource> ThrottledSource<S> {
    pub fn new(inner: S, config: &StockConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            inner,
            cache: ResponseCache::new(config.cache_ttl_history),
            rate_limiter: Arc::new(RateLimiter::direct(config.rate_quota()?)),
        })
    }
}

#[async_trait]
impl<S: PriceSource> PriceSource for ThrottledSource<S> {
    async fn fetch_history(&self, symbol: &str) -> Result<PriceSeries> {
        let key = CacheKey::history(symbol);
        if let Some(series) = self.cache.lookup(&key).await {
            debug!(symbol, "History served from cache");
            return Ok(series);
        }

        self.rate_limiter.until_ready().await;
        debug!(symbol, "Rate limiter released history request");
        let series = self.inner.fetch_history(symbol).await?;
        self.cache.store(key, series.clone()).await;
        Ok(series)
    }
}
