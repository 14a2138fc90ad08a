//! Configuration for market data access

use crate::error::{Result, StockError};
use governor::Quota;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::Duration;

/// Yahoo's JSON search endpoint
pub const DEFAULT_LOOKUP_URL: &str = "https://query2.finance.yahoo.com/v1/finance/search";

/// Longest wait between two retries
pub const MAX_RETRY_BACKOFF: Duration = Duration::from_secs(60);

/// Configuration for fetching, caching and rate limiting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockConfig {
    /// How long fetched price histories stay cached
    pub cache_ttl_history: Duration,

    /// How long lookup results stay cached
    pub cache_ttl_lookup: Duration,

    /// Requests allowed per `rate_limit_period`
    pub rate_limit_requests: u32,

    /// Window the request allowance applies to
    pub rate_limit_period: Duration,

    /// Maximum number of retries for API calls
    pub max_retries: u32,

    /// Initial backoff duration for retries
    pub retry_backoff_base: Duration,

    /// Request timeout duration
    pub request_timeout: Duration,

    /// Candidates returned by a symbol lookup
    pub max_lookup_results: usize,

    /// Search endpoint used by the symbol lookup
    pub lookup_url: String,

    /// Sent with lookup requests; Yahoo rejects requests without one
    pub user_agent: String,
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            cache_ttl_history: Duration::from_secs(3600),
            cache_ttl_lookup: Duration::from_secs(24 * 3600),
            rate_limit_requests: 2,
            rate_limit_period: Duration::from_secs(5),
            max_retries: 3,
            retry_backoff_base: Duration::from_secs(1),
            request_timeout: Duration::from_secs(30),
            max_lookup_results: 10,
            lookup_url: DEFAULT_LOOKUP_URL.to_string(),
            user_agent: concat!("stock-forecast/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl StockConfig {
    /// Create a new configuration builder
    pub fn builder() -> StockConfigBuilder {
        StockConfigBuilder::default()
    }

    /// Override defaults from `STOCK_*` variables read through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secs = |key: &str| -> Result<Option<Duration>> {
            lookup(key)
                .map(|raw| {
                    raw.trim()
                        .parse::<u64>()
                        .map(Duration::from_secs)
                        .map_err(|_| StockError::ConfigError(format!("{key} is not a number: {raw}")))
                })
                .transpose()
        };

        let count = |key: &str| -> Result<Option<u32>> {
            lookup(key)
                .map(|raw| {
                    raw.trim()
                        .parse::<u32>()
                        .map_err(|_| StockError::ConfigError(format!("{key} is not a number: {raw}")))
                })
                .transpose()
        };

        let mut builder = Self::builder();
        if let Some(ttl) = secs("STOCK_CACHE_TTL_SECS")? {
            builder = builder.cache_ttl_history(ttl);
        }
        if let Some(timeout) = secs("STOCK_REQUEST_TIMEOUT_SECS")? {
            builder = builder.request_timeout(timeout);
        }
        let requests = count("STOCK_RATE_LIMIT_REQUESTS")?;
        let period = secs("STOCK_RATE_LIMIT_PERIOD_SECS")?;
        if requests.is_some() || period.is_some() {
            let requests = requests.unwrap_or(StockConfig::default().rate_limit_requests);
            builder = builder.rate_limit(requests, period);
        }
        if let Some(retries) = count("STOCK_MAX_RETRIES")? {
            builder = builder.max_retries(retries);
        }
        if let Some(url) = lookup("STOCK_LOOKUP_URL") {
            builder = builder.lookup_url(url.trim());
        }
        builder.build()
    }

    /// Load overrides from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.rate_limit_requests == 0 {
            return Err(StockError::ConfigError(
                "rate_limit_requests must be greater than 0".to_string(),
            ));
        }

        if self.rate_limit_period.is_zero() {
            return Err(StockError::ConfigError(
                "rate_limit_period must be greater than 0".to_string(),
            ));
        }

        if self.max_retries == 0 {
            return Err(StockError::ConfigError(
                "max_retries must be greater than 0".to_string(),
            ));
        }

        if self.max_lookup_results == 0 {
            return Err(StockError::ConfigError(
                "max_lookup_results must be greater than 0".to_string(),
            ));
        }

        url::Url::parse(&self.lookup_url)
            .map_err(|e| StockError::ConfigError(format!("lookup_url is not a URL: {e}")))?;

        Ok(())
    }

    /// `rate_limit_requests` per `rate_limit_period`, all available as a burst
    pub fn rate_quota(&self) -> Result<Quota> {
        let requests = NonZeroU32::new(self.rate_limit_requests).ok_or_else(|| {
            StockError::ConfigError("rate_limit_requests must be greater than 0".to_string())
        })?;
        let quota = Quota::with_period(self.rate_limit_period / requests.get()).ok_or_else(|| {
            StockError::ConfigError("rate_limit_period must be greater than 0".to_string())
        })?;
        Ok(quota.allow_burst(requests))
    }

    /// Exponential backoff before retry `attempt`, capped at
    /// [`MAX_RETRY_BACKOFF`]
    pub fn retry_backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.retry_backoff_base
            .saturating_mul(factor)
            .min(MAX_RETRY_BACKOFF)
    }
}

/// Builder for StockConfig, starting from the defaults
#[derive(Debug, Default)]
pub struct StockConfigBuilder {
    config: StockConfig,
}

impl StockConfigBuilder {
    /// Set cache TTL for price histories
    pub fn cache_ttl_history(mut self, duration: Duration) -> Self {
        self.config.cache_ttl_history = duration;
        self
    }

    /// Allow `requests` per `period` (period unchanged when `None`)
    pub fn rate_limit(mut self, requests: u32, period: Option<Duration>) -> Self {
        self.config.rate_limit_requests = requests;
        if let Some(period) = period {
            self.config.rate_limit_period = period;
        }
        self
    }

    /// Set maximum retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.config.request_timeout = duration;
        self
    }

    /// Point the symbol lookup at another endpoint
    pub fn lookup_url(mut self, url: impl Into<String>) -> Self {
        self.config.lookup_url = url.into();
        self
    }

    /// Validate and return the configuration
    pub fn build(self) -> Result<StockConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
