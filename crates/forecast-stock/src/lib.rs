//! Market data and the forecast service for stock-forecast
//!
//! - [`PriceSource`]: the seam the forecast engine reads history through
//! - [`YahooFinanceClient`]: daily adjusted closes from Yahoo Finance
//! - [`ThrottledSource`]: cache and rate limit around any source
//! - [`SymbolLookup`]: company name to ticker candidates
//! - [`ForecastService`]: symbol in, [`forecast_core::ForecastReport`] out,
//!   with errors classified for end users
//!
//! # Example
//!
//! ```rust,ignore
//! use forecast_core::{ForecastConfig, HorizonConfig};
//! use forecast_stock::{ForecastService, StockConfig};
//!
//! let service = ForecastService::from_config(&StockConfig::default(), ForecastConfig::default())?;
//! let report = service.forecast("AAPL", HorizonConfig::default()).await?;
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod service;
pub mod session;
pub mod source;

pub use api::{LookupOutcome, SymbolLookup, SymbolMatch, YahooFinanceClient};
pub use cache::{CacheKey, ResponseCache};
pub use config::StockConfig;
pub use error::{ErrorKind, Result, StockError};
pub use service::ForecastService;
pub use session::ThrottledSource;
pub use source::PriceSource;
