//! Core abstractions for stock-forecast
//!
//! This crate owns everything that does not depend on a particular model
//! family or data provider:
//!
//! - [`PriceSeries`]: validated daily closing prices
//! - [`window`]: carving history into train / validation / forecast windows
//! - [`metrics`]: comparable accuracy statistics
//! - [`adapter`]: the contract every model implements, plus the shared
//!   walk-forward validation loop
//! - [`Forecaster`]: runs all adapters in parallel and merges their output
//!   into a [`ForecastReport`]
//!
//! # Example
//!
//! ```rust,ignore
//! use forecast_core::{Forecaster, HorizonConfig};
//!
//! let forecaster = Forecaster::new(adapters)?;
//! let report = forecaster.forecast(&series, HorizonConfig::default()).await?;
//! for point in &report.ensemble.points {
//!     println!("{} {:.2}", point.date, point.value);
//! }
//! ```

pub mod adapter;
pub mod config;
pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod result;
pub mod series;
pub mod window;

pub use adapter::{
    AdapterOutput, ForecastPoint, ForecastSeries, Interval, ModelAdapter, ModelKind,
    OneStepModel, ValidationResult, walk_forward,
};
pub use config::{
    FailurePolicy, ForecastConfig, HorizonConfig, MAX_FORECAST_DAYS, MAX_VALIDATION_DAYS,
};
pub use error::{AdapterError, ForecastError, Result};
pub use metrics::{ErrorMetrics, compute_errors};
pub use orchestrator::Forecaster;
pub use result::{
    ComparisonTable, EnsembleForecast, ForecastReport, ForecastRow, ForecastTable, ModelOutcome,
    ModelStatus,
};
pub use series::{PricePoint, PriceSeries};
pub use window::{WindowSet, business_days_after, compute_windows};
