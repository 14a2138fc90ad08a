//! Statistical time-series model: auto-selected ARIMA

mod adapter;
pub mod arima;
pub mod auto;
pub mod diff;

pub use adapter::{StatisticalAdapter, StatisticalConfig};
pub use arima::{ArimaOrder, FittedArima, OrderLimits};
pub use auto::auto_arima;
