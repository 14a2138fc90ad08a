//! Model adapters for stock-forecast
//!
//! Three independent model families, each behind
//! [`forecast_core::ModelAdapter`]:
//!
//! - [`statistical`]: ARIMA with the order picked by AIC
//! - [`sequence`]: a small feed-forward network over a lookback of returns
//! - [`simulation`]: geometric Brownian motion driven by Metropolis draws
//!
//! All numerics are self-contained and seeded, so a run over the same
//! history reproduces the same forecast.

pub mod error;
pub mod linalg;
pub mod sequence;
pub mod simulation;
pub mod statistical;

pub use error::{ModelError, Result};
pub use sequence::{SequenceAdapter, SequenceConfig};
pub use simulation::{SimulationAdapter, SimulationConfig};
pub use statistical::{StatisticalAdapter, StatisticalConfig};

use forecast_core::{ForecastError, ModelAdapter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Settings for the standard three-model line-up
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelsConfig {
    pub statistical: StatisticalConfig,
    pub sequence: SequenceConfig,
    pub simulation: SimulationConfig,
}

/// Statistical, sequence and simulation adapters with `config`
pub fn adapters(
    config: &ModelsConfig,
) -> std::result::Result<Vec<Arc<dyn ModelAdapter>>, ForecastError> {
    Ok(vec![
        Arc::new(StatisticalAdapter::new(config.statistical)),
        Arc::new(SequenceAdapter::new(config.sequence)),
        Arc::new(SimulationAdapter::new(config.simulation)?),
    ])
}

/// The three adapters with default settings
pub fn default_adapters() -> std::result::Result<Vec<Arc<dyn ModelAdapter>>, ForecastError> {
    adapters(&ModelsConfig::default())
}
