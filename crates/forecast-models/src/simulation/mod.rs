//! Stochastic simulation: Metropolis-sampled innovations driving a
//! geometric diffusion

mod adapter;
pub mod sampler;

pub use adapter::{DiffusionParams, SimulationAdapter, SimulationConfig};
pub use sampler::{MetropolisSampler, SamplerConfig, StandardNormal, TargetDensity};
