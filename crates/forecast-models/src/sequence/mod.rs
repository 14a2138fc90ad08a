//! Neural sequence model over a fixed lookback of returns

mod adapter;
pub mod network;

pub use adapter::{SequenceAdapter, SequenceConfig};
pub use network::{Network, TrainingConfig};
