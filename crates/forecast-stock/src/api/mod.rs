//! API clients for market data providers

pub mod lookup;
pub mod yahoo;

pub use lookup::{LookupOutcome, SymbolLookup, SymbolMatch};
pub use yahoo::YahooFinanceClient;
