//! Stock market data.
//!
//! Handlers depend on the [`MarketData`] trait; [`IexClient`] is the production
//! implementation backed by IEX Cloud.

mod client;
mod types;
mod uris;

pub use client::{IexClient, CREDITS_EXHAUSTED, UNKNOWN_SYMBOL};
pub use types::{DataPoint, Quote, Statistics, SymbolRecord};
pub use uris::{IexUris, DEFAULT_BASE_URL};

use anyhow::Result;

/// Source of quotes, company statistics and price history.
///
/// Lookups for a symbol the source does not know return `Ok(None)` (or an empty
/// series), not an error. Errors mean the source itself could not be reached or
/// returned something unreadable.
pub trait MarketData: Send + Sync {
    /// Symbols of every listed common stock.
    fn common_stock_symbols(&self) -> Result<Vec<String>>;

    fn quote(&self, symbol: &str) -> Result<Option<Quote>>;

    fn statistics(&self, symbol: &str) -> Result<Option<Statistics>>;

    /// Daily closing prices, oldest first.
    fn chart(&self, symbol: &str) -> Result<Vec<DataPoint>>;
}
