//! The stock portfolio: holdings persisted as a JSON array, and the buy/sell rules.

mod math;
mod store;

pub use math::{gain_or_loss, weighted_average_price};
pub use store::PortfolioStore;

use crate::market::MarketData;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

/// Shares of one stock and the average price paid per share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub quantity: i64,
    pub price: f64,
}

/// Whether `market` has statistics for `symbol`, which is how a buy decides the
/// symbol exists.
///
/// # Errors
///
/// Fails if the market data source cannot be reached.
pub fn is_listed(market: &dyn MarketData, symbol: &str) -> Result<bool> {
    Ok(market.statistics(&symbol.to_uppercase())?.is_some())
}

/// Result of [`Portfolio::adjust`]. Only `Ok` changes the portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustOutcome {
    Ok,
    /// Buying a symbol the market data source does not know.
    SymbolNotFound,
    /// Selling a symbol that is not held.
    NotOwned,
    /// Selling more shares than are held.
    NotEnoughStock,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Portfolio {
    holdings: Vec<Holding>,
}

impl Portfolio {
    pub fn new(holdings: Vec<Holding>) -> Self {
        Self { holdings }
    }

    /// Read holdings from `path`. A missing or empty file is an empty portfolio.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not a JSON array of holdings.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read portfolio '{}'", path.display()))
            }
        };
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let holdings = serde_json::from_str(&text)
            .with_context(|| format!("portfolio '{}' is not valid JSON", path.display()))?;
        Ok(Self { holdings })
    }

    /// Write holdings to `path` as an indented JSON array, creating parent
    /// directories as needed. An empty portfolio is written as `[]`.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create '{}'", parent.display()))?;
        }
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.holdings
            .serialize(&mut ser)
            .context("failed to serialize portfolio")?;
        fs::write(path, out).with_context(|| format!("failed to write portfolio '{}'", path.display()))
    }

    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    fn position(&self, symbol: &str) -> Option<usize> {
        self.holdings
            .iter()
            .position(|h| h.symbol.eq_ignore_ascii_case(symbol))
    }

    pub fn get(&self, symbol: &str) -> Option<&Holding> {
        self.position(symbol).map(|i| &self.holdings[i])
    }

    /// Buy (`quantity > 0`) or sell (`quantity < 0`) shares of `symbol`.
    ///
    /// Buying asks `market` whether the symbol exists, then defers to [`apply`].
    ///
    /// # Errors
    ///
    /// Only market data failures are errors; rule violations are outcomes.
    ///
    /// [`apply`]: Portfolio::apply
    pub fn adjust(
        &mut self,
        symbol: &str,
        quantity: i64,
        price: f64,
        market: &dyn MarketData,
    ) -> Result<AdjustOutcome> {
        let listed = quantity > 0 && is_listed(market, symbol)?;
        Ok(self.apply(symbol, quantity, price, listed))
    }

    /// Apply a trade whose symbol lookup has already been made.
    ///
    /// The symbol is upper-cased first. `listed` is only read for a buy; an
    /// unlisted buy is `SymbolNotFound`. A repeat purchase moves the price to the
    /// weighted average. Selling the whole holding removes it. A zero quantity
    /// changes nothing.
    pub fn apply(&mut self, symbol: &str, quantity: i64, price: f64, listed: bool) -> AdjustOutcome {
        let symbol = symbol.to_uppercase();
        let owned = self.position(&symbol);

        if quantity < 0 {
            let Some(index) = owned else {
                return AdjustOutcome::NotOwned;
            };
            return self.sell(index, quantity.unsigned_abs());
        }
        if quantity == 0 {
            return AdjustOutcome::Ok;
        }

        if !listed {
            debug!(symbol = %symbol, "Symbol not known to market data source");
            return AdjustOutcome::SymbolNotFound;
        }

        match owned {
            Some(index) => {
                let holding = &mut self.holdings[index];
                holding.price = weighted_average_price(holding.quantity, holding.price, quantity, price);
                holding.quantity = holding.quantity.saturating_add(quantity);
            }
            None => self.holdings.push(Holding {
                symbol,
                quantity,
                price,
            }),
        }
        AdjustOutcome::Ok
    }

    fn sell(&mut self, index: usize, quantity: u64) -> AdjustOutcome {
        let held = self.holdings[index].quantity.max(0).unsigned_abs();
        if quantity > held {
            return AdjustOutcome::NotEnoughStock;
        }
        if quantity == held {
            self.holdings.remove(index);
        } else {
            // quantity < held <= i64::MAX, so the cast is lossless
            self.holdings[index].quantity -= quantity as i64;
        }
        AdjustOutcome::Ok
    }
}
