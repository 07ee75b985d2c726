use super::{is_listed, AdjustOutcome, Portfolio};
use crate::market::MarketData;
use anyhow::{anyhow, Result};
use may::sync::Mutex;
use std::path::{Path, PathBuf};
use tracing::info;

/// The portfolio file, shared by every connection.
///
/// Each adjustment is a load, adjust, save cycle on the file. The cycle runs
/// under a coroutine-aware mutex so concurrent POSTs cannot lose each other's
/// changes; reads take the same lock so they never see a half-written file.
pub struct PortfolioStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl PortfolioStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> Result<Portfolio> {
        let _guard = self.lock.lock().map_err(|_| anyhow!("portfolio lock poisoned"))?;
        Portfolio::load(&self.path)
    }

    /// Apply one buy or sell and persist it if it succeeded.
    ///
    /// A buy's symbol is looked up before the lock is taken, so a slow market
    /// data source never holds up readers.
    pub fn adjust(
        &self,
        symbol: &str,
        quantity: i64,
        price: f64,
        market: &dyn MarketData,
    ) -> Result<AdjustOutcome> {
        let listed = quantity > 0 && is_listed(market, symbol)?;

        let _guard = self.lock.lock().map_err(|_| anyhow!("portfolio lock poisoned"))?;
        let mut portfolio = Portfolio::load(&self.path)?;
        let outcome = portfolio.apply(symbol, quantity, price, listed);
        if outcome == AdjustOutcome::Ok {
            portfolio.save(&self.path)?;
            info!(symbol, quantity, holdings = portfolio.holdings().len(), "Portfolio updated");
        }
        Ok(outcome)
    }
}
