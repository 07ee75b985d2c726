use super::types::{DataPoint, Quote, Statistics, SymbolRecord};
use super::uris::IexUris;
use super::MarketData;
use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Body IEX sends instead of data once the monthly message allowance is spent.
pub const CREDITS_EXHAUSTED: &str = "You have used all available credits for the month. \
    Please upgrade or purchase additional packages to access more data.";
/// Body IEX sends for a symbol it does not list. Compared case-insensitively.
pub const UNKNOWN_SYMBOL: &str = "unknown symbol";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Cached responses used when live data is unavailable.
#[derive(Debug, Clone, Copy)]
enum Fallback {
    Symbols,
    Quote,
    Statistics,
    DataPoints,
}

impl Fallback {
    fn file_name(self) -> &'static str {
        match self {
            Fallback::Symbols => "stock_symbols.json",
            Fallback::Quote => "stock_quote.json",
            Fallback::Statistics => "stock_statistics.json",
            Fallback::DataPoints => "stock_data_points.json",
        }
    }
}

/// [`MarketData`] backed by the IEX Cloud REST API.
///
/// Without an API token lookups are answered from the fallback directory. The
/// cached files describe a single company, named by the `symbol` field of the
/// cached statistics; any other symbol is unknown.
pub struct IexClient {
    uris: Option<IexUris>,
    http: reqwest::blocking::Client,
    fallback_dir: PathBuf,
}

impl IexClient {
    /// # Errors
    ///
    /// Fails on an unusable base URL or if the HTTP client cannot be built.
    pub fn new(base_url: &str, token: Option<&str>, fallback_dir: impl Into<PathBuf>) -> Result<Self> {
        let uris = match token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(token) => Some(IexUris::new(base_url, token)?),
            None => {
                warn!("No IEX token configured, serving cached market data only");
                None
            }
        };
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            uris,
            http,
            fallback_dir: fallback_dir.into(),
        })
    }

    pub fn fallback_dir(&self) -> &Path {
        &self.fallback_dir
    }

    fn load_fallback<T: DeserializeOwned>(&self, fallback: Fallback) -> Result<T> {
        let path = self.fallback_dir.join(fallback.file_name());
        debug!(path = %path.display(), "Using cached market data");
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read cached market data '{}'", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("invalid cached market data '{}'", path.display()))
    }

    /// Turn a response body into a value.
    ///
    /// The credits-exhausted notice swaps in cached data; the unknown-symbol notice
    /// is `None`; anything else must be JSON for `T`.
    fn interpret<T: DeserializeOwned>(&self, body: &str, fallback: Fallback) -> Result<Option<T>> {
        if body == CREDITS_EXHAUSTED {
            return self.load_fallback(fallback).map(Some);
        }
        if body.trim().eq_ignore_ascii_case(UNKNOWN_SYMBOL) {
            return Ok(None);
        }
        serde_json::from_str(body)
            .map(Some)
            .context("unexpected response from market data service")
    }

    /// Whether the cached data is about `symbol`.
    fn caches(&self, symbol: &str) -> Result<bool> {
        let stats: Statistics = self.load_fallback(Fallback::Statistics)?;
        Ok(stats
            .symbol
            .as_deref()
            .is_some_and(|cached| cached.eq_ignore_ascii_case(symbol)))
    }

    /// Answer from the fallback directory. Per-symbol lookups for anything but
    /// the cached company are `None`.
    fn offline<T: DeserializeOwned>(&self, fallback: Fallback, symbol: Option<&str>) -> Result<Option<T>> {
        if let Some(symbol) = symbol {
            if !self.caches(symbol)? {
                info!(symbol, "Symbol not in cached market data");
                return Ok(None);
            }
        }
        self.load_fallback(fallback).map(Some)
    }

    fn fetch<T: DeserializeOwned>(
        &self,
        url: Result<Url>,
        fallback: Fallback,
        symbol: Option<&str>,
    ) -> Result<Option<T>> {
        if self.uris.is_none() {
            return self.offline(fallback, symbol);
        }
        let url = url?;
        debug!(path = %url.path(), "IEX request");

        let response = self
            .http
            .get(url.clone())
            .send()
            .with_context(|| format!("request to {} failed", url.path()))?;
        let status = response.status();
        let body = response.text().context("failed to read IEX response body")?;

        self.interpret(&body, fallback).map_err(|e| {
            if status.is_success() {
                e
            } else {
                anyhow!("market data service answered {status} for {}", url.path())
            }
        })
    }

    fn uris(&self) -> Result<&IexUris> {
        self.uris
            .as_ref()
            .ok_or_else(|| anyhow!("no IEX token configured"))
    }
}

impl MarketData for IexClient {
    fn common_stock_symbols(&self) -> Result<Vec<String>> {
        let records: Vec<SymbolRecord> = self
            .fetch(self.uris().and_then(IexUris::symbols), Fallback::Symbols, None)?
            .unwrap_or_default();
        Ok(records
            .into_iter()
            .filter(SymbolRecord::is_common_stock)
            .map(|r| r.symbol)
            .collect())
    }

    fn quote(&self, symbol: &str) -> Result<Option<Quote>> {
        self.fetch(self.uris().and_then(|u| u.quote(symbol)), Fallback::Quote, Some(symbol))
    }

    fn statistics(&self, symbol: &str) -> Result<Option<Statistics>> {
        self.fetch(self.uris().and_then(|u| u.statistics(symbol)), Fallback::Statistics, Some(symbol))
    }

    fn chart(&self, symbol: &str) -> Result<Vec<DataPoint>> {
        Ok(self
            .fetch(self.uris().and_then(|u| u.chart(symbol)), Fallback::DataPoints, Some(symbol))?
            .unwrap_or_default())
    }
}
