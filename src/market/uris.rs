use anyhow::{anyhow, Context, Result};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://cloud.iexapis.com/stable";

/// Builds IEX Cloud request URLs.
///
/// Symbols are pushed as path segments, so they are percent-encoded rather than
/// spliced into the path. The API token is always the last query pair.
#[derive(Debug, Clone)]
pub struct IexUris {
    base: Url,
    token: String,
}

impl IexUris {
    /// # Errors
    ///
    /// Fails if `base` is not an absolute URL that can carry a path.
    pub fn new(base: &str, token: impl Into<String>) -> Result<Self> {
        let base = Url::parse(base).with_context(|| format!("invalid IEX base URL '{base}'"))?;
        if base.cannot_be_a_base() {
            return Err(anyhow!("IEX base URL '{base}' cannot carry a path"));
        }
        Ok(Self {
            base,
            token: token.into(),
        })
    }

    fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("IEX base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
            pairs.append_pair("token", &self.token);
        }
        Ok(url)
    }

    pub fn symbols(&self) -> Result<Url> {
        self.endpoint(&["ref-data", "symbols"], &[])
    }

    pub fn quote(&self, symbol: &str) -> Result<Url> {
        self.endpoint(&["stock", symbol, "quote"], &[])
    }

    pub fn statistics(&self, symbol: &str) -> Result<Url> {
        self.endpoint(&["stock", symbol, "stats"], &[])
    }

    /// Five years of daily closing prices.
    pub fn chart(&self, symbol: &str) -> Result<Url> {
        self.endpoint(&["stock", symbol, "chart", "5y"], &[("chartCloseOnly", "true")])
    }
}
