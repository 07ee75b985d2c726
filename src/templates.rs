//! Page rendering with `minijinja`.
//!
//! Templates are loaded on first use from the site root:
//!
//! - `pages/portfolio.html`, `pages/research.html`, `pages/commonStocks.js`
//! - `errors/<code>.html`, served as-is, except `errors/500.html`, which is rendered
//!   with the failure message
//!
//! `.html` templates are HTML auto-escaped, so error messages and company names are
//! passed as plain text. Data destined for inline scripts goes through `tojson`.

use crate::market::{DataPoint, Statistics};
use crate::portfolio::{gain_or_loss, Holding};
use crate::server::ErrorPages;
use anyhow::{Context, Result};
use http::StatusCode;
use minijinja::{context, path_loader, Environment};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const PORTFOLIO_TEMPLATE: &str = "pages/portfolio.html";
pub const RESEARCH_TEMPLATE: &str = "pages/research.html";
pub const COMMON_STOCKS_TEMPLATE: &str = "pages/commonStocks.js";
pub const INTERNAL_ERROR_TEMPLATE: &str = "errors/500.html";
/// Directories under the site root holding templates rather than assets.
pub const TEMPLATE_DIRS: [&str; 2] = ["pages", "errors"];

/// One row of the holdings table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockRow {
    pub symbol: String,
    pub quantity: i64,
    /// Average price paid, two decimals.
    pub price: String,
    /// Percentage change against the latest quote, two decimals. `None` when no
    /// quote was available.
    pub gain_or_loss: Option<String>,
}

impl StockRow {
    pub fn new(holding: &Holding, latest_price: Option<f64>) -> Self {
        Self {
            symbol: holding.symbol.clone(),
            quantity: holding.quantity,
            price: format!("{:.2}", holding.price),
            gain_or_loss: latest_price
                .and_then(|latest| gain_or_loss(latest, holding.price))
                .map(|pct| format!("{pct:.2}")),
        }
    }
}

fn two_places(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}

/// Company statistics, formatted for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsView {
    pub symbol: String,
    pub company_name: String,
    pub pe_ratio: String,
    pub market_cap: String,
    pub week52_high: String,
    pub week52_low: String,
}

impl StatisticsView {
    pub fn new(symbol: &str, stats: &Statistics) -> Self {
        Self {
            symbol: symbol.to_string(),
            company_name: stats.company_name.clone(),
            pe_ratio: two_places(stats.pe_ratio),
            market_cap: stats
                .market_cap
                .map_or_else(|| "n/a".to_string(), |v| format!("{v:.0}")),
            week52_high: two_places(stats.week52_high),
            week52_low: two_places(stats.week52_low),
        }
    }
}

/// A chart point in the shape the charting script expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub y: f64,
}

impl From<&DataPoint> for ChartPoint {
    fn from(p: &DataPoint) -> Self {
        Self {
            label: p.date.clone(),
            y: p.close,
        }
    }
}

pub struct SiteRenderer {
    env: Environment<'static>,
    root: PathBuf,
}

impl SiteRenderer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let mut env = Environment::new();
        env.set_loader(path_loader(&root));
        Self { env, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String> {
        let template = self
            .env
            .get_template(name)
            .with_context(|| format!("failed to load template '{name}'"))?;
        template
            .render(ctx)
            .with_context(|| format!("failed to render template '{name}'"))
    }

    pub fn portfolio_page(&self, error: Option<&str>, rows: &[StockRow]) -> Result<String> {
        self.render(PORTFOLIO_TEMPLATE, context! { error, rows })
    }

    pub fn research_page(
        &self,
        error: Option<&str>,
        company: &str,
        points: &[ChartPoint],
        statistics: Option<&StatisticsView>,
    ) -> Result<String> {
        self.render(
            RESEARCH_TEMPLATE,
            context! { error, company, points, statistics },
        )
    }

    pub fn common_stocks_script(&self, symbols: &[String]) -> Result<String> {
        self.render(COMMON_STOCKS_TEMPLATE, context! { symbols })
    }

    /// The body for an error response. Never fails: if neither the status page nor
    /// the generic template can be produced, a minimal built-in page is returned.
    pub fn error_page(&self, status: StatusCode, message: Option<&str>) -> Vec<u8> {
        if status != StatusCode::INTERNAL_SERVER_ERROR {
            let path = self.root.join(format!("errors/{}.html", status.as_u16()));
            if let Ok(bytes) = fs::read(&path) {
                return bytes;
            }
        }

        let code = status.as_u16();
        let reason = status.canonical_reason().unwrap_or("Error");
        match self.render(INTERNAL_ERROR_TEMPLATE, context! { code, reason, message }) {
            Ok(page) => page.into_bytes(),
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Falling back to built-in error page");
                fallback_page(status, message).into_bytes()
            }
        }
    }
}

impl ErrorPages for SiteRenderer {
    fn error_page(&self, status: StatusCode, message: Option<&str>) -> Vec<u8> {
        SiteRenderer::error_page(self, status, message)
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn fallback_page(status: StatusCode, message: Option<&str>) -> String {
    let title = format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Error")
    );
    let detail = message
        .map(|m| format!("<p>{}</p>", escape_html(m)))
        .unwrap_or_default();
    format!(
        "<!DOCTYPE html>\n<html><head><title>{title}</title></head>\
         <body><h1>{title}</h1>{detail}</body></html>\n"
    )
}
