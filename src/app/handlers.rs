use super::forms::{parse_trade, research_symbol};
use crate::dispatcher::{Dispatcher, Handler, HandlerResponse};
use crate::market::MarketData;
use crate::portfolio::{AdjustOutcome, PortfolioStore};
use crate::server::request::Request;
use crate::server::response::{ResponseHead, TEXT_HTML, TEXT_JAVASCRIPT};
use crate::static_files::StaticFiles;
use crate::templates::{ChartPoint, SiteRenderer, StatisticsView, StockRow, TEMPLATE_DIRS};
use anyhow::{Context, Result};
use http::StatusCode;
use std::io;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const PORTFOLIO_PATH: &str = "/portfolio";
pub const RESEARCH_PATH: &str = "/research";
pub const COMMON_STOCKS_PATH: &str = "/pages/commonStocks.js";

/// Everything the site's handlers share: templates, market data, the portfolio
/// file and the static assets under the site root.
pub struct PortfolioSite {
    renderer: Arc<SiteRenderer>,
    market: Arc<dyn MarketData>,
    store: PortfolioStore,
    assets: StaticFiles,
}

fn html(page: String) -> HandlerResponse {
    HandlerResponse::ok(TEXT_HTML, page.into_bytes())
}

impl PortfolioSite {
    pub fn new(renderer: Arc<SiteRenderer>, market: Arc<dyn MarketData>, store: PortfolioStore) -> Self {
        let assets = TEMPLATE_DIRS
            .iter()
            .fold(StaticFiles::new(renderer.root()), |assets, dir| assets.hide(*dir));
        Self {
            renderer,
            market,
            store,
            assets,
        }
    }

    pub fn store(&self) -> &PortfolioStore {
        &self.store
    }

    fn error_response(&self, status: StatusCode) -> HandlerResponse {
        let body = self.renderer.error_page(status, None);
        let head = ResponseHead::new(status)
            .content_type(TEXT_HTML)
            .content_length(body.len());
        HandlerResponse::new(head, Some(body))
    }

    /// The latest price for `symbol`. A failed lookup leaves the gain column blank
    /// instead of failing the whole page.
    fn latest_price(&self, symbol: &str) -> Option<f64> {
        match self.market.quote(symbol) {
            Ok(quote) => quote.and_then(|q| q.latest_price),
            Err(e) => {
                warn!(symbol, error = %format!("{e:#}"), "Quote lookup failed");
                None
            }
        }
    }

    fn portfolio_page(&self, error: Option<&str>) -> Result<HandlerResponse> {
        let portfolio = self.store.snapshot()?;
        let rows: Vec<StockRow> = portfolio
            .holdings()
            .iter()
            .map(|h| StockRow::new(h, self.latest_price(&h.symbol)))
            .collect();
        self.renderer.portfolio_page(error, &rows).map(html)
    }

    pub fn show_portfolio(&self, _request: &Request) -> Result<HandlerResponse> {
        self.portfolio_page(None)
    }

    pub fn update_portfolio(&self, request: &Request) -> Result<HandlerResponse> {
        let form = request.form_variables();
        debug!(?form, "Portfolio form");

        let trade = match parse_trade(&form) {
            Ok(trade) => trade,
            Err(e) => return self.portfolio_page(Some(&e.to_string())),
        };

        let outcome = self
            .store
            .adjust(&trade.symbol, trade.quantity, trade.price, self.market.as_ref())
            .context("failed to update portfolio")?;
        info!(symbol = %trade.symbol, quantity = trade.quantity, ?outcome, "Trade processed");

        let message = match outcome {
            AdjustOutcome::Ok => None,
            AdjustOutcome::SymbolNotFound => {
                Some(format!("There is no stock symbol named {}", trade.symbol))
            }
            AdjustOutcome::NotOwned => Some(format!("You do not own any {} stock", trade.symbol)),
            AdjustOutcome::NotEnoughStock => {
                Some("You cannot sell more stock than you own (i.e. short selling)".to_string())
            }
        };
        self.portfolio_page(message.as_deref())
    }

    pub fn show_research(&self, _request: &Request) -> Result<HandlerResponse> {
        self.renderer.research_page(None, "", &[], None).map(html)
    }

    /// Statistics and five years of closing prices for the submitted symbol. The
    /// chart is only fetched once statistics confirm the symbol exists.
    pub fn update_research(&self, request: &Request) -> Result<HandlerResponse> {
        let form = request.form_variables();
        debug!(?form, "Research form");

        let Some(symbol) = research_symbol(&form) else {
            return self
                .renderer
                .research_page(Some("A symbol was not supplied. This field is required."), "", &[], None)
                .map(html);
        };

        let Some(stats) = self.market.statistics(&symbol)? else {
            let message = format!("No statistics were returned for symbol {symbol}.");
            return self.renderer.research_page(Some(&message), "", &[], None).map(html);
        };

        let points: Vec<ChartPoint> = self.market.chart(&symbol)?.iter().map(ChartPoint::from).collect();
        let view = StatisticsView::new(&symbol, &stats);
        self.renderer
            .research_page(None, &stats.company_name, &points, Some(&view))
            .map(html)
    }

    pub fn common_stocks(&self, _request: &Request) -> Result<HandlerResponse> {
        let symbols = self.market.common_stock_symbols()?;
        let script = self.renderer.common_stocks_script(&symbols)?;
        Ok(HandlerResponse::ok(TEXT_JAVASCRIPT, script.into_bytes()))
    }

    pub fn static_asset(&self, request: &Request) -> Result<HandlerResponse> {
        match self.assets.load(request.path()) {
            Ok((body, content_type)) => Ok(HandlerResponse::ok(content_type, body)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %request.path(), "No such asset");
                Ok(self.error_response(StatusCode::NOT_FOUND))
            }
            Err(e) => Err(e).with_context(|| format!("failed to read asset '{}'", request.path())),
        }
    }

    pub fn reject_post(&self, _request: &Request) -> Result<HandlerResponse> {
        Ok(self.error_response(StatusCode::BAD_REQUEST))
    }
}

fn route(site: &Arc<PortfolioSite>, f: fn(&PortfolioSite, &Request) -> Result<HandlerResponse>) -> Handler {
    let site = Arc::clone(site);
    Arc::new(move |request: &Request| f(site.as_ref(), request))
}

/// Register the site's routes.
pub fn build_dispatcher(site: Arc<PortfolioSite>) -> Dispatcher {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .get("/", route(&site, PortfolioSite::show_portfolio))
        .get(PORTFOLIO_PATH, route(&site, PortfolioSite::show_portfolio))
        .get(RESEARCH_PATH, route(&site, PortfolioSite::show_research))
        .get(COMMON_STOCKS_PATH, route(&site, PortfolioSite::common_stocks))
        .get_wildcard(route(&site, PortfolioSite::static_asset))
        .post(PORTFOLIO_PATH, route(&site, PortfolioSite::update_portfolio))
        .post(RESEARCH_PATH, route(&site, PortfolioSite::update_research))
        .post_wildcard(route(&site, PortfolioSite::reject_post));
    dispatcher
}
