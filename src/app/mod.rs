//! The portfolio website: form validation, page handlers and the route table.

mod forms;
mod handlers;

pub use forms::{parse_trade, research_symbol, FormError, TradeForm};
pub use handlers::{build_dispatcher, PortfolioSite, COMMON_STOCKS_PATH, PORTFOLIO_PATH, RESEARCH_PATH};
