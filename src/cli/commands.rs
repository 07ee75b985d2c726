use crate::app::{build_dispatcher, PortfolioSite};
use crate::config::{load_shared_secret, ConfigError, ServerConfig};
use crate::logging::{init_logging_with_config, LogConfig};
use crate::market::{IexClient, DEFAULT_BASE_URL};
use crate::portfolio::PortfolioStore;
use crate::runtime_config::RuntimeConfig;
use crate::server::{AppService, Server};
use crate::templates::SiteRenderer;
use anyhow::{anyhow, Context};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Password-protected stock portfolio web server
#[derive(Parser, Debug)]
#[command(name = "portfolio-server", version)]
#[command(about = "Stock portfolio tracker served over HTTP/1.1", long_about = None)]
pub struct Cli {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Address to bind the listening socket to
    #[arg(long, env = "PORTFOLIO_BIND", default_value = "0.0.0.0")]
    pub bind: String,

    /// File holding the shared password. Without it every request gets 503.
    #[arg(long, env = "PORTFOLIO_PASSWORD_FILE", default_value = "resources/password.txt")]
    pub password_file: PathBuf,

    /// Directory with the page templates, error pages and static assets
    #[arg(long, env = "PORTFOLIO_SITE_ROOT", default_value = "site")]
    pub site_root: PathBuf,

    /// JSON file the portfolio is stored in
    #[arg(long, env = "PORTFOLIO_DB", default_value = "data/portfolio.json")]
    pub portfolio_db: PathBuf,

    /// IEX Cloud API token. Without one, cached market data is served.
    #[arg(long, env = "IEX_TOKEN", hide_env_values = true)]
    pub iex_token: Option<String>,

    /// IEX Cloud API base URL
    #[arg(long, env = "IEX_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub iex_base_url: String,

    /// Directory of cached IEX responses used when live data is unavailable
    #[arg(long, env = "IEX_FALLBACK_DIR", default_value = "resources/exampleData")]
    pub iex_fallback_dir: PathBuf,
}

fn require_dir(path: &Path) -> Result<(), ConfigError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(ConfigError::InvalidPath {
            path: path.to_path_buf(),
            reason: "not a directory".to_string(),
        })
    }
}

/// Parse the command line and run the server.
///
/// # Errors
///
/// See [`run`].
pub fn run_cli() -> anyhow::Result<()> {
    run(Cli::parse())
}

/// Start the server described by `cli` and block on the accept loop.
///
/// # Errors
///
/// Returns an error if:
/// - logging cannot be initialised
/// - the site root is not a directory or the bind address does not resolve
/// - the HTTP client for market data cannot be built
/// - the listening socket cannot be bound
pub fn run(cli: Cli) -> anyhow::Result<()> {
    let _log_guard = init_logging_with_config(&LogConfig::from_env())?;

    let runtime = RuntimeConfig::from_env();
    may::config().set_stack_size(runtime.stack_size);
    info!(
        stack_size = runtime.stack_size,
        read_size = runtime.read_size,
        read_timeout_ms = runtime.read_timeout.map(|d| d.as_millis() as u64),
        "Runtime configured"
    );

    require_dir(&cli.site_root)?;
    let config = ServerConfig::new(cli.bind, cli.port, load_shared_secret(&cli.password_file));
    let addr = config.socket_addr()?;

    let renderer = Arc::new(SiteRenderer::new(&cli.site_root));
    let market = Arc::new(IexClient::new(
        &cli.iex_base_url,
        cli.iex_token.as_deref(),
        cli.iex_fallback_dir,
    )?);
    let store = PortfolioStore::new(cli.portfolio_db);
    info!(portfolio = %store.path().display(), site_root = %cli.site_root.display(), "Site configured");

    let site = Arc::new(PortfolioSite::new(Arc::clone(&renderer), market, store));
    let service = AppService::new(config.secret, build_dispatcher(site), renderer);

    let server = Server::bind(addr, service, runtime).with_context(|| format!("failed to bind {addr}"))?;
    let handle = server.start()?;
    handle
        .join()
        .map_err(|e| anyhow!("accept loop terminated: {e:?}"))
}
