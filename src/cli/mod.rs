//! # CLI Module
//!
//! Command-line entry point for the portfolio server.
//!
//! Every option can also be set through the environment variable named in its
//! help text. Logging and coroutine tuning are read from `PORTFOLIO_LOG_*` and
//! `PORTFOLIO_STACK_SIZE` / `PORTFOLIO_READ_SIZE` / `PORTFOLIO_READ_TIMEOUT_MS`.
//!
//! ```bash
//! portfolio-server --port 8080 --password-file resources/password.txt
//!
//! # Cached market data only, JSON logs
//! PORTFOLIO_LOG_FORMAT=json portfolio-server --site-root site
//! ```
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use portfolio_server::cli::{run, Cli};
//! use clap::Parser;
//!
//! run(Cli::parse())?;
//! ```

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{run, run_cli, Cli};
