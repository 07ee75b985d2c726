//! # Runtime Configuration Module
//!
//! Tuning knobs read from the environment once at startup.
//!
//! ## Environment Variables
//!
//! ### `PORTFOLIO_STACK_SIZE`
//!
//! Stack size for connection coroutines. Decimal (`262144`) or hexadecimal
//! (`0x40000`). Default: `0x40000` (256 KB). Template rendering and the market-data
//! client run on this stack, so it is larger than a bare echo server would need.
//!
//! ### `PORTFOLIO_READ_SIZE`
//!
//! Size in bytes of the first read on each connection, and the upper bound of the
//! optional second read. Default: `10240`.
//!
//! ### `PORTFOLIO_READ_TIMEOUT_MS`
//!
//! Deadline for each socket read. A read that times out closes the connection
//! without a response. Default: `30000`; `0` disables the deadline.
//!
//! ```bash
//! export PORTFOLIO_STACK_SIZE=0x80000
//! export PORTFOLIO_READ_TIMEOUT_MS=5000
//! portfolio-server --port 8080
//! ```

use std::env;
use std::time::Duration;

pub const DEFAULT_STACK_SIZE: usize = 0x40000;
pub const DEFAULT_READ_SIZE: usize = 10240;
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Stack size for coroutines in bytes.
    pub stack_size: usize,
    /// Bytes requested by the first read on a connection.
    pub read_size: usize,
    /// Per-read deadline; `None` waits forever.
    pub read_timeout: Option<Duration>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
            read_size: DEFAULT_READ_SIZE,
            read_timeout: Some(Duration::from_millis(DEFAULT_READ_TIMEOUT_MS)),
        }
    }
}

/// Parse `0x`-prefixed hexadecimal or plain decimal.
fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    match val.strip_prefix("0x").or_else(|| val.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => val.parse().ok(),
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables. Unparseable values fall back to
    /// the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let stack_size = lookup("PORTFOLIO_STACK_SIZE")
            .and_then(|v| parse_size(&v))
            .unwrap_or(defaults.stack_size);
        let read_size = lookup("PORTFOLIO_READ_SIZE")
            .and_then(|v| parse_size(&v))
            .filter(|&n| n > 0)
            .unwrap_or(defaults.read_size);
        let read_timeout = match lookup("PORTFOLIO_READ_TIMEOUT_MS").and_then(|v| v.trim().parse::<u64>().ok()) {
            Some(0) => None,
            Some(ms) => Some(Duration::from_millis(ms)),
            None => defaults.read_timeout,
        };
        RuntimeConfig {
            stack_size,
            read_size,
            read_timeout,
        }
    }
}
