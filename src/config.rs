//! Startup configuration: listening address and the shared secret.

use crate::server::request::{AuthCredentials, BASIC_AUTH};
use std::fmt;
use std::fs;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// The password that both the username and password of Basic credentials must equal.
#[derive(Clone, PartialEq, Eq)]
pub struct SharedSecret(String);

impl SharedSecret {
    /// Wrap a secret. Surrounding whitespace is removed; an empty secret is `None`.
    pub fn new(secret: &str) -> Option<Self> {
        let secret = secret.trim();
        if secret.is_empty() {
            None
        } else {
            Some(Self(secret.to_string()))
        }
    }

    /// `true` for `Basic` credentials whose username and password both equal the secret.
    #[must_use]
    pub fn matches(&self, credentials: &AuthCredentials) -> bool {
        credentials.scheme == BASIC_AUTH
            && credentials.username == self.0
            && credentials.password == self.0
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(<REDACTED>)")
    }
}

/// Read the shared secret from `path`.
///
/// A missing, unreadable or blank file is not fatal: the server still starts and
/// answers every connection with `503 Service Unavailable`.
pub fn load_shared_secret(path: &Path) -> Option<SharedSecret> {
    match fs::read_to_string(path) {
        Ok(contents) => {
            let secret = SharedSecret::new(&contents);
            if secret.is_none() {
                warn!(path = %path.display(), "Password file is empty");
            } else {
                info!(path = %path.display(), "Loaded shared secret");
            }
            secret
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not read password file");
            None
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    /// The bind address and port did not resolve to a socket address.
    InvalidAddress { address: String, source: io::Error },
    /// A path given on the command line is unusable.
    InvalidPath { path: PathBuf, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidAddress { address, source } => {
                write!(f, "invalid listen address '{address}': {source}")
            }
            ConfigError::InvalidPath { path, reason } => {
                write!(f, "invalid path '{}': {reason}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidAddress { source, .. } => Some(source),
            ConfigError::InvalidPath { .. } => None,
        }
    }
}

/// Settings frozen before the server starts listening.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub secret: Option<SharedSecret>,
}

impl ServerConfig {
    pub fn new(bind: impl Into<String>, port: u16, secret: Option<SharedSecret>) -> Self {
        Self {
            bind: bind.into(),
            port,
            secret,
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let address = format!("{}:{}", self.bind, self.port);
        let invalid = |source| ConfigError::InvalidAddress {
            address: address.clone(),
            source,
        };
        address
            .to_socket_addrs()
            .map_err(invalid)?
            .next()
            .ok_or_else(|| invalid(io::Error::new(io::ErrorKind::InvalidInput, "no address")))
    }
}
