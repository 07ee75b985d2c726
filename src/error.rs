use http::StatusCode;
use std::fmt;
use std::io;

/// Everything that can stop a connection from getting a `200 OK`.
///
/// Each variant is recoverable at the granularity of one connection; none of them
/// reaches the accept loop. All but [`ServeError::Transport`] are answered with the
/// status from [`ServeError::status`] and a rendered error page.
#[derive(Debug)]
pub enum ServeError {
    /// Reading from or writing to the socket failed. The connection is closed
    /// without a response.
    Transport(io::Error),
    /// Nothing was received, or the request line could not be understood.
    MalformedRequest,
    /// The `Authorization` header is missing or does not carry the shared secret.
    Unauthorized,
    /// No route (and no wildcard) matched the request path.
    NotFound,
    /// The request used a method other than `GET` or `POST`.
    UnsupportedMethod(String),
    /// A routed handler returned an error or panicked.
    Handler(String),
    /// No shared secret was loaded at startup.
    NotConfigured,
}

impl ServeError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            ServeError::Transport(_) | ServeError::Handler(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServeError::MalformedRequest => StatusCode::BAD_REQUEST,
            ServeError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServeError::NotFound => StatusCode::NOT_FOUND,
            ServeError::UnsupportedMethod(_) => StatusCode::METHOD_NOT_ALLOWED,
            ServeError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Text embedded in the error page, if the page should carry one.
    pub fn page_message(&self) -> Option<&str> {
        match self {
            ServeError::Handler(message) => Some(message),
            _ => None,
        }
    }
}

impl fmt::Display for ServeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServeError::Transport(e) => write!(f, "transport error: {e}"),
            ServeError::MalformedRequest => f.write_str("empty or malformed request"),
            ServeError::Unauthorized => f.write_str("missing or invalid credentials"),
            ServeError::NotFound => f.write_str("no handler for request path"),
            ServeError::UnsupportedMethod(method) => {
                write!(f, "unsupported HTTP method '{method}'")
            }
            ServeError::Handler(message) => write!(f, "handler failed: {message}"),
            ServeError::NotConfigured => f.write_str("no shared secret configured"),
        }
    }
}

impl std::error::Error for ServeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServeError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ServeError {
    fn from(e: io::Error) -> Self {
        ServeError::Transport(e)
    }
}
