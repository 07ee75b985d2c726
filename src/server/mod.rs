//! The HTTP layer: raw request parsing, the per-connection exchange, the guard
//! sequence, and the accept loop.

pub mod connection;
pub mod http_server;
pub mod request;
pub mod response;
pub mod service;

pub use connection::{Connection, Transport};
pub use http_server::{Server, ServerHandle};
pub use request::{parse_request, AuthCredentials, Method, Request};
pub use response::ResponseHead;
pub use service::{AppService, ErrorPages};
