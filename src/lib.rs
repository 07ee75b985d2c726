//! # Portfolio Server
//!
//! A small HTTP/1.1 server for a single-user stock portfolio tracker, built on the
//! `may` coroutine runtime. Every connection carries exactly one request and is
//! served by its own coroutine, then closed.
//!
//! ## Overview
//!
//! The whole site sits behind HTTP Basic authentication against one shared
//! password: the username and the password must both equal it. The site itself
//! is a handful of pages that show the holdings, record buys and sells, and look
//! up company statistics and price history from IEX Cloud.
//!
//! ## Architecture
//!
//! - **[`server`]** - Raw request parsing, the per-connection exchange, the guard
//!   sequence and the accept loop
//! - **[`dispatcher`]** - Exact-path GET and POST route tables, each with a wildcard
//! - **[`app`]** - The site's handlers and form validation
//! - **[`templates`]** - Page and error-page rendering with `minijinja`
//! - **[`market`]** - Market data from IEX Cloud, with cached fallbacks
//! - **[`portfolio`]** - Holdings, buy/sell rules and the JSON store
//! - **[`static_files`]** - Traversal-safe asset serving
//! - **[`config`]**, **[`runtime_config`]**, **[`logging`]**, **[`cli`]** - Startup
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as Server<br/>(accept loop)
//!     participant Worker as Worker coroutine
//!     participant Service as AppService
//!     participant Dispatcher
//!     participant Handler
//!
//!     Client->>Server: TCP connect
//!     Server->>Worker: may::go!
//!     Worker->>Worker: read (and at most one more read for the body)
//!     Worker->>Service: route(request)
//!     Service->>Service: 503 / 400 / 401 guards
//!     Service->>Dispatcher: dispatch(request)
//!     Dispatcher->>Handler: exact path or wildcard
//!     Handler-->>Dispatcher: HandlerResponse
//!     Dispatcher-->>Service: response, 404, 405 or 500
//!     Service-->>Worker: HandlerResponse
//!     Worker->>Client: head + body
//!     Worker->>Worker: disconnect
//! ```
//!
//! ### Guard Order
//!
//! | Condition                               | Status |
//! |-----------------------------------------|--------|
//! | No password configured                  | 503    |
//! | Empty or unparseable request            | 400    |
//! | No `Authorization` header               | 401    |
//! | Wrong scheme, username or password      | 401    |
//! | GET/POST with no route                  | 404    |
//! | Any other method                        | 405    |
//! | Handler error or panic                  | 500    |
//!
//! ## Quick Start
//!
//! ```bash
//! echo "hunter2" > resources/password.txt
//! cargo run -- --port 8080
//! curl -u hunter2:hunter2 http://localhost:8080/portfolio
//! ```

pub mod app;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod ids;
pub mod logging;
pub mod market;
pub mod portfolio;
pub mod runtime_config;
pub mod server;
pub mod static_files;
pub mod templates;

pub use error::ServeError;
