//! # Dispatcher Module
//!
//! Routes a parsed request to a handler by method and exact path.
//!
//! GET and POST each have their own [`RouteTable`]. A table holds exact-path
//! handlers plus one optional wildcard that catches every path without an exact
//! entry. Paths are compared verbatim: no normalisation, no query-string stripping,
//! no parameters.
//!
//! ```rust,ignore
//! use portfolio_server::dispatcher::{Dispatcher, HandlerResponse};
//! use std::sync::Arc;
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher
//!     .get("/portfolio", Arc::new(|_req| Ok(HandlerResponse::ok("text/html", b"hi".to_vec()))))
//!     .post_wildcard(Arc::new(|_req| Ok(bad_request())));
//! ```
//!
//! Handlers run inline on the connection's coroutine. A panic is caught at the
//! dispatch boundary and reported like a handler error, so one broken handler
//! cannot take down the worker that called it.

mod core;

pub use core::{Dispatcher, Handler, HandlerResponse, RouteTable};
