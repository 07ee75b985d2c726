use crate::error::ServeError;
use crate::server::request::{Method, Request};
use crate::server::response::ResponseHead;
use std::any::Any;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error};

/// What a handler produces: a finished header block and an optional body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerResponse {
    pub head: ResponseHead,
    pub body: Option<Vec<u8>>,
}

impl HandlerResponse {
    pub fn new(head: ResponseHead, body: Option<Vec<u8>>) -> Self {
        Self { head, body }
    }

    /// `200 OK` with the given content type and body.
    pub fn ok(content_type: &str, body: Vec<u8>) -> Self {
        let head = ResponseHead::ok()
            .content_type(content_type)
            .content_length(body.len());
        Self::new(head, Some(body))
    }

    pub fn status(&self) -> http::StatusCode {
        self.head.status()
    }
}

/// A routed request handler.
///
/// Handlers are shared by every connection worker, so they must be `Send + Sync`.
/// An `Err` (or a panic) is answered with `500 Internal Server Error`.
pub type Handler = Arc<dyn Fn(&Request) -> anyhow::Result<HandlerResponse> + Send + Sync>;

/// Exact-path routes plus one fallback for everything else.
#[derive(Default, Clone)]
pub struct RouteTable {
    routes: HashMap<String, Handler>,
    wildcard: Option<Handler>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `path`. The first registration of a path wins; later
    /// ones are ignored.
    pub fn add(&mut self, path: &str, handler: Handler) {
        match self.routes.entry(path.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(handler);
            }
            Entry::Occupied(_) => debug!(path, "Route already registered, ignoring"),
        }
    }

    /// Register the fallback handler. The first registration wins.
    pub fn add_wildcard(&mut self, handler: Handler) {
        if self.wildcard.is_none() {
            self.wildcard = Some(handler);
        } else {
            debug!("Wildcard already registered, ignoring");
        }
    }

    /// Exact match first, then the wildcard.
    pub fn lookup(&self, path: &str) -> Option<&Handler> {
        self.routes.get(path).or(self.wildcard.as_ref())
    }

    /// Run the matching handler, or return `None` when nothing matches.
    pub fn dispatch(&self, request: &Request) -> Option<anyhow::Result<HandlerResponse>> {
        self.lookup(request.path()).map(|handler| handler(request))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty() && self.wildcard.is_none()
    }
}

/// Independent GET and POST route tables.
///
/// Built once before the server starts listening and shared read-only afterwards.
#[derive(Default, Clone)]
pub struct Dispatcher {
    get: RouteTable,
    post: RouteTable,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, path: &str, handler: Handler) -> &mut Self {
        self.get.add(path, handler);
        self
    }

    pub fn post(&mut self, path: &str, handler: Handler) -> &mut Self {
        self.post.add(path, handler);
        self
    }

    pub fn get_wildcard(&mut self, handler: Handler) -> &mut Self {
        self.get.add_wildcard(handler);
        self
    }

    pub fn post_wildcard(&mut self, handler: Handler) -> &mut Self {
        self.post.add_wildcard(handler);
        self
    }

    /// The table for `method`, or `None` for methods the server does not route.
    pub fn table(&self, method: &Method) -> Option<&RouteTable> {
        match method {
            Method::Get => Some(&self.get),
            Method::Post => Some(&self.post),
            Method::Other(_) => None,
        }
    }

    /// Route a well-formed request.
    ///
    /// A method other than GET or POST is rejected before any table is consulted.
    /// Handler errors and panics both surface as [`ServeError::Handler`].
    pub fn dispatch(&self, request: &Request) -> Result<HandlerResponse, ServeError> {
        let method = request.method().ok_or(ServeError::MalformedRequest)?;
        let table = self
            .table(method)
            .ok_or_else(|| ServeError::UnsupportedMethod(method.to_string()))?;

        let outcome = catch_unwind(AssertUnwindSafe(|| table.dispatch(request)));
        match outcome {
            Ok(None) => Err(ServeError::NotFound),
            Ok(Some(Ok(response))) => Ok(response),
            Ok(Some(Err(e))) => {
                error!(path = %request.path(), error = ?e, "Handler returned an error");
                Err(ServeError::Handler(format!("{e:#}")))
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(path = %request.path(), panic_message = %message, "Handler panicked");
                Err(ServeError::Handler(message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::request::parse_request;
    use crate::server::response::TEXT_HTML;
    use http::StatusCode;

    fn text(body: &'static str) -> Handler {
        Arc::new(move |_req: &Request| -> anyhow::Result<HandlerResponse> {
            Ok(HandlerResponse::ok(TEXT_HTML, body.as_bytes().to_vec()))
        })
    }

    fn body_of(result: Result<HandlerResponse, ServeError>) -> String {
        String::from_utf8(result.unwrap().body.unwrap()).unwrap()
    }

    #[test]
    fn test_first_registration_wins() {
        let mut table = RouteTable::new();
        table.add("/x", text("H1"));
        table.add("/x", text("H2"));
        let req = parse_request(b"GET /x HTTP/1.1\r\n\r\n");
        for _ in 0..3 {
            let res = table.dispatch(&req).unwrap().unwrap();
            assert_eq!(res.body.as_deref(), Some(b"H1".as_slice()));
        }
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_first_wildcard_wins() {
        let mut table = RouteTable::new();
        table.add_wildcard(text("W1"));
        table.add_wildcard(text("W2"));
        let req = parse_request(b"GET /anything HTTP/1.1\r\n\r\n");
        let res = table.dispatch(&req).unwrap().unwrap();
        assert_eq!(res.body.as_deref(), Some(b"W1".as_slice()));
    }

    #[test]
    fn test_exact_match_beats_wildcard() {
        let mut d = Dispatcher::new();
        d.get("/portfolio", text("portfolio")).get_wildcard(text("static"));
        let req = parse_request(b"GET /portfolio HTTP/1.1\r\n\r\n");
        assert_eq!(body_of(d.dispatch(&req)), "portfolio");
        let req = parse_request(b"GET /css/site.css HTTP/1.1\r\n\r\n");
        assert_eq!(body_of(d.dispatch(&req)), "static");
    }

    #[test]
    fn test_paths_match_verbatim() {
        let mut d = Dispatcher::new();
        d.get("/portfolio", text("portfolio"));
        let req = parse_request(b"GET /portfolio?x=1 HTTP/1.1\r\n\r\n");
        assert!(matches!(d.dispatch(&req), Err(ServeError::NotFound)));
    }

    #[test]
    fn test_no_handler_is_not_found() {
        let d = Dispatcher::new();
        let req = parse_request(b"GET /nope HTTP/1.1\r\n\r\n");
        assert!(matches!(d.dispatch(&req), Err(ServeError::NotFound)));
    }

    #[test]
    fn test_tables_are_independent() {
        let mut d = Dispatcher::new();
        d.get("/research", text("get"));
        d.post("/research", text("post"));
        let get = parse_request(b"GET /research HTTP/1.1\r\n\r\n");
        let post = parse_request(b"POST /research HTTP/1.1\r\n\r\n");
        assert_eq!(body_of(d.dispatch(&get)), "get");
        assert_eq!(body_of(d.dispatch(&post)), "post");

        let mut d = Dispatcher::new();
        d.get("/only-get", text("get"));
        let post = parse_request(b"POST /only-get HTTP/1.1\r\n\r\n");
        assert!(matches!(d.dispatch(&post), Err(ServeError::NotFound)));
    }

    #[test]
    fn test_other_method_never_consults_tables() {
        let called = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = Arc::clone(&called);
        let mut d = Dispatcher::new();
        d.get_wildcard(Arc::new(move |_req: &Request| -> anyhow::Result<HandlerResponse> {
            flag.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok(HandlerResponse::ok(TEXT_HTML, Vec::new()))
        }));
        let req = parse_request(b"PUT /portfolio HTTP/1.1\r\n\r\n");
        match d.dispatch(&req) {
            Err(ServeError::UnsupportedMethod(m)) => assert_eq!(m, "PUT"),
            _ => panic!("expected UnsupportedMethod"),
        }
        assert!(!called.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[test]
    fn test_handler_error_carries_message() {
        let mut d = Dispatcher::new();
        d.get(
            "/fail",
            Arc::new(|_req: &Request| -> anyhow::Result<HandlerResponse> {
                Err(anyhow::anyhow!("disk on fire"))
            }),
        );
        let req = parse_request(b"GET /fail HTTP/1.1\r\n\r\n");
        match d.dispatch(&req) {
            Err(ServeError::Handler(m)) => assert!(m.contains("disk on fire")),
            _ => panic!("expected Handler error"),
        }
    }

    #[test]
    fn test_handler_panic_is_caught() {
        let mut d = Dispatcher::new();
        d.get(
            "/panic",
            Arc::new(|_req: &Request| -> anyhow::Result<HandlerResponse> { panic!("kaboom") }),
        );
        let req = parse_request(b"GET /panic HTTP/1.1\r\n\r\n");
        let err = d.dispatch(&req).unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.page_message(), Some("kaboom"));
    }
}
