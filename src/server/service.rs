use super::connection::{Connection, Transport};
use super::request::{Request, BASIC_AUTH};
use super::response::{ResponseHead, REALM, TEXT_HTML};
use crate::config::SharedSecret;
use crate::dispatcher::{Dispatcher, HandlerResponse};
use crate::error::ServeError;
use http::StatusCode;
use std::sync::Arc;
use tracing::{error, info, info_span, warn};

/// Renders the body of an error response.
pub trait ErrorPages: Send + Sync {
    /// Produce the page for `status`, embedding `message` when one is given.
    fn error_page(&self, status: StatusCode, message: Option<&str>) -> Vec<u8>;
}

/// The per-connection request pipeline: guards, dispatch, error pages.
///
/// Built once at startup and shared by every connection worker.
pub struct AppService {
    secret: Option<SharedSecret>,
    dispatcher: Dispatcher,
    error_pages: Arc<dyn ErrorPages>,
}

impl AppService {
    pub fn new(
        secret: Option<SharedSecret>,
        dispatcher: Dispatcher,
        error_pages: Arc<dyn ErrorPages>,
    ) -> Self {
        if secret.is_none() {
            warn!("No shared secret configured, every request will be answered with 503");
        }
        Self {
            secret,
            dispatcher,
            error_pages,
        }
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Run the guard sequence and dispatch a request that has already been read.
    ///
    /// The order is fixed: configured, well formed, credentials present, credentials
    /// valid, then routing.
    pub fn route(&self, request: &Request) -> Result<HandlerResponse, ServeError> {
        let secret = self.secret.as_ref().ok_or(ServeError::NotConfigured)?;

        if !request.is_well_formed() {
            return Err(ServeError::MalformedRequest);
        }
        if !request.has_authorization() {
            return Err(ServeError::Unauthorized);
        }
        match request.authorization() {
            Some(credentials) if secret.matches(&credentials) => {}
            _ => return Err(ServeError::Unauthorized),
        }

        self.dispatcher.dispatch(request)
    }

    /// [`AppService::route`], with every rejection turned into an error page.
    pub fn respond(&self, request: &Request) -> HandlerResponse {
        self.route(request).unwrap_or_else(|e| self.rejection(&e))
    }

    /// The response for a request that did not make it through the pipeline.
    pub fn rejection(&self, err: &ServeError) -> HandlerResponse {
        let status = err.status();
        match err {
            ServeError::Handler(_) | ServeError::Transport(_) => {
                error!(status = status.as_u16(), error = %err, "Request failed");
            }
            _ => info!(status = status.as_u16(), reason = %err, "Request rejected"),
        }

        let body = self.error_pages.error_page(status, err.page_message());
        let mut head = ResponseHead::new(status)
            .content_type(TEXT_HTML)
            .content_length(body.len());
        if status == StatusCode::UNAUTHORIZED {
            head = head.www_authenticate(BASIC_AUTH, REALM);
        }
        HandlerResponse::new(head, Some(body))
    }

    /// Serve one connection to completion and close it.
    ///
    /// Errors never escape: they are logged here and the socket is shut down.
    pub fn serve<T: Transport>(&self, mut conn: Connection<T>) {
        let span = info_span!("connection", connection_id = %conn.id(), peer = %conn.peer());
        let _enter = span.enter();

        if let Err(e) = self.exchange(&mut conn) {
            warn!(error = %e, "Connection closed without a complete response");
        }
        conn.disconnect();
    }

    fn exchange<T: Transport>(&self, conn: &mut Connection<T>) -> Result<(), ServeError> {
        let response = if self.is_configured() {
            let request = conn.read_request()?;
            self.respond(&request)
        } else {
            // Drain the request so the client reads the 503 instead of a reset.
            conn.discard_input()?;
            self.rejection(&ServeError::NotConfigured)
        };

        info!(status = response.status().as_u16(), "Sending response");
        conn.write_response(response.head.as_str(), response.body.as_deref())
    }
}
