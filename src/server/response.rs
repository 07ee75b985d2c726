use http::StatusCode;

pub const HTTP_VERSION: &str = "HTTP/1.1";
/// Terminates the status line, every header line, and the header block.
pub const LINE_ENDING: &str = "\r\n";
/// Realm announced in the `WWW-Authenticate` challenge.
pub const REALM: &str = "Portfolio";

pub const TEXT_HTML: &str = "text/html; charset=UTF-8";
pub const TEXT_JAVASCRIPT: &str = "text/javascript; charset=UTF-8";

fn status_reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown")
}

/// Status line plus header lines of a response, each terminated by `\r\n`.
///
/// The blank line that ends the header block is not included; the connection
/// writes it when the response is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    status: StatusCode,
    text: String,
}

impl ResponseHead {
    pub fn new(status: StatusCode) -> Self {
        let text = format!(
            "{HTTP_VERSION} {} {}{LINE_ENDING}",
            status.as_u16(),
            status_reason(status)
        );
        Self { status, text }
    }

    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    #[must_use]
    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.text.push_str(key);
        self.text.push_str(": ");
        self.text.push_str(value);
        self.text.push_str(LINE_ENDING);
        self
    }

    #[must_use]
    pub fn content_type(self, content_type: &str) -> Self {
        self.header("Content-Type", content_type)
    }

    #[must_use]
    pub fn content_length(self, len: usize) -> Self {
        self.header("Content-Length", &len.to_string())
    }

    #[must_use]
    pub fn www_authenticate(self, scheme: &str, realm: &str) -> Self {
        self.header("WWW-Authenticate", &format!("{scheme} realm='{realm}'"))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}
