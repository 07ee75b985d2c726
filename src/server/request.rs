//! Raw HTTP/1.1 request parsing.
//!
//! [`parse_request`] turns the bytes of a single socket read into a [`Request`]. The
//! parser never fails: empty input, binary noise, or a request line without a path all
//! produce a request whose [`Request::is_well_formed`] is `false`, and callers answer
//! those with `400 Bad Request` instead of routing them.
//!
//! The body is whatever followed the blank line in that same read. When a
//! `Content-Length` header is present but nothing followed the blank line, the request
//! reports [`Request::pending_body_len`] and the connection performs exactly one more
//! read, installing the result with [`Request::set_body`].

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Header carrying Basic credentials.
pub const AUTHORIZATION: &str = "Authorization";
/// Header announcing the size of the body.
pub const CONTENT_LENGTH: &str = "Content-Length";
/// The only authentication scheme the server accepts.
pub const BASIC_AUTH: &str = "Basic";

const HEADER_SEP: char = ':';
const FORM_VAR_SEP: char = '&';
const NAME_VALUE_SEP: char = '=';

/// Request method, validated when the request line is parsed.
///
/// Anything other than `GET` or `POST` is kept verbatim in [`Method::Other`] so the
/// server can answer `405 Method Not Allowed` without consulting any route table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Other(String),
}

impl Method {
    /// Classify a request-line token. Matching is case-sensitive, as in HTTP.
    pub fn parse(token: &str) -> Self {
        match token {
            "GET" => Method::Get,
            "POST" => Method::Post,
            other => Method::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Other(token) => token,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credentials unpacked from an `Authorization` header.
///
/// Only ever produced whole: a header that does not decode into exactly a scheme, a
/// username and a password yields no credentials at all.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthCredentials {
    pub scheme: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for AuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthCredentials")
            .field("scheme", &self.scheme)
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RequestLine {
    method: Method,
    path: String,
}

/// A parsed HTTP request.
///
/// Created fresh for every connection. Apart from the one-time body completion
/// performed by the connection, it is not modified after parsing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Request {
    line: Option<RequestLine>,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl Request {
    /// `true` when the request line carried both a method and a path.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.line.is_some()
    }

    /// `true` when nothing usable was received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.is_well_formed()
    }

    /// The request method, or `None` for a request that is not well formed.
    pub fn method(&self) -> Option<&Method> {
        self.line.as_ref().map(|l| &l.method)
    }

    /// The request target exactly as sent, or `""` for a request that is not well formed.
    pub fn path(&self) -> &str {
        self.line.as_ref().map(|l| l.path.as_str()).unwrap_or("")
    }

    /// Look up a header. Names are case-sensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Replace the body with the bytes of a follow-up read.
    pub fn set_body(&mut self, body: Vec<u8>) {
        self.body = body;
    }

    #[must_use]
    pub fn has_authorization(&self) -> bool {
        self.headers.contains_key(AUTHORIZATION)
    }

    /// The `Content-Length` value. A value that is not a non-negative integer is
    /// treated as if the header were absent.
    pub fn content_length(&self) -> Option<usize> {
        self.header(CONTENT_LENGTH)
            .and_then(|v| v.trim().parse::<usize>().ok())
    }

    /// Number of body bytes still to be read, if the first read stopped at the blank
    /// line of a request that announced a body.
    pub fn pending_body_len(&self) -> Option<usize> {
        if self.body.is_empty() {
            self.content_length()
        } else {
            None
        }
    }

    /// Decode an `application/x-www-form-urlencoded` style body such as
    /// `symbol=QTRX&quantity=100&price=0.85`.
    ///
    /// Each assignment is split on its first `=`. A name is required, the value may be
    /// empty. Values are taken literally; no percent-decoding is applied.
    pub fn form_variables(&self) -> HashMap<String, String> {
        if self.body.is_empty() {
            return HashMap::new();
        }

        String::from_utf8_lossy(&self.body)
            .split(FORM_VAR_SEP)
            .filter_map(|assignment| {
                let (name, value) = assignment.split_once(NAME_VALUE_SEP)?;
                if name.is_empty() {
                    return None;
                }
                Some((name.to_string(), value.to_string()))
            })
            .collect()
    }

    /// Unpack the `Authorization` header into its scheme, username and password.
    ///
    /// Returns `None` when the header is absent or is not exactly
    /// `<scheme> <base64(username:password)>`.
    pub fn authorization(&self) -> Option<AuthCredentials> {
        let value = self.header(AUTHORIZATION)?;
        let tokens: Vec<&str> = value.split_whitespace().collect();
        let [scheme, encoded] = tokens.as_slice() else {
            return None;
        };

        let decoded = STANDARD.decode(encoded).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let parts: Vec<&str> = decoded.split(HEADER_SEP).collect();
        let [username, password] = parts.as_slice() else {
            return None;
        };

        Some(AuthCredentials {
            scheme: (*scheme).to_string(),
            username: (*username).to_string(),
            password: (*password).to_string(),
        })
    }
}

/// Parse the bytes of one read into a [`Request`].
///
/// Lines are split on `\r\n`, `\n` or `\r`. The first line must contain at least a
/// method and a path; header lines follow up to the first empty line, and every line
/// after that is appended to the body with its terminator removed.
pub fn parse_request(raw: &[u8]) -> Request {
    let lines = split_lines(raw);
    let Some((first, rest)) = lines.split_first() else {
        return Request::default();
    };

    let request_line = String::from_utf8_lossy(first);
    let mut tokens = request_line.split_whitespace();
    let (Some(method), Some(path)) = (tokens.next(), tokens.next()) else {
        debug!(bytes = raw.len(), "Unrecognised request line");
        return Request::default();
    };

    let mut request = Request {
        line: Some(RequestLine {
            method: Method::parse(method),
            path: path.to_string(),
        }),
        ..Request::default()
    };

    let mut in_body = false;
    for line in rest {
        if in_body {
            request.body.extend_from_slice(line);
        } else if line.is_empty() {
            in_body = true;
        } else {
            let text = String::from_utf8_lossy(line);
            // Everything after the first ':' is the value, so `Host: 127.0.0.1:8080`
            // keeps its port.
            let (key, value) = text.split_once(HEADER_SEP).unwrap_or((text.as_ref(), ""));
            request
                .headers
                .insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    debug!(
        header_count = request.headers.len(),
        body_bytes = request.body.len(),
        "Request parsed"
    );
    request
}

fn split_lines(raw: &[u8]) -> Vec<&[u8]> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < raw.len() {
        match raw[i] {
            b'\n' => {
                lines.push(&raw[start..i]);
                i += 1;
                start = i;
            }
            b'\r' => {
                lines.push(&raw[start..i]);
                i += if raw.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
                start = i;
            }
            _ => i += 1,
        }
    }
    if start < raw.len() {
        lines.push(&raw[start..]);
    }
    lines
}
