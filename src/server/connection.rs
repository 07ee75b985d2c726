//! One accepted socket, from first read to close.
//!
//! A [`Connection`] performs at most two reads: the first captures the request head
//! (and usually the body), the second is issued only when the head announced a
//! `Content-Length` but no body bytes arrived with it. There is no keep-alive; the
//! socket is shut down after one response, or when the connection is dropped.

use super::request::{parse_request, Request};
use crate::error::ServeError;
use crate::ids::ConnectionId;
use std::io::{self, Read, Write};
use std::net::Shutdown;
use tracing::{debug, info};

use super::response::LINE_ENDING;

/// A byte stream that can be closed in both directions.
pub trait Transport: Read + Write {
    fn close(&mut self) -> io::Result<()>;
}

impl Transport for may::net::TcpStream {
    fn close(&mut self) -> io::Result<()> {
        self.shutdown(Shutdown::Both)
    }
}

pub struct Connection<T: Transport> {
    id: ConnectionId,
    peer: String,
    stream: T,
    read_size: usize,
    open: bool,
}

impl<T: Transport> Connection<T> {
    pub fn new(stream: T, peer: impl Into<String>, read_size: usize) -> Self {
        let id = ConnectionId::new();
        let peer = peer.into();
        info!(connection_id = %id, peer = %peer, "Connected");
        Self {
            id,
            peer,
            stream,
            read_size: read_size.max(1),
            open: true,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub fn get_ref(&self) -> &T {
        &self.stream
    }

    fn read_chunk(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        let n = self.stream.read(&mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }

    /// Read and parse the request.
    ///
    /// When the first read ends at the blank line of a request with a
    /// `Content-Length`, one more read of up to that many bytes (bounded by the read
    /// size) supplies the body. Whatever that read returns becomes the body, even if
    /// it is shorter than announced.
    pub fn read_request(&mut self) -> Result<Request, ServeError> {
        let raw = self.read_chunk(self.read_size)?;
        debug!(bytes = raw.len(), "Read request bytes");
        let mut request = parse_request(&raw);

        if let Some(pending) = request.pending_body_len().filter(|&n| n > 0) {
            let want = pending.min(self.read_size);
            let body = self.read_chunk(want)?;
            debug!(
                announced = pending,
                received = body.len(),
                "Read request body in a second read"
            );
            request.set_body(body);
        }

        if let Some(method) = request.method() {
            info!(method = %method, path = %request.path(), "Request received");
        }
        Ok(request)
    }

    /// Consume one read without interpreting it.
    pub fn discard_input(&mut self) -> Result<(), ServeError> {
        let raw = self.read_chunk(self.read_size)?;
        debug!(bytes = raw.len(), "Discarded request bytes");
        Ok(())
    }

    /// Write a response head, the blank line that ends it, then the body if any.
    ///
    /// `head` must already carry `\r\n` after every line.
    pub fn write_response(&mut self, head: &str, body: Option<&[u8]>) -> Result<(), ServeError> {
        self.stream.write_all(head.as_bytes())?;
        self.stream.write_all(LINE_ENDING.as_bytes())?;
        if let Some(body) = body.filter(|b| !b.is_empty()) {
            self.stream.write_all(body)?;
        }
        self.stream.flush()?;
        Ok(())
    }

    /// Shut the socket down. Safe to call more than once.
    pub fn disconnect(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        if let Err(e) = self.stream.close() {
            // The peer may already have reset the socket.
            debug!(error = %e, "Socket shutdown failed");
        }
        info!(connection_id = %self.id, peer = %self.peer, "Disconnected");
    }
}

impl<T: Transport> Drop for Connection<T> {
    fn drop(&mut self) {
        self.disconnect();
    }
}
