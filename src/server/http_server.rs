use super::connection::Connection;
use super::service::AppService;
use crate::runtime_config::RuntimeConfig;
use may::coroutine::JoinHandle;
use may::net::{TcpListener, TcpStream};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};

/// A bound listening socket plus everything a connection worker needs.
///
/// Binding is the only fatal step; once bound, the accept loop runs forever and
/// every per-connection failure stays inside that connection's coroutine.
pub struct Server {
    listener: TcpListener,
    service: Arc<AppService>,
    runtime: RuntimeConfig,
}

/// Handle to a running server
///
/// Provides methods for waiting until the server is ready, stopping it,
/// or joining the accept loop.
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ServerHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait for the server to be ready to accept connections
    ///
    /// Polls the server address by attempting TCP connections until successful.
    ///
    /// # Errors
    ///
    /// Returns `TimedOut` if the server doesn't become ready within ~250ms (50 attempts × 5ms).
    pub fn wait_ready(&self) -> io::Result<()> {
        for _ in 0..50 {
            if std::net::TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    /// Cancel the accept loop and wait for it to finish.
    ///
    /// Connections already accepted run to completion on their own coroutines.
    pub fn stop(self) {
        // SAFETY: may marks coroutine cancellation unsafe because the cancelled
        // coroutine unwinds at its next yield point. The accept loop holds no locks
        // and owns nothing but the listener, which is dropped by the unwind.
        #[allow(unsafe_code)]
        unsafe {
            self.handle.coroutine().cancel();
        }
        if self.handle.join().is_err() {
            info!(addr = %self.addr, "Accept loop cancelled");
        }
    }

    /// Block until the accept loop ends, which only happens if it is cancelled or
    /// panics.
    ///
    /// # Errors
    ///
    /// Returns the panic payload if the accept loop panicked.
    pub fn join(self) -> std::thread::Result<()> {
        self.handle.join()
    }
}

impl Server {
    /// Bind the listening socket.
    ///
    /// # Errors
    ///
    /// Returns an error if the port cannot be bound.
    pub fn bind(addr: SocketAddr, service: AppService, runtime: RuntimeConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        info!(addr = %listener.local_addr()?, "Listening");
        Ok(Self {
            listener,
            service: Arc::new(service),
            runtime,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections forever, one coroutine per connection.
    ///
    /// The loop never waits on a worker. Accept failures are logged and the loop
    /// carries on.
    pub fn listen(self) {
        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => self.spawn_worker(stream),
                Err(e) => warn!(error = %e, "Accept failed"),
            }
        }
    }

    fn spawn_worker(&self, stream: TcpStream) {
        let peer = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        if let Err(e) = stream.set_read_timeout(self.runtime.read_timeout) {
            error!(peer = %peer, error = %e, "Could not set read timeout");
        }

        let service = Arc::clone(&self.service);
        let read_size = self.runtime.read_size;
        may::go!(move || {
            service.serve(Connection::new(stream, peer, read_size));
        });
    }

    /// Run the accept loop on its own coroutine.
    ///
    /// # Errors
    ///
    /// Returns an error if the bound address cannot be read back.
    pub fn start(self) -> io::Result<ServerHandle> {
        let addr = self.local_addr()?;
        let handle = may::go!(move || self.listen());
        Ok(ServerHandle { addr, handle })
    }
}
