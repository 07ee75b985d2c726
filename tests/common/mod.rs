#![allow(dead_code)]

pub mod test_server {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use portfolio_server::app::{build_dispatcher, PortfolioSite};
    use portfolio_server::config::SharedSecret;
    use portfolio_server::market::{DataPoint, MarketData, Quote, Statistics};
    use portfolio_server::portfolio::PortfolioStore;
    use portfolio_server::runtime_config::RuntimeConfig;
    use portfolio_server::server::{AppService, Server, ServerHandle};
    use portfolio_server::templates::SiteRenderer;
    use std::net::SocketAddr;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Once};

    /// Ensures May coroutines are configured only once
    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x40000);
        });
    }

    pub const SECRET: &str = "hunter2";

    /// Offline market data: a fixed set of symbols, all priced at 1.00.
    pub struct FakeMarket;

    const SYMBOLS: [&str; 3] = ["AAPL", "MSFT", "QTRX"];

    fn known(symbol: &str) -> bool {
        SYMBOLS.iter().any(|s| *s == symbol)
    }

    impl MarketData for FakeMarket {
        fn common_stock_symbols(&self) -> anyhow::Result<Vec<String>> {
            Ok(SYMBOLS.iter().map(|s| s.to_string()).collect())
        }

        fn quote(&self, symbol: &str) -> anyhow::Result<Option<Quote>> {
            Ok(known(symbol).then(|| Quote {
                symbol: Some(symbol.to_string()),
                latest_price: Some(1.0),
            }))
        }

        fn statistics(&self, symbol: &str) -> anyhow::Result<Option<Statistics>> {
            Ok(known(symbol).then(|| Statistics {
                symbol: Some(symbol.to_string()),
                company_name: format!("{symbol} Inc"),
                pe_ratio: Some(20.0),
                market_cap: Some(1.0e9),
                week52_high: Some(2.0),
                week52_low: Some(0.5),
            }))
        }

        fn chart(&self, _symbol: &str) -> anyhow::Result<Vec<DataPoint>> {
            Ok(vec![DataPoint {
                date: "2022-01-03".into(),
                close: 1.0,
            }])
        }
    }

    /// A running server on a loopback port with its own portfolio file.
    ///
    /// The accept loop is cancelled when the fixture is dropped.
    pub struct TestServer {
        handle: Option<ServerHandle>,
        pub addr: SocketAddr,
        pub portfolio_db: PathBuf,
        _dir: tempfile::TempDir,
    }

    impl TestServer {
        pub fn start(secret: Option<&str>) -> Self {
            Self::with_runtime(secret, RuntimeConfig::default())
        }

        pub fn with_runtime(secret: Option<&str>, runtime: RuntimeConfig) -> Self {
            setup_may_runtime();
            let dir = tempfile::tempdir().unwrap();
            let portfolio_db = dir.path().join("portfolio.json");

            let renderer = Arc::new(SiteRenderer::new(
                Path::new(env!("CARGO_MANIFEST_DIR")).join("site"),
            ));
            let site = Arc::new(PortfolioSite::new(
                Arc::clone(&renderer),
                Arc::new(FakeMarket),
                PortfolioStore::new(&portfolio_db),
            ));
            let service = AppService::new(
                secret.and_then(SharedSecret::new),
                build_dispatcher(site),
                renderer,
            );

            let server = Server::bind(
                "127.0.0.1:0".parse().unwrap(),
                service,
                runtime,
            )
            .unwrap();
            let handle = server.start().unwrap();
            handle.wait_ready().unwrap();
            let addr = handle.addr();

            Self {
                handle: Some(handle),
                addr,
                portfolio_db,
                _dir: dir,
            }
        }
    }

    impl Drop for TestServer {
        fn drop(&mut self) {
            if let Some(handle) = self.handle.take() {
                handle.stop();
            }
        }
    }

    pub fn basic_auth(user: &str, pass: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{user}:{pass}")))
    }
}

pub mod http {
    use std::io::{Read, Write};
    use std::net::{Shutdown, SocketAddr, TcpStream};
    use std::thread;
    use std::time::Duration;

    fn read_to_close(stream: &mut TcpStream) -> String {
        stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        let mut buf = Vec::new();
        loop {
            let mut tmp = [0u8; 4096];
            match stream.read(&mut tmp) {
                Ok(0) => break,
                Ok(n) => buf.extend_from_slice(&tmp[..n]),
                Err(ref e) if e.kind() == std::io::ErrorKind::ConnectionReset => break,
                Err(e) => panic!("read error: {e:?}"),
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Send raw bytes and read until the server closes the connection.
    pub fn send_request(addr: &SocketAddr, req: &[u8]) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(req).unwrap();
        read_to_close(&mut stream)
    }

    /// Send a partial request and keep the connection open, reading whatever the
    /// server sends before it closes.
    pub fn send_and_stall(addr: &SocketAddr, partial: &[u8]) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(partial).unwrap();
        read_to_close(&mut stream)
    }

    /// Connect, send nothing, and half-close.
    pub fn send_nothing(addr: &SocketAddr) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.shutdown(Shutdown::Write).unwrap();
        read_to_close(&mut stream)
    }

    /// Send `head`, pause so it arrives as its own segment, then send `body`.
    pub fn send_in_two_parts(addr: &SocketAddr, head: &[u8], body: &[u8]) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.set_nodelay(true).unwrap();
        stream.write_all(head).unwrap();
        thread::sleep(Duration::from_millis(100));
        stream.write_all(body).unwrap();
        read_to_close(&mut stream)
    }

    pub fn get(path: &str, auth: Option<&str>) -> Vec<u8> {
        let mut req = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\n");
        if let Some(auth) = auth {
            req.push_str(&format!("Authorization: {auth}\r\n"));
        }
        req.push_str("\r\n");
        req.into_bytes()
    }

    pub fn post(path: &str, auth: &str, body: &str) -> Vec<u8> {
        format!(
            "POST {path} HTTP/1.1\r\nHost: localhost\r\nAuthorization: {auth}\r\n\
             Content-Type: application/x-www-form-urlencoded\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        )
        .into_bytes()
    }

    /// Status code, header lines and body of a raw response.
    pub fn parse_response(resp: &str) -> (u16, Vec<(String, String)>, String) {
        let (head, body) = resp.split_once("\r\n\r\n").unwrap_or((resp, ""));
        let mut lines = head.split("\r\n");
        let status = lines
            .next()
            .and_then(|l| l.split_whitespace().nth(1))
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let headers = lines
            .filter_map(|l| l.split_once(':'))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();
        (status, headers, body.to_string())
    }

    pub fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
