//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use fixture_server::http::{HttpRequest, HttpResponse, RequestHandler};
use fixture_server::observability::logging;
use fixture_server::{Connection, ServerConfig};

/// What the handler saw for one request.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub target: String,
    pub body: Vec<u8>,
    pub secure: bool,
    pub thread: Option<String>,
}

/// Handler that records every callback and answers `200 OK` with the target.
#[derive(Clone, Default)]
pub struct RecordingHandler {
    pub accepts: Arc<AtomicUsize>,
    pub requests: Arc<Mutex<Vec<Recorded>>>,
}

impl RecordingHandler {
    pub fn accept_count(&self) -> usize {
        self.accepts.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

impl RequestHandler for RecordingHandler {
    fn on_accept(&self, _conn: &mut Connection) {
        self.accepts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_request(&self, conn: &mut Connection, request: &HttpRequest<'_>) -> HttpResponse {
        self.requests.lock().unwrap().push(Recorded {
            method: request.method().to_string(),
            target: request.target().to_string(),
            body: request.body().to_vec(),
            secure: conn.is_secure(),
            thread: std::thread::current().name().map(str::to_owned),
        });
        HttpResponse::ok(request.target().to_owned())
    }
}

/// Loopback config with a short poll timeout so stop is quick.
pub fn fast_config() -> ServerConfig {
    logging::init_for_tests();

    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.run_loop.poll_timeout_ms = 20;
    config
}

/// Blocking client that never reuses connections.
pub fn client() -> reqwest::blocking::Client {
    reqwest::blocking::Client::builder()
        .no_proxy()
        .pool_max_idle_per_host(0)
        .build()
        .unwrap()
}

/// Send raw bytes and read until the server closes the connection.
pub fn raw_exchange(addr: SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.write_all(request.as_bytes()).unwrap();
    let mut reply = Vec::new();
    stream.read_to_end(&mut reply).unwrap();
    String::from_utf8_lossy(&reply).into_owned()
}
