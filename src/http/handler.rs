//! The request handler hook.
//!
//! A server variant is a `RequestHandler`: the plain variant is any handler
//! whose `on_accept` does nothing, the secure variant wraps one in
//! [`TlsHandler`] so every accepted connection is upgraded before its first
//! request is parsed.
//!
//! Both callbacks run on the run loop thread, one at a time. A handler that
//! blocks stalls every other connection on the server.

use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

use crate::config::TlsConfig;
use crate::error::TransportError;
use crate::http::request::HttpRequest;
use crate::http::response::HttpResponse;
use crate::net::connection::Connection;
use crate::net::tls::{load_tls_config, tls_config_from_pem};

/// Extension point invoked for each accepted connection and each request.
pub trait RequestHandler: Send + Sync + 'static {
    /// Called once per connection, before any bytes are parsed.
    fn on_accept(&self, _conn: &mut Connection) {}

    /// Called once per complete request.
    fn on_request(&self, conn: &mut Connection, request: &HttpRequest<'_>) -> HttpResponse;
}

/// Handler backed by a closure. Build one with [`handler_fn`].
pub struct FnHandler<F> {
    f: F,
}

/// Wrap a closure as a plain (non-TLS) request handler.
pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(&mut Connection, &HttpRequest<'_>) -> HttpResponse + Send + Sync + 'static,
{
    FnHandler { f }
}

impl<F> RequestHandler for FnHandler<F>
where
    F: Fn(&mut Connection, &HttpRequest<'_>) -> HttpResponse + Send + Sync + 'static,
{
    fn on_request(&self, conn: &mut Connection, request: &HttpRequest<'_>) -> HttpResponse {
        (self.f)(conn, request)
    }
}

/// Secure server variant: upgrades every accepted connection to TLS.
pub struct TlsHandler<H> {
    tls: RustlsConfig,
    inner: H,
}

impl<H: RequestHandler> TlsHandler<H> {
    pub fn new(tls: RustlsConfig, inner: H) -> Self {
        Self { tls, inner }
    }

    /// Load certificate and key from PEM files.
    pub fn from_pem_file(
        cert_path: impl AsRef<Path>,
        key_path: impl AsRef<Path>,
        inner: H,
    ) -> Result<Self, TransportError> {
        let tls = load_tls_config(cert_path.as_ref(), key_path.as_ref())?;
        Ok(Self::new(tls, inner))
    }

    pub fn from_pem(cert_pem: &[u8], key_pem: &[u8], inner: H) -> Result<Self, TransportError> {
        let tls = tls_config_from_pem(cert_pem, key_pem)?;
        Ok(Self::new(tls, inner))
    }

    /// Build from the listener's `[listener.tls]` section.
    pub fn from_config(config: &TlsConfig, inner: H) -> Result<Self, TransportError> {
        Self::from_pem_file(&config.cert_path, &config.key_path, inner)
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }
}

impl<H: RequestHandler> RequestHandler for TlsHandler<H> {
    fn on_accept(&self, conn: &mut Connection) {
        conn.upgrade_tls(self.tls.clone());
        self.inner.on_accept(conn);
    }

    fn on_request(&self, conn: &mut Connection, request: &HttpRequest<'_>) -> HttpResponse {
        self.inner.on_request(conn, request)
    }
}
