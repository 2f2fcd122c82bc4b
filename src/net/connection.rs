//! Per-connection handle passed to request handlers.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Carry addresses and the per-connection context slot
//! - Record a handler's request to upgrade the stream to TLS
//!
//! The transport owns every `Connection`. Handlers only see `&mut Connection`
//! for the duration of a callback.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::http::Extensions;
use axum_server::tls_rustls::RustlsConfig;

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// An accepted client connection.
pub struct Connection {
    id: ConnectionId,
    peer_addr: SocketAddr,
    local_addr: SocketAddr,
    tls_upgrade: Option<RustlsConfig>,
    secure: bool,
    extensions: Extensions,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("peer_addr", &self.peer_addr)
            .field("local_addr", &self.local_addr)
            .field("tls_upgrade_pending", &self.tls_upgrade.is_some())
            .field("secure", &self.secure)
            .finish_non_exhaustive()
    }
}

impl Connection {
    pub fn new(peer_addr: SocketAddr, local_addr: SocketAddr) -> Self {
        Self {
            id: ConnectionId::new(),
            peer_addr,
            local_addr,
            tls_upgrade: None,
            secure: false,
            extensions: Extensions::new(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Ask the transport to run a TLS handshake before parsing any request.
    ///
    /// Only meaningful from `RequestHandler::on_accept`; later calls are ignored
    /// because the stream is already being read as plain HTTP.
    pub fn upgrade_tls(&mut self, config: RustlsConfig) {
        self.tls_upgrade = Some(config);
    }

    /// Take the pending upgrade, if a handler requested one.
    pub fn take_tls_upgrade(&mut self) -> Option<RustlsConfig> {
        self.tls_upgrade.take()
    }

    /// Whether the stream completed a TLS handshake.
    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn mark_secure(&mut self) {
        self.secure = true;
    }

    /// Handler-owned context attached to this connection.
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn connection_id_unique() {
        let id1 = ConnectionId::new();
        let id2 = ConnectionId::new();
        assert_ne!(id1, id2);
        assert!(id2.as_u64() > id1.as_u64());
    }

    #[test]
    fn connection_id_display() {
        let id = ConnectionId(7);
        assert_eq!(id.to_string(), "conn-7");
    }

    #[test]
    fn context_slot_round_trip() {
        #[derive(Clone, Debug, PartialEq)]
        struct Session(&'static str);

        let mut conn = Connection::new(addr(50000), addr(8080));
        assert!(conn.extensions().get::<Session>().is_none());

        conn.extensions_mut().insert(Session("abc"));
        assert_eq!(conn.extensions().get::<Session>(), Some(&Session("abc")));
        assert_eq!(conn.peer_addr(), addr(50000));
        assert_eq!(conn.local_addr(), addr(8080));
        assert!(!conn.is_secure());
    }
}
