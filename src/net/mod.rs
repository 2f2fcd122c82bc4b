//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → http_transport.rs (accept on the run loop thread)
//!     → Accept event → handler may request a TLS upgrade
//!     → tls.rs (optional TLS handshake)
//!     → hyper HTTP/1.1 connection task (request / chunk / write events)
//!     → connection.rs (handle + context slot seen by handlers)
//!
//! Connection States:
//!     Accepted → [Handshaking] → Serving → Closed
//! ```
//!
//! # Design Decisions
//! - One thread, one current-thread runtime: connections never run in parallel
//! - Transports are built on the run loop thread, so they need not be `Send`
//! - TLS is optional and chosen per connection by the handler

pub mod connection;
pub mod http_transport;
pub mod tls;
pub mod transport;

pub use connection::{Connection, ConnectionId};
pub use http_transport::HttpTransport;
pub use transport::{Transport, TransportEvent};
