//! Embeddable HTTP server for driving client integration tests.
//!
//! `Server::start` blocks until the listener is bound and the run loop is
//! polling; `Server::stop` blocks until the listener is closed. Requests are
//! handed to a [`RequestHandler`] on the run loop thread.
//!
//! ```no_run
//! use fixture_server::{handler_fn, HttpResponse, Server, ServerConfig};
//!
//! let mut server = Server::new(
//!     ServerConfig::default(),
//!     handler_fn(|_conn, req| HttpResponse::ok(format!("you asked for {}", req.target()))),
//! );
//! let addr = server.start()?;
//! // ... drive the client under test against `addr` ...
//! server.stop()?;
//! # Ok::<(), fixture_server::ServerError>(())
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::schema::ServerConfig;
pub use error::{ServerError, TransportError};
pub use http::{base64_decode, error_reply, handler_fn, HttpRequest, HttpResponse, RequestHandler, TlsHandler};
pub use lifecycle::{Server, ServerState};
pub use net::{Connection, HttpTransport, Transport, TransportEvent};
