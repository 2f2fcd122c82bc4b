//! The transport boundary consumed by the run loop.
//!
//! A transport binds a listening socket, produces connection and message
//! events while it is polled, and tears everything down on release. It lives
//! entirely on the run loop thread: it is created there by a factory and never
//! crosses threads, so it does not need to be `Send`.

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::TransportError;
use crate::http::dispatch::Dispatcher;
use crate::http::request::HttpRequest;

/// Raw events a transport reports for a connection.
#[derive(Debug, Clone, Copy)]
pub enum TransportEvent<'a> {
    /// A client connection was accepted.
    Accept,
    /// An outbound connection finished connecting.
    Connect,
    /// Request bytes arrived.
    Read,
    /// A response was handed to the connection for writing.
    Write,
    /// The connection was visited by a poll iteration.
    Poll,
    /// The connection closed.
    Close,
    /// A piece of a request body arrived.
    HttpChunk(&'a [u8]),
    /// A complete request was parsed.
    HttpMessage(HttpRequest<'a>),
}

impl TransportEvent<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            TransportEvent::Accept => "accept",
            TransportEvent::Connect => "connect",
            TransportEvent::Read => "read",
            TransportEvent::Write => "write",
            TransportEvent::Poll => "poll",
            TransportEvent::Close => "close",
            TransportEvent::HttpChunk(_) => "http_chunk",
            TransportEvent::HttpMessage(_) => "http_message",
        }
    }
}

/// Event source driven by the run loop.
pub trait Transport: 'static {
    /// Bind the listening socket and start delivering events to `dispatcher`.
    ///
    /// Returns the address actually bound (port 0 resolves here).
    fn bind(&mut self, addr: SocketAddr, dispatcher: Dispatcher) -> Result<SocketAddr, TransportError>;

    /// Wait up to `timeout` for events and dispatch them in arrival order.
    ///
    /// Returning with no events delivered is normal.
    fn poll(&mut self, timeout: Duration);

    /// Close the listener and every connection. No events are dispatched
    /// once this returns.
    fn release(&mut self);
}
