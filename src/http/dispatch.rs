//! Event dispatch from the transport to the request handler.
//!
//! # Data Flow
//! ```text
//! TransportEvent
//!     → classify (accepted / request / housekeeping)
//!     → Accept       → handler.on_accept(conn)
//!     → HttpMessage  → handler.on_request(conn, request) → response
//!     → everything else is dropped
//! ```

use std::sync::Arc;

use crate::http::handler::RequestHandler;
use crate::http::request::HttpRequest;
use crate::http::response::HttpResponse;
use crate::net::connection::Connection;
use crate::net::transport::TransportEvent;

/// What an event means to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    ConnectionAccepted,
    RequestReceived,
    /// Surfaced by the transport, ignored by the server.
    Housekeeping,
}

/// Classify a raw transport event.
pub fn classify(event: &TransportEvent<'_>) -> EventKind {
    match event {
        TransportEvent::Accept => EventKind::ConnectionAccepted,
        TransportEvent::HttpMessage(_) => EventKind::RequestReceived,
        TransportEvent::Read
        | TransportEvent::Write
        | TransportEvent::Poll
        | TransportEvent::Close
        | TransportEvent::Connect
        | TransportEvent::HttpChunk(_) => EventKind::Housekeeping,
    }
}

/// Routes transport events to a request handler.
#[derive(Clone)]
pub struct Dispatcher {
    handler: Arc<dyn RequestHandler>,
}

impl Dispatcher {
    pub fn new(handler: Arc<dyn RequestHandler>) -> Self {
        Self { handler }
    }

    /// Deliver one event.
    ///
    /// Only `HttpMessage` produces a response; see [`Dispatcher::respond`].
    pub fn dispatch(&self, conn: &mut Connection, event: TransportEvent<'_>) -> Option<HttpResponse> {
        tracing::trace!(
            connection_id = %conn.id(),
            event = event.name(),
            kind = ?classify(&event),
            "Dispatching event"
        );

        match event {
            TransportEvent::Accept => {
                self.handler.on_accept(conn);
                None
            }
            TransportEvent::HttpMessage(request) => Some(self.respond(conn, &request)),
            _ => None,
        }
    }

    /// Deliver a complete request and return the handler's response.
    pub fn respond(&self, conn: &mut Connection, request: &HttpRequest<'_>) -> HttpResponse {
        tracing::debug!(
            connection_id = %conn.id(),
            method = %request.method(),
            target = request.target(),
            "Request received"
        );
        self.handler.on_request(conn, request)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}
