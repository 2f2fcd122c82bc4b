//! HTTP semantics layered over the transport.
//!
//! # Data Flow
//! ```text
//! TransportEvent (from net::transport)
//!     → dispatch.rs (classify, route to handler)
//!     → handler.rs (on_accept / on_request hook)
//!     → request.rs (borrowed request view)
//!     → response.rs (handler reply, plain-text error replies)
//!     → codec.rs (base64, basic auth) for handlers that need it
//! ```

pub mod codec;
pub mod dispatch;
pub mod handler;
pub mod request;
pub mod response;

pub use codec::{base64_decode, basic_auth};
pub use dispatch::{classify, Dispatcher, EventKind};
pub use handler::{handler_fn, FnHandler, RequestHandler, TlsHandler};
pub use request::HttpRequest;
pub use response::{error_reply, HttpResponse};
