//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Start (server.rs, caller thread):
//!     Install broken-pipe policy → set run flag → spawn run loop
//!     → block until the start signal fires
//!
//! Run loop (server.rs, background thread):
//!     Build transport → bind → fire start signal
//!     → poll while run flag is set → release → fire stop signal
//!
//! Stop (server.rs, caller thread):
//!     Clear run flag → block until the stop signal fires
//!
//! Signals (signals.rs):
//!     SIGPIPE → logged, otherwise ignored
//! ```
//!
//! # Design Decisions
//! - Ordered startup: the caller never returns before the listener is bound
//! - Ordered shutdown: the caller never returns before the listener is closed
//! - State machine (state.rs) allows exactly one cycle shape

pub mod server;
pub mod signals;
pub mod state;

pub use server::{Server, TransportFactory};
pub use signals::ignore_broken_pipe;
pub use state::{InvalidTransition, ServerState};
