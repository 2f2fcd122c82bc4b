//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Lifecycle, transport and dispatcher produce:
//!     → tracing events with structured fields (address, connection_id, ...)
//!     → logging.rs (subscriber: env filter + fmt layer)
//! ```

pub mod logging;
