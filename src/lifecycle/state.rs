//! Server lifecycle state machine.
//!
//! ```text
//! Stopped → Starting → Running → Stopping → Stopped
//! ```
//!
//! No other edge exists. A failed start still walks the whole cycle: the run
//! loop comes up, skips polling, and shuts down again.

use thiserror::Error;

/// Where a server is in its start/stop cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerState {
    #[default]
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl ServerState {
    /// The only state reachable from this one.
    pub fn successor(self) -> ServerState {
        match self {
            ServerState::Stopped => ServerState::Starting,
            ServerState::Starting => ServerState::Running,
            ServerState::Running => ServerState::Stopping,
            ServerState::Stopping => ServerState::Stopped,
        }
    }

    /// Move to `next` if that is the successor.
    pub fn advance(&mut self, next: ServerState) -> Result<(), InvalidTransition> {
        if self.successor() != next {
            return Err(InvalidTransition {
                from: *self,
                to: next,
            });
        }
        tracing::trace!(from = ?*self, to = ?next, "Server state transition");
        *self = next;
        Ok(())
    }
}

/// An attempted edge outside the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid server state transition {from:?} → {to:?}")]
pub struct InvalidTransition {
    pub from: ServerState,
    pub to: ServerState,
}
