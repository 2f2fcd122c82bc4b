//! Error types for the fixture server.

use std::net::SocketAddr;

use thiserror::Error;

use crate::lifecycle::state::{InvalidTransition, ServerState};

/// Errors raised by a transport while binding or upgrading connections.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport's event loop could not be created.
    #[error("failed to build run loop runtime: {0}")]
    Runtime(#[source] std::io::Error),

    /// Failed to bind to address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// TLS material could not be loaded or assembled.
    #[error("TLS setup failed: {0}")]
    Tls(String),
}

/// Errors returned by the lifecycle API.
#[derive(Debug, Error)]
pub enum ServerError {
    /// `start` was called while a cycle is still in progress.
    #[error("server already started (state: {0:?})")]
    AlreadyStarted(ServerState),

    /// `stop` was called on a server that is not running.
    #[error("server is not running (state: {0:?})")]
    NotRunning(ServerState),

    /// The configured bind address is not a socket address.
    #[error("invalid bind address {0:?}")]
    InvalidAddress(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The broken-pipe policy could not be installed.
    #[error("failed to install broken-pipe policy: {0}")]
    SignalPolicy(String),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    /// The run loop thread went away without signalling.
    #[error("run loop exited unexpectedly")]
    RunLoopExited,
}
