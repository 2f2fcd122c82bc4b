//! OS signal handling.
//!
//! # Responsibilities
//! - Keep SIGPIPE from killing the process when a client hangs up mid-write
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe); once registered, tokio never
//!   restores the default disposition, so the policy outlives any one server
//! - Installed once per process; later calls observe the first outcome
//! - A dedicated thread drains the signal stream and logs each hit

use std::sync::OnceLock;

static BROKEN_PIPE_POLICY: OnceLock<Result<(), String>> = OnceLock::new();

/// Turn broken-pipe signals into a logged no-op for the whole process.
///
/// Writes to a closed peer then fail with `EPIPE` on the writing connection
/// instead of terminating the process.
pub fn ignore_broken_pipe() -> Result<(), String> {
    BROKEN_PIPE_POLICY.get_or_init(install).clone()
}

#[cfg(unix)]
fn install() -> Result<(), String> {
    use tokio::signal::unix::{signal, SignalKind};

    let (ready_tx, ready_rx) = std::sync::mpsc::sync_channel(1);

    std::thread::Builder::new()
        .name("sigpipe-policy".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    let _ = ready_tx.send(Err(e.to_string()));
                    return;
                }
            };

            runtime.block_on(async move {
                let mut pipe = match signal(SignalKind::pipe()) {
                    Ok(pipe) => pipe,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));

                while pipe.recv().await.is_some() {
                    tracing::debug!("Caught SIGPIPE");
                }
            });
        })
        .map_err(|e| e.to_string())?;

    let outcome = ready_rx
        .recv()
        .map_err(|_| "signal thread exited before installing handler".to_string())?;
    if outcome.is_ok() {
        tracing::debug!("Broken-pipe policy installed");
    }
    outcome
}

#[cfg(not(unix))]
fn install() -> Result<(), String> {
    Ok(())
}
