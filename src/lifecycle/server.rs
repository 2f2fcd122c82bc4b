//! Server lifecycle controller.
//!
//! # Responsibilities
//! - Own the run loop thread and the transport it drives
//! - Synchronous start/stop handshake with the caller's thread
//! - Enforce the Stopped → Starting → Running → Stopping → Stopped cycle
//!
//! # Design Decisions
//! - The run flag is the only state shared with the run loop; it is written
//!   with `Release` and read with `Acquire`
//! - Start and stop each wait on a one-shot signal. The start signal fires after
//!   the transport is bound and before the first poll. The stop signal fires
//!   after the transport is released and dropped
//! - Stop is cooperative: the loop notices the flag between polls, so stop
//!   latency is bounded by the poll timeout
//! - Misuse (start twice, stop while stopped) is rejected with an error and
//!   changes nothing
//!
//! `start` and `stop` block the calling thread. The signals are plain
//! rendezvous channels, so blocking is allowed inside an async runtime too
//! (for example a `#[tokio::test]`). The run loop owns its own runtime.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::Arc;
use std::time::Duration;

use crate::config::ServerConfig;
use crate::error::{ServerError, TransportError};
use crate::http::dispatch::Dispatcher;
use crate::http::handler::RequestHandler;
use crate::lifecycle::signals::ignore_broken_pipe;
use crate::lifecycle::state::ServerState;
use crate::net::http_transport::HttpTransport;
use crate::net::transport::Transport;

/// Builds a transport on the run loop thread.
pub type TransportFactory<T> = Arc<dyn Fn() -> Result<T, TransportError> + Send + Sync>;

type StartSignal = SyncSender<Result<SocketAddr, TransportError>>;
type StopSignal = SyncSender<()>;

/// An embeddable HTTP server with a blocking start/stop lifecycle.
///
/// Dropping a running server stops it.
pub struct Server<T: Transport = HttpTransport> {
    config: ServerConfig,
    handler: Arc<dyn RequestHandler>,
    make_transport: TransportFactory<T>,
    state: ServerState,
    run_flag: Arc<AtomicBool>,
    stop_signal: Option<Receiver<()>>,
    local_addr: Option<SocketAddr>,
}

impl Server<HttpTransport> {
    /// Create a stopped server that serves HTTP/1.1 over TCP.
    pub fn new(config: ServerConfig, handler: impl RequestHandler) -> Self {
        Self::with_transport(config, handler, HttpTransport::new)
    }
}

impl<T: Transport> Server<T> {
    /// Create a stopped server over a custom transport.
    ///
    /// `make_transport` runs on the run loop thread once per `start`.
    pub fn with_transport<F>(config: ServerConfig, handler: impl RequestHandler, make_transport: F) -> Self
    where
        F: Fn() -> Result<T, TransportError> + Send + Sync + 'static,
    {
        Self {
            config,
            handler: Arc::new(handler),
            make_transport: Arc::new(make_transport),
            state: ServerState::Stopped,
            run_flag: Arc::new(AtomicBool::new(false)),
            stop_signal: None,
            local_addr: None,
        }
    }

    /// Bind the transport and start the run loop.
    ///
    /// Returns once the listener is bound and the loop is about to poll, so a
    /// client may connect immediately. Returns the bound address.
    pub fn start(&mut self) -> Result<SocketAddr, ServerError> {
        if self.state != ServerState::Stopped {
            return Err(ServerError::AlreadyStarted(self.state));
        }

        let addr: SocketAddr = self
            .config
            .listener
            .bind_address
            .parse()
            .map_err(|_| ServerError::InvalidAddress(self.config.listener.bind_address.clone()))?;

        ignore_broken_pipe().map_err(ServerError::SignalPolicy)?;

        // Capacity one: the run loop never blocks sending either signal.
        let (start_tx, start_rx) = sync_channel(1);
        let (stop_tx, stop_rx) = sync_channel(1);

        self.run_flag.store(true, Ordering::Release);
        let run_loop = RunLoop {
            make_transport: Arc::clone(&self.make_transport),
            dispatcher: Dispatcher::new(Arc::clone(&self.handler)),
            run_flag: Arc::clone(&self.run_flag),
            poll_timeout: Duration::from_millis(self.config.run_loop.poll_timeout_ms),
            addr,
        };

        // The join handle is dropped: the thread is detached and only
        // synchronizes with us through the two signals.
        if let Err(e) = std::thread::Builder::new()
            .name("fixture-server".into())
            .spawn(move || run_loop.run(start_tx, stop_tx))
        {
            self.run_flag.store(false, Ordering::Release);
            return Err(TransportError::Runtime(e).into());
        }
        self.state.advance(ServerState::Starting)?;

        let started = start_rx.recv();
        self.state.advance(ServerState::Running)?;

        match started {
            Ok(Ok(local_addr)) => {
                self.local_addr = Some(local_addr);
                self.stop_signal = Some(stop_rx);
                tracing::info!(address = %local_addr, "Server started");
                Ok(local_addr)
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Server failed to start");
                self.finish_failed_start(stop_rx)?;
                Err(e.into())
            }
            Err(_) => {
                self.finish_failed_start(stop_rx)?;
                Err(ServerError::RunLoopExited)
            }
        }
    }

    /// The run loop never polled; wait for it to finish tearing down.
    fn finish_failed_start(&mut self, stop_rx: Receiver<()>) -> Result<(), ServerError> {
        self.state.advance(ServerState::Stopping)?;
        self.run_flag.store(false, Ordering::Release);
        let _ = stop_rx.recv();
        self.state.advance(ServerState::Stopped)?;
        Ok(())
    }

    /// Ask the run loop to exit and wait until the transport is released.
    ///
    /// On return no further events will be dispatched and the listening
    /// socket is closed.
    pub fn stop(&mut self) -> Result<(), ServerError> {
        if self.state != ServerState::Running {
            return Err(ServerError::NotRunning(self.state));
        }
        self.state.advance(ServerState::Stopping)?;

        self.run_flag.store(false, Ordering::Release);
        let stopped = match self.stop_signal.take() {
            Some(stop_rx) => stop_rx.recv().map_err(|_| ServerError::RunLoopExited),
            None => Err(ServerError::RunLoopExited),
        };

        self.state.advance(ServerState::Stopped)?;
        if let Some(addr) = self.local_addr.take() {
            tracing::info!(address = %addr, "Server stopped");
        }
        stopped
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ServerState::Running
    }

    /// Address the running server is bound to.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// `http://<addr><path>` for the running server.
    ///
    /// Use `https` yourself when the handler upgrades to TLS.
    pub fn url(&self, path: &str) -> Option<String> {
        self.local_addr.map(|addr| format!("http://{}{}", addr, path))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

impl<T: Transport> Drop for Server<T> {
    fn drop(&mut self) {
        if self.state == ServerState::Running {
            if let Err(e) = self.stop() {
                tracing::warn!(error = %e, "Failed to stop server on drop");
            }
        }
    }
}

/// Everything the run loop thread needs, moved in at spawn time.
struct RunLoop<T> {
    make_transport: TransportFactory<T>,
    dispatcher: Dispatcher,
    run_flag: Arc<AtomicBool>,
    poll_timeout: Duration,
    addr: SocketAddr,
}

impl<T: Transport> RunLoop<T> {
    fn run(self, start_signal: StartSignal, stop_signal: StopSignal) {
        let mut transport = match (self.make_transport)() {
            Ok(transport) => transport,
            Err(e) => {
                let _ = start_signal.send(Err(e));
                let _ = stop_signal.send(());
                return;
            }
        };

        match transport.bind(self.addr, self.dispatcher) {
            Ok(local_addr) => {
                let _ = start_signal.send(Ok(local_addr));

                let mut polls: u64 = 0;
                while self.run_flag.load(Ordering::Acquire) {
                    transport.poll(self.poll_timeout);
                    polls += 1;
                }
                tracing::debug!(polls, "Run loop exiting");
            }
            Err(e) => {
                let _ = start_signal.send(Err(e));
            }
        }

        transport.release();
        drop(transport);

        let _ = stop_signal.send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::handler::handler_fn;
    use crate::http::response::HttpResponse;
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    /// Records the calls the run loop makes.
    struct ScriptedTransport {
        log: Log,
        fail_bind: bool,
    }

    impl Transport for ScriptedTransport {
        fn bind(&mut self, addr: SocketAddr, _dispatcher: Dispatcher) -> Result<SocketAddr, TransportError> {
            self.log.lock().unwrap().push("bind");
            if self.fail_bind {
                return Err(TransportError::Bind {
                    addr,
                    source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use"),
                });
            }
            Ok(SocketAddr::from(([127, 0, 0, 1], 4242)))
        }

        fn poll(&mut self, timeout: Duration) {
            self.log.lock().unwrap().push("poll");
            std::thread::sleep(timeout);
        }

        fn release(&mut self) {
            self.log.lock().unwrap().push("release");
        }
    }

    impl Drop for ScriptedTransport {
        fn drop(&mut self) {
            self.log.lock().unwrap().push("drop");
        }
    }

    fn config() -> ServerConfig {
        let mut config = ServerConfig::default();
        config.run_loop.poll_timeout_ms = 5;
        config
    }

    fn scripted(fail_bind: bool) -> (Server<ScriptedTransport>, Log) {
        let log: Log = Arc::default();
        let factory_log = Arc::clone(&log);
        let server = Server::with_transport(
            config(),
            handler_fn(|_conn, _req| HttpResponse::ok("")),
            move || {
                Ok(ScriptedTransport {
                    log: Arc::clone(&factory_log),
                    fail_bind,
                })
            },
        );
        (server, log)
    }

    #[test]
    fn start_returns_after_bind() {
        let (mut server, log) = scripted(false);
        let addr = server.start().unwrap();

        assert_eq!(addr, SocketAddr::from(([127, 0, 0, 1], 4242)));
        assert_eq!(server.state(), ServerState::Running);
        assert_eq!(server.local_addr(), Some(addr));
        assert_eq!(server.url("/x").as_deref(), Some("http://127.0.0.1:4242/x"));
        assert_eq!(log.lock().unwrap().first(), Some(&"bind"));

        server.stop().unwrap();
    }

    #[test]
    fn stop_returns_after_release_and_drop() {
        let (mut server, log) = scripted(false);
        server.start().unwrap();
        std::thread::sleep(Duration::from_millis(30));
        server.stop().unwrap();

        assert_eq!(server.state(), ServerState::Stopped);
        assert_eq!(server.local_addr(), None);

        let snapshot = log.lock().unwrap().clone();
        assert_eq!(snapshot.first(), Some(&"bind"));
        assert_eq!(&snapshot[snapshot.len() - 2..], ["release", "drop"]);
        assert!(snapshot[1..snapshot.len() - 2].iter().all(|entry| *entry == "poll"));
        assert!(snapshot.len() > 3, "expected at least one poll: {snapshot:?}");

        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(*log.lock().unwrap(), snapshot, "no activity after stop");
    }

    #[test]
    fn misuse_is_rejected_without_side_effects() {
        let (mut server, log) = scripted(false);

        assert!(matches!(
            server.stop(),
            Err(ServerError::NotRunning(ServerState::Stopped))
        ));

        server.start().unwrap();
        assert!(matches!(
            server.start(),
            Err(ServerError::AlreadyStarted(ServerState::Running))
        ));
        assert_eq!(log.lock().unwrap().iter().filter(|e| **e == "bind").count(), 1);

        server.stop().unwrap();
        assert!(matches!(
            server.stop(),
            Err(ServerError::NotRunning(ServerState::Stopped))
        ));
    }

    #[test]
    fn failed_bind_completes_cycle_without_polling() {
        let (mut server, log) = scripted(true);

        let err = server.start().unwrap_err();
        assert!(matches!(err, ServerError::Transport(TransportError::Bind { .. })));
        assert_eq!(server.state(), ServerState::Stopped);
        assert_eq!(*log.lock().unwrap(), vec!["bind", "release", "drop"]);
    }

    #[test]
    fn repeated_cycles_behave_like_the_first() {
        let (mut server, log) = scripted(false);

        for _ in 0..3 {
            log.lock().unwrap().clear();
            server.start().unwrap();
            server.stop().unwrap();

            let cycle = log.lock().unwrap().clone();
            assert_eq!(cycle.first(), Some(&"bind"));
            assert_eq!(&cycle[cycle.len() - 2..], ["release", "drop"]);
            assert_eq!(server.state(), ServerState::Stopped);
        }
    }

    #[test]
    fn transport_factory_failure_is_reported() {
        let mut server = Server::<ScriptedTransport>::with_transport(
            config(),
            handler_fn(|_conn, _req| HttpResponse::ok("")),
            || Err(TransportError::Tls("no runtime".into())),
        );

        assert!(matches!(
            server.start(),
            Err(ServerError::Transport(TransportError::Tls(_)))
        ));
        assert_eq!(server.state(), ServerState::Stopped);
    }

    #[test]
    fn invalid_bind_address_is_rejected() {
        let (mut server, log) = scripted(false);
        server.config.listener.bind_address = "not-an-address".into();

        assert!(matches!(server.start(), Err(ServerError::InvalidAddress(_))));
        assert_eq!(server.state(), ServerState::Stopped);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn drop_stops_running_server() {
        let (mut server, log) = scripted(false);
        server.start().unwrap();
        drop(server);

        assert_eq!(log.lock().unwrap().last(), Some(&"drop"));
    }
}
