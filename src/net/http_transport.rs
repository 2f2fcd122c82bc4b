//! HTTP/1.1 transport over a current-thread tokio runtime.
//!
//! # Responsibilities
//! - Bind the TCP listener
//! - Accept connections one poll at a time, bounded by the poll timeout
//! - Serve each connection with hyper on a `LocalSet`, so every callback
//!   runs on the run loop thread
//! - Tear down the listener and all connections on release
//!
//! Connection tasks only make progress while `poll` is running. Between polls
//! the run loop thread is free to check its run flag.

use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::rc::Rc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum_server::accept::Accept;
use axum_server::tls_rustls::RustlsAcceptor;
use futures_util::StreamExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::{Builder, Runtime};
use tokio::task::LocalSet;
use tokio::time::Instant;

use crate::error::TransportError;
use crate::http::dispatch::Dispatcher;
use crate::http::request::HttpRequest;
use crate::http::response::error_reply;
use crate::net::connection::{Connection, ConnectionId};
use crate::net::transport::{Transport, TransportEvent};

type SharedConnection = Rc<RefCell<Connection>>;
type Registry = Rc<RefCell<HashMap<ConnectionId, SharedConnection>>>;

/// The transport used by [`Server::new`](crate::Server::new).
pub struct HttpTransport {
    runtime: Runtime,
    bound: Option<Bound>,
}

struct Bound {
    listener: TcpListener,
    local_addr: SocketAddr,
    tasks: LocalSet,
    dispatcher: Dispatcher,
    connections: Registry,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(TransportError::Runtime)?;

        Ok(Self {
            runtime,
            bound: None,
        })
    }

    /// Number of connections currently open.
    pub fn connection_count(&self) -> usize {
        self.bound
            .as_ref()
            .map_or(0, |bound| bound.connections.borrow().len())
    }
}

impl Transport for HttpTransport {
    fn bind(&mut self, addr: SocketAddr, dispatcher: Dispatcher) -> Result<SocketAddr, TransportError> {
        let listener = self
            .runtime
            .block_on(TcpListener::bind(addr))
            .map_err(|source| TransportError::Bind { addr, source })?;

        let local_addr = listener
            .local_addr()
            .map_err(|source| TransportError::Bind { addr, source })?;

        tracing::info!(address = %local_addr, "Listener bound");

        self.bound = Some(Bound {
            listener,
            local_addr,
            tasks: LocalSet::new(),
            dispatcher,
            connections: Rc::new(RefCell::new(HashMap::new())),
        });
        Ok(local_addr)
    }

    fn poll(&mut self, timeout: Duration) {
        let Some(bound) = self.bound.as_ref() else {
            return;
        };

        bound.visit_connections();

        let listener = &bound.listener;
        let accepted = self
            .runtime
            .block_on(bound.tasks.run_until(accept_within(listener.accept(), timeout)));

        match accepted {
            Some(Ok((stream, peer_addr))) => bound.serve(stream, peer_addr),
            Some(Err(e)) => tracing::warn!(error = %e, "Failed to accept connection"),
            None => {}
        }
    }

    fn release(&mut self) {
        let Some(bound) = self.bound.take() else {
            return;
        };
        let Bound {
            listener,
            local_addr,
            tasks,
            dispatcher,
            connections,
        } = bound;

        drop(listener);
        {
            // Connection sockets deregister from this runtime's reactor on drop.
            let _guard = self.runtime.enter();
            drop(tasks);
        }

        let remaining: Vec<SharedConnection> = connections
            .borrow_mut()
            .drain()
            .map(|(_, conn)| conn)
            .collect();
        for conn in remaining {
            dispatcher.dispatch(&mut conn.borrow_mut(), TransportEvent::Close);
        }

        tracing::info!(address = %local_addr, "Listener released");
    }
}

impl Drop for HttpTransport {
    fn drop(&mut self) {
        self.release();
    }
}

impl Bound {
    fn visit_connections(&self) {
        let live: Vec<SharedConnection> = self.connections.borrow().values().cloned().collect();
        for conn in live {
            self.dispatcher.dispatch(&mut conn.borrow_mut(), TransportEvent::Poll);
        }
    }

    fn serve(&self, stream: TcpStream, peer_addr: SocketAddr) {
        let conn = Rc::new(RefCell::new(Connection::new(peer_addr, self.local_addr)));
        let id = conn.borrow().id();

        tracing::debug!(connection_id = %id, peer_addr = %peer_addr, "Connection accepted");

        self.dispatcher.dispatch(&mut conn.borrow_mut(), TransportEvent::Accept);
        self.connections.borrow_mut().insert(id, Rc::clone(&conn));
        self.tasks.spawn_local(serve_connection(
            stream,
            conn,
            self.dispatcher.clone(),
            Rc::clone(&self.connections),
        ));
    }
}

/// Wait up to `timeout` for one accepted connection.
///
/// An accept error still waits out the timeout, so a persistent failure
/// (such as `EMFILE`) cannot spin the run loop.
async fn accept_within<F, S>(accept: F, timeout: Duration) -> Option<io::Result<S>>
where
    F: Future<Output = io::Result<S>>,
{
    let deadline = Instant::now() + timeout;
    tokio::select! {
        accepted = accept => {
            if accepted.is_err() {
                tokio::time::sleep_until(deadline).await;
            }
            Some(accepted)
        }
        () = tokio::time::sleep_until(deadline) => None,
    }
}

async fn serve_connection(
    stream: TcpStream,
    conn: SharedConnection,
    dispatcher: Dispatcher,
    connections: Registry,
) {
    let id = conn.borrow().id();
    let upgrade = conn.borrow_mut().take_tls_upgrade();

    let result = match upgrade {
        Some(tls) => match RustlsAcceptor::new(tls).accept(stream, ()).await {
            Ok((stream, ())) => {
                conn.borrow_mut().mark_secure();
                serve_http(stream, &conn, &dispatcher).await
            }
            Err(e) => {
                tracing::debug!(connection_id = %id, error = %e, "TLS handshake failed");
                Ok(())
            }
        },
        None => serve_http(stream, &conn, &dispatcher).await,
    };

    if let Err(e) = result {
        tracing::debug!(connection_id = %id, error = %e, "Connection error");
    }

    connections.borrow_mut().remove(&id);
    dispatcher.dispatch(&mut conn.borrow_mut(), TransportEvent::Close);
    tracing::trace!(connection_id = %id, "Connection closed");
}

async fn serve_http<I>(io: I, conn: &SharedConnection, dispatcher: &Dispatcher) -> Result<(), hyper::Error>
where
    I: AsyncRead + AsyncWrite + Unpin + 'static,
{
    let service = {
        let conn = Rc::clone(conn);
        let dispatcher = dispatcher.clone();
        service_fn(move |request: Request<Incoming>| {
            let conn = Rc::clone(&conn);
            let dispatcher = dispatcher.clone();
            async move { Ok::<_, Infallible>(handle_request(request, conn, dispatcher).await) }
        })
    };

    http1::Builder::new()
        .timer(TokioTimer::new())
        .serve_connection(TokioIo::new(io), service)
        .await
}

async fn handle_request(
    request: Request<Incoming>,
    conn: SharedConnection,
    dispatcher: Dispatcher,
) -> Response<Body> {
    let (parts, incoming) = request.into_parts();
    let target = parts
        .uri
        .path_and_query()
        .map_or("/", |pq| pq.as_str())
        .to_owned();

    dispatcher.dispatch(&mut conn.borrow_mut(), TransportEvent::Read);

    let mut body = Vec::new();
    let mut chunks = Body::new(incoming).into_data_stream();
    while let Some(chunk) = chunks.next().await {
        match chunk {
            Ok(chunk) => {
                dispatcher.dispatch(&mut conn.borrow_mut(), TransportEvent::HttpChunk(&chunk));
                body.extend_from_slice(&chunk);
            }
            Err(e) => {
                tracing::debug!(connection_id = %conn.borrow().id(), error = %e, "Failed to read request body");
                return error_reply(StatusCode::BAD_REQUEST, "Bad Request").into();
            }
        }
    }

    let view = HttpRequest::new(&parts.method, &target, parts.version, &parts.headers, &body);
    let response = dispatcher.respond(&mut conn.borrow_mut(), &view);

    dispatcher.dispatch(&mut conn.borrow_mut(), TransportEvent::Write);
    response.into()
}
