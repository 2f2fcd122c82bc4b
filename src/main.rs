//! Fixture server runner.
//!
//! Starts the test fixture with an echo handler so a client can be pointed at
//! it by hand. Every request is answered with a JSON description of what the
//! server saw; `GET /status/<code>` answers with a plain-text error reply.
//!
//! ```text
//! fixture-server [--config fixture.toml] [--bind 127.0.0.1:8080]
//! ```

use std::path::PathBuf;

use clap::Parser;
use serde_json::json;

use fixture_server::config::{load_config, ServerConfig};
use fixture_server::http::{basic_auth, error_reply, handler_fn, HttpResponse, TlsHandler};
use fixture_server::observability::logging;
use fixture_server::{Connection, HttpRequest, Server};

use axum::http::{header, HeaderValue, StatusCode};

#[derive(Parser)]
#[command(name = "fixture-server")]
#[command(about = "Run the HTTP test fixture with an echo handler", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

fn echo(conn: &mut Connection, req: &HttpRequest<'_>) -> HttpResponse {
    if let Some(code) = req.path().strip_prefix("/status/") {
        let status = code
            .parse::<u16>()
            .ok()
            .and_then(|code| StatusCode::from_u16(code).ok());
        return match status {
            Some(status) => error_reply(status, status.canonical_reason().unwrap_or("")),
            None => error_reply(StatusCode::BAD_REQUEST, "Bad Request"),
        };
    }

    let headers: serde_json::Map<String, serde_json::Value> = req
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                json!(String::from_utf8_lossy(value.as_bytes())),
            )
        })
        .collect();

    let body = json!({
        "connection": conn.id().to_string(),
        "peer": conn.peer_addr().to_string(),
        "secure": conn.is_secure(),
        "method": req.method().as_str(),
        "target": req.target(),
        "headers": headers,
        "body": String::from_utf8_lossy(req.body()),
        "basic_auth_user": basic_auth(req).map(|(user, _)| user),
    });

    HttpResponse::new(StatusCode::OK)
        .with_header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .with_body(body.to_string())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability);
    tracing::info!("fixture-server v0.1.0 starting");

    let tls = config.listener.tls.clone();
    let (addr, scheme, mut server) = match tls {
        Some(tls) => {
            let handler = TlsHandler::from_config(&tls, handler_fn(echo))?;
            let mut server = Server::new(config, handler);
            (server.start()?, "https", server)
        }
        None => {
            let mut server = Server::new(config, handler_fn(echo));
            (server.start()?, "http", server)
        }
    };

    tracing::info!(address = %addr, "Listening for connections");
    println!("{}://{}/", scheme, addr);

    // Only the Ctrl+C wait lives on this runtime; the server has its own.
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(tokio::signal::ctrl_c())?;

    tracing::info!("Shutdown signal received");
    server.stop()?;

    tracing::info!("Shutdown complete");
    Ok(())
}
