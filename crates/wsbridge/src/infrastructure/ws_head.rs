//! WebSocket bridge head: the "server" role.
//!
//! Serves WebSocket upgrades and re-emits each session as a plain TCP
//! connection to the configured destination:
//!
//! ```text
//! TcpBridgeHead ──ws(s)://host/──► [WebSocketBridgeHead] ──TCP──► destination
//! ```
//!
//! Which request paths may upgrade is decided by an [`UpgradeRouter`] owned
//! by the head.  Requests for any other path get a 404 and never reach the
//! destination.

use std::net::SocketAddr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tracing::{debug, info, warn};

use crate::application::ConnectionBridge;
use crate::domain::{ServerConfig, UPGRADE_PATH};
use crate::infrastructure::accept::{accept_until_stopped, bind_listener};
use crate::infrastructure::error::HeadError;
use crate::infrastructure::framed_endpoint::FramedEndpoint;
use crate::infrastructure::stream_endpoint::StreamEndpoint;

// ── Router ────────────────────────────────────────────────────────────────────

/// Decides which HTTP upgrade requests a head accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeRouter {
    path: String,
}

impl UpgradeRouter {
    /// Router that accepts upgrades on exactly `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Handshake callback: passes `response` through for the routed path,
    /// answers 404 for everything else.
    pub fn route(&self, request: &Request, response: Response) -> Result<Response, ErrorResponse> {
        if request.uri().path() == self.path {
            return Ok(response);
        }
        let mut not_found = ErrorResponse::new(Some(format!(
            "no WebSocket endpoint at {}",
            request.uri().path()
        )));
        *not_found.status_mut() = StatusCode::NOT_FOUND;
        Err(not_found)
    }
}

impl Default for UpgradeRouter {
    fn default() -> Self {
        Self::new(UPGRADE_PATH)
    }
}

// ── Head ──────────────────────────────────────────────────────────────────────

/// A bound WebSocket bridge head, ready to serve.
pub struct WebSocketBridgeHead {
    listener: TcpListener,
    local_addr: SocketAddr,
    config: Arc<ServerConfig>,
    router: Arc<UpgradeRouter>,
}

impl WebSocketBridgeHead {
    /// Binds the HTTP listener.
    ///
    /// # Errors
    ///
    /// Returns [`HeadError::Bind`] if the listen address cannot be bound.
    pub async fn bind(config: ServerConfig, router: UpgradeRouter) -> Result<Self, HeadError> {
        let (listener, local_addr) = bind_listener(&config.listen_addr).await?;
        info!(
            "WebSocket bridge head listening on {local_addr}{}, forwarding to {}",
            router.path(),
            config.remote_addr
        );

        Ok(Self {
            listener,
            local_addr,
            config: Arc::new(config),
            router: Arc::new(router),
        })
    }

    /// Address the listener is actually bound to (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serves upgrades until `running` is cleared.
    pub async fn serve(self, running: Arc<AtomicBool>) {
        let config = self.config;
        let router = self.router;

        accept_until_stopped(&self.listener, "websocket head", &running, |stream, peer_addr| {
            let config = Arc::clone(&config);
            let router = Arc::clone(&router);
            tokio::spawn(async move {
                handle_upgrade(stream, peer_addr, &config, &router).await;
            });
        })
        .await;
    }
}

/// Binds a [`WebSocketBridgeHead`] and serves until `running` is cleared.
///
/// # Errors
///
/// Returns an error only if the head cannot start.
pub async fn run_server(
    config: ServerConfig,
    router: UpgradeRouter,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let head = WebSocketBridgeHead::bind(config, router)
        .await
        .context("WebSocket bridge head failed to start")?;
    head.serve(running).await;
    Ok(())
}

async fn handle_upgrade(
    stream: TcpStream,
    peer_addr: SocketAddr,
    config: &ServerConfig,
    router: &UpgradeRouter,
) {
    let handshake = accept_hdr_async(stream, |req: &Request, resp: Response| {
        router.route(req, resp)
    });
    let ws = match timeout(config.timeouts.dial, handshake).await {
        Ok(Ok(ws)) => ws,
        Ok(Err(e)) => {
            warn!("failed to upgrade WebSocket from {peer_addr}: {e}");
            return;
        }
        Err(_) => {
            warn!(
                "failed to upgrade WebSocket from {peer_addr}: handshake timed out after {:?}",
                config.timeouts.dial
            );
            return;
        }
    };
    info!("upgrade: {peer_addr}");
    let framed = FramedEndpoint::new(peer_addr.to_string(), ws);

    let tcp = match dial_destination(config).await {
        Ok(tcp) => tcp,
        Err(e) => {
            warn!("session {peer_addr}: {e:#}");
            if let Err(e) = framed.close().await {
                debug!("session {peer_addr}: close after failed dial: {e}");
            }
            return;
        }
    };

    let endpoint = match StreamEndpoint::from_tcp(tcp) {
        Ok(endpoint) => endpoint,
        Err(e) => {
            warn!("session {peer_addr}: destination {} dropped immediately: {e}", config.remote_addr);
            if let Err(e) = framed.close().await {
                debug!("session {peer_addr}: close after dropped destination: {e}");
            }
            return;
        }
    };
    info!("session {peer_addr}: connected to {}", config.remote_addr);

    let report = ConnectionBridge::new(endpoint, framed)
        .with_idle_timeout(config.timeouts.idle)
        .run()
        .await;
    info!("WebSocket closed: {report}");
}

/// Opens the outbound TCP connection, bounded by the dial timeout.
async fn dial_destination(config: &ServerConfig) -> anyhow::Result<TcpStream> {
    let addr = &config.remote_addr;
    timeout(config.timeouts.dial, TcpStream::connect(addr))
        .await
        .with_context(|| format!("dial to {addr} timed out after {:?}", config.timeouts.dial))?
        .with_context(|| format!("failed to connect TCP peer {addr}"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
