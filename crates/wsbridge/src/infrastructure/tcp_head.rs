//! TCP bridge head: the "client" role.
//!
//! Listens for plain TCP connections and carries each one to the remote
//! WebSocket head inside its own WebSocket session:
//!
//! ```text
//! local app ──TCP──► [TcpBridgeHead] ──ws(s)://remote/──► WebSocketBridgeHead
//! ```
//!
//! The accept loop never waits on a bridge.  Each accepted connection gets a
//! Tokio task that dials the remote, and on success runs a
//! [`ConnectionBridge`] to completion.  A failed dial drops only that TCP
//! connection.

use std::net::SocketAddr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, MaybeTlsStream};
use tracing::{debug, info, warn};
use url::Url;

use crate::application::ConnectionBridge;
use crate::domain::{ClientConfig, Timeouts};
use crate::infrastructure::accept::{accept_until_stopped, bind_listener};
use crate::infrastructure::error::HeadError;
use crate::infrastructure::framed_endpoint::FramedEndpoint;
use crate::infrastructure::stream_endpoint::StreamEndpoint;

/// Framed endpoint produced by dialing the remote head.
pub type RemoteFramedEndpoint = FramedEndpoint<MaybeTlsStream<TcpStream>>;

/// A bound TCP bridge head, ready to serve.
pub struct TcpBridgeHead {
    listener: TcpListener,
    local_addr: SocketAddr,
    remote_url: Arc<Url>,
    timeouts: Timeouts,
}

impl TcpBridgeHead {
    /// Validates the remote URL and binds the TCP listener.
    ///
    /// # Errors
    ///
    /// [`HeadError::InvalidUrl`] if `{scheme}://{remote_addr}/` does not
    /// parse, [`HeadError::Bind`] if the listen address cannot be bound.
    pub async fn bind(config: ClientConfig) -> Result<Self, HeadError> {
        let url = config.remote_url();
        let remote_url = Url::parse(&url).map_err(|source| HeadError::InvalidUrl { url, source })?;

        let (listener, local_addr) = bind_listener(&config.listen_addr).await?;
        info!("TCP bridge head listening on {local_addr}, tunnelling to {remote_url}");

        Ok(Self {
            listener,
            local_addr,
            remote_url: Arc::new(remote_url),
            timeouts: config.timeouts,
        })
    }

    /// Address the listener is actually bound to (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn remote_url(&self) -> &Url {
        &self.remote_url
    }

    /// Accepts connections until `running` is cleared.
    pub async fn serve(self, running: Arc<AtomicBool>) {
        let remote_url = self.remote_url;
        let timeouts = self.timeouts;

        accept_until_stopped(&self.listener, "tcp head", &running, |stream, peer_addr| {
            info!("accepted TCP connection from {peer_addr}");
            let remote_url = Arc::clone(&remote_url);
            tokio::spawn(async move {
                handle_connection(stream, peer_addr, &remote_url, timeouts).await;
            });
        })
        .await;
    }
}

/// Binds a [`TcpBridgeHead`] and serves until `running` is cleared.
///
/// # Errors
///
/// Returns an error only if the head cannot start.
pub async fn run_client(config: ClientConfig, running: Arc<AtomicBool>) -> anyhow::Result<()> {
    let head = TcpBridgeHead::bind(config)
        .await
        .context("TCP bridge head failed to start")?;
    head.serve(running).await;
    Ok(())
}

async fn handle_connection(stream: TcpStream, peer_addr: SocketAddr, remote_url: &Url, timeouts: Timeouts) {
    let framed = match dial_remote(remote_url, timeouts).await {
        Ok(framed) => framed,
        Err(e) => {
            // Dropping `stream` closes the inbound connection.
            warn!("connection {peer_addr}: {e:#}");
            return;
        }
    };
    info!("connection {peer_addr}: WebSocket session to {remote_url} established");

    let endpoint = match StreamEndpoint::from_tcp(stream) {
        Ok(endpoint) => endpoint,
        Err(e) => {
            debug!("connection {peer_addr}: gone before bridging: {e}");
            if let Err(e) = framed.close().await {
                debug!("connection {peer_addr}: close of {remote_url} session: {e}");
            }
            return;
        }
    };

    let report = ConnectionBridge::new(endpoint, framed)
        .with_idle_timeout(timeouts.idle)
        .run()
        .await;
    info!("TCP closed: {report}");
}

/// Opens the outbound WebSocket session, bounded by the dial timeout.
async fn dial_remote(remote_url: &Url, timeouts: Timeouts) -> anyhow::Result<RemoteFramedEndpoint> {
    let (ws, _response) = timeout(timeouts.dial, connect_async(remote_url.as_str()))
        .await
        .with_context(|| format!("dial to {remote_url} timed out after {:?}", timeouts.dial))?
        .with_context(|| format!("failed to connect WebSocket peer {remote_url}"))?;

    Ok(FramedEndpoint::new(remote_url.as_str(), ws))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
