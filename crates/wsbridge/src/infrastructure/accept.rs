//! Accept loop shared by both bridge heads.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{error, info};

use super::error::HeadError;

/// How often the accept loop re-checks the shutdown flag while idle.
const ACCEPT_POLL: Duration = Duration::from_millis(200);

/// Binds a TCP listener, mapping failure to [`HeadError::Bind`].
pub(crate) async fn bind_listener(addr: &str) -> Result<(TcpListener, SocketAddr), HeadError> {
    let bind_err = |source| HeadError::Bind {
        addr: addr.to_string(),
        source,
    };
    let listener = TcpListener::bind(addr).await.map_err(bind_err)?;
    let local_addr = listener.local_addr().map_err(bind_err)?;
    Ok((listener, local_addr))
}

/// Accepts connections until `running` is cleared, handing each one to
/// `on_accept` without waiting on it.
///
/// `on_accept` is expected to spawn; it must not block the loop.  Accept
/// errors are logged and the loop keeps going.
pub(crate) async fn accept_until_stopped<F>(
    listener: &TcpListener,
    role: &str,
    running: &AtomicBool,
    mut on_accept: F,
) where
    F: FnMut(TcpStream, SocketAddr),
{
    loop {
        // Checked once per iteration, so a cleared flag stops the loop within
        // one ACCEPT_POLL window even when no client ever connects.
        if !running.load(Ordering::Relaxed) {
            info!("{role}: shutdown flag set; stopping accept loop");
            break;
        }

        // A bare `accept().await` would park here until the next client and
        // never see the shutdown flag; the timeout bounds that wait.
        match timeout(ACCEPT_POLL, listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => on_accept(stream, peer_addr),
            // Usually transient (e.g. EMFILE or a peer that reset before
            // accept completed); the listener itself is still usable.
            Ok(Err(e)) => error!("{role}: accept error: {e}"),
            // Nothing arrived in this poll window.
            Err(_) => {}
        }
    }
}
