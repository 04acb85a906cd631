//! The connection bridge: one stream endpoint, one framed endpoint, and a
//! pump in each direction between them.
//!
//! Termination is first-completion-wins.  As soon as either pump stops, for
//! any reason, the other pump is dropped mid-flight and both endpoints are
//! closed.  There is no half-close: data still in flight in the surviving
//! direction is discarded.
//!
//! ```text
//!            ┌──── Pump (stream→framed) ────┐
//! TCP ◄─────►│                              │◄─────► WebSocket
//!            └──── Pump (framed→stream) ────┘
//! ```

use std::fmt;
use std::time::Duration;

use tokio::time::timeout;
use tracing::debug;

use super::endpoint::{DuplexEndpoint, EndpointKind, EndpointWriter};
use super::pump::{Direction, IdleClock, Pump, PumpOutcome};

/// Upper bound on closing one endpoint during teardown.
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Summary of a finished bridge pair.
#[derive(Debug)]
pub struct BridgeReport {
    pub stream_peer: String,
    pub framed_peer: String,
    /// Outcome of the pump that finished first and triggered teardown.
    pub first: PumpOutcome,
}

impl fmt::Display for BridgeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} <-> {} ({} {} after {} bytes)",
            self.stream_peer,
            self.framed_peer,
            self.first.direction,
            self.first.termination,
            self.first.bytes
        )
    }
}

/// A bridge pair waiting to be run.
///
/// `S` must be the stream side and `F` the framed side; the constructor
/// checks this in debug builds.
pub struct ConnectionBridge<S, F> {
    stream: S,
    framed: F,
    idle_timeout: Option<Duration>,
}

impl<S, F> ConnectionBridge<S, F>
where
    S: DuplexEndpoint,
    F: DuplexEndpoint,
{
    pub fn new(stream: S, framed: F) -> Self {
        debug_assert_eq!(stream.kind(), EndpointKind::Stream);
        debug_assert_eq!(framed.kind(), EndpointKind::Framed);
        Self {
            stream,
            framed,
            idle_timeout: None,
        }
    }

    /// Tears the pair down once nothing has moved in either direction for
    /// `idle_timeout`.
    pub fn with_idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Runs both pumps until one finishes, then closes both endpoints.
    ///
    /// Consumes the bridge, so each endpoint is closed exactly once and no
    /// pump outlives this call.
    pub async fn run(self) -> BridgeReport {
        let stream_peer = self.stream.peer().to_string();
        let framed_peer = self.framed.peer().to_string();

        let (mut stream_rx, mut stream_tx) = self.stream.split();
        let (mut framed_rx, mut framed_tx) = self.framed.split();

        // One clock for both pumps: a one-way transfer keeps the silent
        // direction alive too, instead of each pump timing out on its own.
        let idle = self.idle_timeout.map(IdleClock::new);
        let upstream = Pump::new(Direction::StreamToFramed).with_idle_clock(idle.clone());
        let downstream = Pump::new(Direction::FramedToStream).with_idle_clock(idle);

        // Both pumps are polled in this task rather than spawned, so when one
        // finishes the other is cancelled simply by dropping its future.  Its
        // pending read is abandoned, which is fine: the pair is being torn
        // down and that data has nowhere to go.
        let first = tokio::select! {
            outcome = upstream.run(&mut stream_rx, &mut framed_tx) => outcome,
            outcome = downstream.run(&mut framed_rx, &mut stream_tx) => outcome,
        };

        debug!(
            "bridge {stream_peer} <-> {framed_peer}: {} pump ended first ({})",
            first.direction, first.termination
        );

        // Close both sides concurrently so a peer that stalls on close cannot
        // hold up the other one; each close is bounded by CLOSE_TIMEOUT.
        tokio::join!(
            close_bounded(&mut stream_tx, &stream_peer),
            close_bounded(&mut framed_tx, &framed_peer),
        );

        BridgeReport {
            stream_peer,
            framed_peer,
            first,
        }
    }
}

async fn close_bounded<W: EndpointWriter + ?Sized>(writer: &mut W, peer: &str) {
    match timeout(CLOSE_TIMEOUT, writer.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!("close {peer}: {e}"),
        Err(_) => debug!("close {peer}: timed out after {CLOSE_TIMEOUT:?}"),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
