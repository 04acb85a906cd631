//! Unidirectional forwarding between two endpoints.
//!
//! A [`Pump`] reads chunks from one endpoint and writes them to another until
//! the source ends, either side fails, or the optional idle deadline expires.
//! The idle deadline is an [`IdleClock`] that both pumps of a bridge pair
//! share, so it only fires when neither direction has moved.
//! It never logs; it returns a [`PumpOutcome`] describing why it stopped and
//! lets the caller decide how loud to be about it.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::{timeout_at, Instant};

use super::endpoint::{EndpointError, EndpointReader, EndpointWriter};

/// Direction a pump moves data in, relative to the bridge pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// TCP bytes → WebSocket messages.
    StreamToFramed,
    /// WebSocket message payloads → TCP bytes.
    FramedToStream,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::StreamToFramed => f.write_str("stream→framed"),
            Direction::FramedToStream => f.write_str("framed→stream"),
        }
    }
}

/// Why a pump stopped.
#[derive(Debug)]
pub enum Termination {
    /// The source reported a clean end of stream.
    SourceClosed,
    /// Reading from the source failed.
    ReadFailed(EndpointError),
    /// Writing to the destination failed.
    WriteFailed(EndpointError),
    /// Nothing was forwarded in either direction within the idle deadline.
    IdleTimeout(Duration),
}

impl Termination {
    /// `true` for an orderly end of the source.
    pub fn is_clean(&self) -> bool {
        matches!(self, Termination::SourceClosed)
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::SourceClosed => f.write_str("source closed"),
            Termination::ReadFailed(e) => write!(f, "read failed: {e}"),
            Termination::WriteFailed(e) => write!(f, "write failed: {e}"),
            Termination::IdleTimeout(d) => write!(f, "idle for {d:?}"),
        }
    }
}

/// Result of one finished pump.
#[derive(Debug)]
pub struct PumpOutcome {
    pub direction: Direction,
    /// Payload bytes successfully written to the destination.
    pub bytes: u64,
    /// Number of successful destination writes (one per forwarded chunk).
    pub chunks: u64,
    pub termination: Termination,
}

/// Last-activity timestamp shared by the pumps of one bridge pair.
///
/// Clones share the same timestamp.  Every forwarded chunk calls
/// [`touch`](Self::touch); a pump waiting on its source only gives up once
/// `limit` has passed since the most recent touch from either pump.
#[derive(Debug, Clone)]
pub struct IdleClock {
    limit: Duration,
    last_activity: Arc<Mutex<Instant>>,
}

impl IdleClock {
    /// Starts the clock now.
    pub fn new(limit: Duration) -> Self {
        Self {
            limit,
            last_activity: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// Records activity at the current instant.
    pub fn touch(&self) {
        *self
            .last_activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    fn deadline(&self) -> Instant {
        *self
            .last_activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            + self.limit
    }

    /// Drives `fut` until it completes or the shared deadline passes.
    ///
    /// `fut` stays pinned across deadline checks, so a read that is merely
    /// slow is never cancelled while the other direction keeps the pair
    /// alive.
    async fn watch<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::pin!(fut);
        loop {
            match timeout_at(self.deadline(), &mut fut).await {
                Ok(output) => return Some(output),
                // The other pump may have touched the clock while we slept.
                Err(_) if self.deadline() > Instant::now() => continue,
                Err(_) => return None,
            }
        }
    }
}

/// A unidirectional forwarder.
#[derive(Debug, Clone)]
pub struct Pump {
    direction: Direction,
    idle: Option<IdleClock>,
}

impl Pump {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            idle: None,
        }
    }

    /// Ends the pump once `clock` reports no activity for its limit;
    /// `None` waits indefinitely.
    pub fn with_idle_clock(mut self, clock: Option<IdleClock>) -> Self {
        self.idle = clock;
        self
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Forwards from `source` to `sink` until termination.
    ///
    /// Each chunk's payload is written before its end-of-stream flag is
    /// checked, so bytes delivered together with EOF are never dropped.
    /// Empty payloads are not written.
    pub async fn run<R, W>(&self, source: &mut R, sink: &mut W) -> PumpOutcome
    where
        R: EndpointReader + ?Sized,
        W: EndpointWriter + ?Sized,
    {
        let mut bytes = 0u64;
        let mut chunks = 0u64;

        let termination = loop {
            let read = match &self.idle {
                Some(clock) => match clock.watch(source.read_chunk()).await {
                    Some(read) => read,
                    None => break Termination::IdleTimeout(clock.limit()),
                },
                None => source.read_chunk().await,
            };

            let chunk = match read {
                Ok(chunk) => chunk,
                Err(e) => break Termination::ReadFailed(e),
            };

            if !chunk.payload.is_empty() {
                if let Err(e) = sink.write_chunk(&chunk.payload).await {
                    break Termination::WriteFailed(e);
                }
                bytes += chunk.payload.len() as u64;
                chunks += 1;
                if let Some(clock) = &self.idle {
                    clock.touch();
                }
            }

            if chunk.end_of_stream {
                break Termination::SourceClosed;
            }
        };

        PumpOutcome {
            direction: self.direction,
            bytes,
            chunks,
            termination,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
