//! The Duplex Endpoint capability set.
//!
//! A TCP socket hands out an unbounded byte stream; a WebSocket hands out
//! whole messages.  Both are reduced here to the same three capabilities
//! (read a chunk, write a chunk, close) so that [`crate::application::pump`]
//! and [`crate::application::bridge`] are written once for both transports.
//!
//! Endpoints are split into an owned read half and an owned write half
//! before bridging.  The two pumps of a bridge pair each own one reader and
//! the opposite endpoint's writer, so no locking is needed between them.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Which transport model an endpoint exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    /// Unbounded byte stream with no message boundaries (TCP).
    Stream,
    /// Discrete binary messages (WebSocket).
    Framed,
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointKind::Stream => f.write_str("stream"),
            EndpointKind::Framed => f.write_str("framed"),
        }
    }
}

/// One unit read from an endpoint.
///
/// `payload` may be non-empty while `end_of_stream` is set: the source
/// delivered its last bytes together with the end signal.  Pumps must
/// forward the payload before acting on the flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chunk {
    pub payload: Vec<u8>,
    pub end_of_stream: bool,
}

impl Chunk {
    /// Bytes with more to follow.
    pub fn data(payload: Vec<u8>) -> Self {
        Self {
            payload,
            end_of_stream: false,
        }
    }

    /// Final bytes of the source.
    pub fn last(payload: Vec<u8>) -> Self {
        Self {
            payload,
            end_of_stream: true,
        }
    }

    /// Clean end of stream with nothing left to forward.
    pub fn eof() -> Self {
        Self::last(Vec::new())
    }
}

/// Failure of a single endpoint read, write, or close.
#[derive(Debug, Error)]
pub enum EndpointError {
    /// The underlying socket reported an error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The WebSocket layer reported an error.
    #[error("WebSocket error: {0}")]
    WebSocket(Box<tungstenite::Error>),
}

impl From<tungstenite::Error> for EndpointError {
    fn from(e: tungstenite::Error) -> Self {
        EndpointError::WebSocket(Box::new(e))
    }
}

/// Read half of an endpoint.
#[async_trait]
pub trait EndpointReader: Send {
    /// Waits for the next chunk from the endpoint.
    ///
    /// # Errors
    ///
    /// Returns an [`EndpointError`] if the transport fails.  A clean close by
    /// the peer is *not* an error; it is reported as a chunk with
    /// `end_of_stream` set.
    async fn read_chunk(&mut self) -> Result<Chunk, EndpointError>;
}

/// Write half of an endpoint.
#[async_trait]
pub trait EndpointWriter: Send {
    /// Writes `payload` to the endpoint: all of it for a stream, as one
    /// binary message for a framed endpoint.
    async fn write_chunk(&mut self, payload: &[u8]) -> Result<(), EndpointError>;

    /// Closes the endpoint's write direction and signals the peer.
    async fn close(&mut self) -> Result<(), EndpointError>;
}

/// An endpoint that can be split into independently owned halves.
pub trait DuplexEndpoint: Send + 'static {
    type Reader: EndpointReader + 'static;
    type Writer: EndpointWriter + 'static;

    fn kind(&self) -> EndpointKind;

    /// Remote address of the endpoint, for logs.
    fn peer(&self) -> &str;

    fn split(self) -> (Self::Reader, Self::Writer);
}
