//! WebSocket side of a bridge pair.
//!
//! Every outgoing chunk becomes exactly one binary message.  Incoming binary
//! and text messages are both delivered as their raw payload bytes; control
//! frames (ping/pong) are handled by tungstenite and skipped here.

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::WebSocketStream;

use crate::application::endpoint::{
    Chunk, DuplexEndpoint, EndpointError, EndpointKind, EndpointReader, EndpointWriter,
};

/// A message-framed endpoint over an established WebSocket session.
pub struct FramedEndpoint<S> {
    peer: String,
    ws: WebSocketStream<S>,
}

impl<S> FramedEndpoint<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(peer: impl Into<String>, ws: WebSocketStream<S>) -> Self {
        Self {
            peer: peer.into(),
            ws,
        }
    }

    /// Sends a close frame without ever bridging this endpoint.
    ///
    /// Used when the outbound leg of a session could not be established.
    pub async fn close(mut self) -> Result<(), EndpointError> {
        match self.ws.close(None).await {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl<S> DuplexEndpoint for FramedEndpoint<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    type Reader = FramedReader<S>;
    type Writer = FramedWriter<S>;

    fn kind(&self) -> EndpointKind {
        EndpointKind::Framed
    }

    fn peer(&self) -> &str {
        &self.peer
    }

    fn split(self) -> (Self::Reader, Self::Writer) {
        let (sink, stream) = self.ws.split();
        (FramedReader { inner: stream }, FramedWriter { inner: sink })
    }
}

/// Read half of a [`FramedEndpoint`].
pub struct FramedReader<S> {
    inner: SplitStream<WebSocketStream<S>>,
}

#[async_trait]
impl<S> EndpointReader for FramedReader<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn read_chunk(&mut self) -> Result<Chunk, EndpointError> {
        loop {
            match self.inner.next().await {
                Some(Ok(WsMessage::Binary(payload))) => return Ok(Chunk::data(payload)),
                Some(Ok(WsMessage::Text(text))) => return Ok(Chunk::data(text.into_bytes())),
                Some(Ok(WsMessage::Close(_))) | None => return Ok(Chunk::eof()),
                Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_))) => {}
                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) => {
                    return Ok(Chunk::eof())
                }
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }
}

/// Write half of a [`FramedEndpoint`].
pub struct FramedWriter<S> {
    inner: SplitSink<WebSocketStream<S>, WsMessage>,
}

#[async_trait]
impl<S> EndpointWriter for FramedWriter<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn write_chunk(&mut self, payload: &[u8]) -> Result<(), EndpointError> {
        self.inner.send(WsMessage::Binary(payload.to_vec())).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), EndpointError> {
        match self.inner.close().await {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
