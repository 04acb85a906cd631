//! TCP side of a bridge pair.
//!
//! TCP is a byte stream: one `read()` may return anything from a single byte
//! up to the buffer size, with no relationship to how the peer wrote it.
//! Each read becomes one [`Chunk`]; the framed side then sends it as one
//! WebSocket message.

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use crate::application::endpoint::{
    Chunk, DuplexEndpoint, EndpointError, EndpointKind, EndpointReader, EndpointWriter,
};
use crate::domain::BUFFER_BYTES;

/// A byte-stream endpoint over any async reader/writer pair.
pub struct StreamEndpoint<R, W> {
    peer: String,
    reader: R,
    writer: W,
}

impl StreamEndpoint<OwnedReadHalf, OwnedWriteHalf> {
    /// Wraps a connected TCP socket.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket's peer address cannot be read (the
    /// connection is already gone).
    pub fn from_tcp(stream: TcpStream) -> std::io::Result<Self> {
        let peer = stream.peer_addr()?.to_string();
        let (reader, writer) = stream.into_split();
        Ok(Self::new(peer, reader, writer))
    }
}

impl<R, W> StreamEndpoint<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(peer: impl Into<String>, reader: R, writer: W) -> Self {
        Self {
            peer: peer.into(),
            reader,
            writer,
        }
    }
}

impl<R, W> DuplexEndpoint for StreamEndpoint<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    type Reader = StreamReader<R>;
    type Writer = StreamWriter<W>;

    fn kind(&self) -> EndpointKind {
        EndpointKind::Stream
    }

    fn peer(&self) -> &str {
        &self.peer
    }

    fn split(self) -> (Self::Reader, Self::Writer) {
        (
            StreamReader {
                inner: self.reader,
                buf: vec![0u8; BUFFER_BYTES],
            },
            StreamWriter { inner: self.writer },
        )
    }
}

/// Read half of a [`StreamEndpoint`].
pub struct StreamReader<R> {
    inner: R,
    buf: Vec<u8>,
}

#[async_trait]
impl<R> EndpointReader for StreamReader<R>
where
    R: AsyncRead + Unpin + Send,
{
    async fn read_chunk(&mut self) -> Result<Chunk, EndpointError> {
        let n = self.inner.read(&mut self.buf).await?;
        if n == 0 {
            return Ok(Chunk::eof());
        }
        Ok(Chunk::data(self.buf[..n].to_vec()))
    }
}

/// Write half of a [`StreamEndpoint`].
pub struct StreamWriter<W> {
    inner: W,
}

#[async_trait]
impl<W> EndpointWriter for StreamWriter<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn write_chunk(&mut self, payload: &[u8]) -> Result<(), EndpointError> {
        self.inner.write_all(payload).await?;
        Ok(())
    }

    /// Sends FIN.  The socket itself is released once both halves drop.
    async fn close(&mut self) -> Result<(), EndpointError> {
        self.inner.shutdown().await?;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::pump::{Direction, Pump, Termination};
    use crate::application::test_support::RecordingWriter;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn test_read_returns_bytes_then_eof() {
        // Arrange
        let reader = Builder::new().read(b"hello").build();
        let writer = Builder::new().build();
        let (mut rx, _tx) = StreamEndpoint::new("peer", reader, writer).split();

        // Act / Assert
        assert_eq!(rx.read_chunk().await.unwrap(), Chunk::data(b"hello".to_vec()));
        assert_eq!(rx.read_chunk().await.unwrap(), Chunk::eof());
    }

    #[tokio::test]
    async fn test_single_8192_byte_write_is_one_chunk() {
        let data = vec![7u8; BUFFER_BYTES];
        let reader = Builder::new().read(&data).build();
        let (mut rx, _tx) = StreamEndpoint::new("peer", reader, Builder::new().build()).split();
        let mut sink = RecordingWriter::default();

        let outcome = Pump::new(Direction::StreamToFramed).run(&mut rx, &mut sink).await;

        assert!(matches!(outcome.termination, Termination::SourceClosed));
        assert_eq!(outcome.chunks, 1);
        assert_eq!(sink.log.lock().unwrap().chunks[0].len(), 8192);
    }

    #[tokio::test]
    async fn test_8193_bytes_split_into_two_chunks_that_reassemble() {
        // Arrange: one 8193-byte segment with a recognisable pattern.
        let data: Vec<u8> = (0..8193u32).map(|i| (i % 251) as u8).collect();
        let reader = Builder::new().read(&data).build();
        let (mut rx, _tx) = StreamEndpoint::new("peer", reader, Builder::new().build()).split();
        let mut sink = RecordingWriter::default();

        // Act
        let outcome = Pump::new(Direction::StreamToFramed).run(&mut rx, &mut sink).await;

        // Assert
        assert_eq!(outcome.chunks, 2);
        assert_eq!(outcome.bytes, 8193);
        let log = sink.log.lock().unwrap();
        assert_eq!(log.chunks[0].len(), 8192);
        assert_eq!(log.chunks[1].len(), 1);
        assert_eq!(log.concatenated(), data);
    }

    #[tokio::test]
    async fn test_write_chunk_writes_all_bytes() {
        let writer = Builder::new().write(b"abc").write(b"def").build();
        let (_rx, mut tx) = StreamEndpoint::new("peer", Builder::new().build(), writer).split();

        tx.write_chunk(b"abc").await.unwrap();
        tx.write_chunk(b"def").await.unwrap();
    }

    #[tokio::test]
    async fn test_read_error_surfaces_as_io_error() {
        let reader = Builder::new()
            .read_error(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "reset",
            ))
            .build();
        let (mut rx, _tx) = StreamEndpoint::new("peer", reader, Builder::new().build()).split();

        let err = rx.read_chunk().await.unwrap_err();

        assert!(matches!(err, EndpointError::Io(ref e) if e.kind() == std::io::ErrorKind::ConnectionReset));
    }

    #[tokio::test]
    async fn test_endpoint_reports_kind_and_peer() {
        let ep = StreamEndpoint::new("127.0.0.1:5000", Builder::new().build(), Builder::new().build());
        assert_eq!(ep.kind(), EndpointKind::Stream);
        assert_eq!(ep.peer(), "127.0.0.1:5000");
    }
}
