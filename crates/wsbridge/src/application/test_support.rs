//! Hand-written endpoint doubles shared by the pump and bridge tests.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::endpoint::{
    Chunk, DuplexEndpoint, EndpointError, EndpointKind, EndpointReader, EndpointWriter,
};

/// Reader that replays a fixed script, then either reports EOF or hangs.
pub(crate) struct ScriptedReader {
    script: VecDeque<Result<Chunk, EndpointError>>,
    hang_when_done: bool,
    pace: Option<Duration>,
}

impl ScriptedReader {
    pub(crate) fn new(script: Vec<Result<Chunk, EndpointError>>) -> Self {
        Self {
            script: script.into(),
            hang_when_done: false,
            pace: None,
        }
    }

    /// Waits `pace` before each scripted step.
    pub(crate) fn paced(mut self, pace: Duration) -> Self {
        self.pace = Some(pace);
        self
    }

    /// Reader that never produces anything (a silent but open peer).
    pub(crate) fn silent() -> Self {
        Self::new(Vec::new()).hanging()
    }

    pub(crate) fn hanging(mut self) -> Self {
        self.hang_when_done = true;
        self
    }
}

#[async_trait]
impl EndpointReader for ScriptedReader {
    async fn read_chunk(&mut self) -> Result<Chunk, EndpointError> {
        if let (Some(pace), false) = (self.pace, self.script.is_empty()) {
            tokio::time::sleep(pace).await;
        }
        match self.script.pop_front() {
            Some(step) => step,
            None if self.hang_when_done => std::future::pending().await,
            None => Ok(Chunk::eof()),
        }
    }
}

/// Everything a [`RecordingWriter`] observed.
#[derive(Debug, Default)]
pub(crate) struct WriterLog {
    pub(crate) chunks: Vec<Vec<u8>>,
    pub(crate) closes: usize,
}

impl WriterLog {
    pub(crate) fn concatenated(&self) -> Vec<u8> {
        self.chunks.concat()
    }
}

/// Writer that records chunks and closes, optionally failing after `n` writes.
#[derive(Clone, Default)]
pub(crate) struct RecordingWriter {
    pub(crate) log: Arc<Mutex<WriterLog>>,
    fail_after: Option<usize>,
}

impl RecordingWriter {
    pub(crate) fn failing_after(writes: usize) -> Self {
        Self {
            fail_after: Some(writes),
            ..Self::default()
        }
    }
}

#[async_trait]
impl EndpointWriter for RecordingWriter {
    async fn write_chunk(&mut self, payload: &[u8]) -> Result<(), EndpointError> {
        let mut log = self.log.lock().unwrap();
        if self.fail_after.is_some_and(|n| log.chunks.len() >= n) {
            return Err(broken_pipe());
        }
        log.chunks.push(payload.to_vec());
        Ok(())
    }

    async fn close(&mut self) -> Result<(), EndpointError> {
        self.log.lock().unwrap().closes += 1;
        Ok(())
    }
}

/// Endpoint assembled from a scripted reader and a recording writer.
pub(crate) struct ScriptedEndpoint {
    pub(crate) kind: EndpointKind,
    pub(crate) reader: ScriptedReader,
    pub(crate) writer: RecordingWriter,
}

impl DuplexEndpoint for ScriptedEndpoint {
    type Reader = ScriptedReader;
    type Writer = RecordingWriter;

    fn kind(&self) -> EndpointKind {
        self.kind
    }

    fn peer(&self) -> &str {
        match self.kind {
            EndpointKind::Stream => "tcp-peer",
            EndpointKind::Framed => "ws-peer",
        }
    }

    fn split(self) -> (Self::Reader, Self::Writer) {
        (self.reader, self.writer)
    }
}

pub(crate) fn broken_pipe() -> EndpointError {
    EndpointError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "injected failure"))
}
