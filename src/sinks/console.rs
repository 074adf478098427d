//! Console sink implementation

use crate::core::{Sink, SinkKind};
use std::io::{self, Write};

/// Standard stream a [`ConsoleSink`] writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl From<SinkKind> for Stream {
    fn from(kind: SinkKind) -> Self {
        match kind {
            SinkKind::Normal => Stream::Stdout,
            SinkKind::Elevated => Stream::Stderr,
        }
    }
}

/// Writes to the process stdout or stderr
///
/// Each write locks the stream for its duration, so output from other code in the process
/// never lands in the middle of a chunk.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleSink {
    stream: Stream,
}

impl ConsoleSink {
    pub fn new(stream: Stream) -> Self {
        Self { stream }
    }

    pub fn stdout() -> Self {
        Self::new(Stream::Stdout)
    }

    pub fn stderr() -> Self {
        Self::new(Stream::Stderr)
    }

    /// Default console target for a sink kind
    pub fn for_kind(kind: SinkKind) -> Self {
        Self::new(kind.into())
    }

    pub fn stream(&self) -> Stream {
        self.stream
    }
}

impl Sink for ConsoleSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.stream {
            Stream::Stdout => io::stdout().lock().write(buf),
            Stream::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.stream {
            Stream::Stdout => io::stdout().flush(),
            Stream::Stderr => io::stderr().flush(),
        }
    }

    fn name(&self) -> &str {
        match self.stream {
            Stream::Stdout => "stdout",
            Stream::Stderr => "stderr",
        }
    }
}
