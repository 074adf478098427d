//! Adapter from any `std::io::Write` to a [`Sink`]

use crate::core::Sink;
use std::io::{self, Write};

/// Wraps a writer (a pipe, a socket, a `Vec<u8>`) as a sink
#[derive(Debug)]
pub struct WriterSink<W> {
    name: String,
    writer: W,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(name: impl Into<String>, writer: W) -> Self {
        Self {
            name: name.into(),
            writer,
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> Sink for WriterSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_sink_forwards() {
        let mut sink = WriterSink::new("vec", Vec::new());
        assert_eq!(sink.write(b"abc").unwrap(), 3);
        sink.flush().unwrap();
        assert_eq!(sink.name(), "vec");
        assert_eq!(sink.into_inner(), b"abc");
    }
}
