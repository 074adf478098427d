//! In-memory sink for tests and embedding

use crate::core::Sink;
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;

/// Captures everything written to it
///
/// Clones share one buffer, so a test can keep a handle while the logger owns another.
///
/// ```
/// use spectral_logger::sinks::MemorySink;
/// use spectral_logger::Sink;
///
/// let capture = MemorySink::new("stdout");
/// let mut sink = capture.clone();
/// sink.write(b"one\ntwo\n").unwrap();
///
/// assert_eq!(capture.lines(), vec!["one", "two"]);
/// ```
#[derive(Debug, Clone)]
pub struct MemorySink {
    name: String,
    buffer: Arc<Mutex<Vec<u8>>>,
    flushes: Arc<Mutex<u64>>,
}

impl MemorySink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            buffer: Arc::new(Mutex::new(Vec::new())),
            flushes: Arc::new(Mutex::new(0)),
        }
    }

    /// Raw bytes written so far
    pub fn bytes(&self) -> Vec<u8> {
        self.buffer.lock().clone()
    }

    /// Written bytes decoded as UTF-8 (lossy)
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }

    /// Written text split into lines, without terminators
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.lock().is_empty()
    }

    /// Number of times the sink was flushed
    pub fn flush_count(&self) -> u64 {
        *self.flushes.lock()
    }

    pub fn clear(&self) {
        self.buffer.lock().clear();
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new("memory")
    }
}

impl Sink for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        *self.flushes.lock() += 1;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
