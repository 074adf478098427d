//! Sink trait for output destinations

use std::io;

/// A text target the output queue writes encoded lines to
///
/// Follows the `std::io::Write` contract: `write` may accept only part of the buffer, and may
/// return `ErrorKind::WouldBlock` when the target cannot take more data right now. The queue
/// retries until every byte is accepted before it considers a write complete.
pub trait Sink: Send {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;
    fn flush(&mut self) -> io::Result<()>;
    fn name(&self) -> &str;
}
