//! Sink implementations

pub mod console;
pub mod memory;
pub mod writer;

pub use console::{ConsoleSink, Stream};
pub use memory::MemorySink;
pub use writer::WriterSink;

pub use crate::core::Sink;
