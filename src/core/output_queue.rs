//! Ordered, buffered delivery to the two sinks
//!
//! Each sink owns one worker thread fed by an unbounded channel. The channel is the sink's
//! sequential chain: commands are handled strictly in the order they were sent, so the order in
//! which lines reach a sink is the order in which log calls reached the queue, whatever mix of
//! buffered and direct writes was used. The two sinks are independent and give no ordering
//! guarantee relative to each other.
//!
//! ## Buffering
//!
//! Buffered lines collect in a [`BufferedChunk`]. Reaching the high-water mark flushes
//! immediately. Below it, a flush is scheduled after an adaptive delay that shrinks as the chunk
//! fills; each sink has at most one pending deadline, and a new line can only bring it closer.
//!
//! ## Backpressure
//!
//! A chunk counts as written only when the sink has accepted every byte and been flushed.
//! `WouldBlock`, `Interrupted` and partial writes are retried after yielding, backing off up
//! to a bounded sleep, until the queue's flush timeout runs out.

use super::diagnostics::{report, DiagnosticHandler};
use super::error::{panic_message, LoggerError, Result};
use super::log_level::SinkKind;
use super::metrics::OutputMetrics;
use super::sink::Sink;
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::io::{self, ErrorKind};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Default number of buffered lines that triggers an immediate flush
pub const DEFAULT_HIGH_WATER_MARK: usize = 10;

/// Default longest time a buffered line waits before being flushed
pub const DEFAULT_MAX_LATENCY: Duration = Duration::from_millis(10);

/// Default time allowed for flushes, shutdown and a blocked sink to recover
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

const MAX_BACKOFF: Duration = Duration::from_millis(5);
const SPIN_ATTEMPTS: u32 = 3;

/// Tuning knobs of the output queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueOptions {
    pub high_water_mark: usize,
    pub max_latency: Duration,
    pub flush_timeout: Duration,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
            max_latency: DEFAULT_MAX_LATENCY,
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,
        }
    }
}

impl QueueOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines buffered before an immediate flush (at least 1)
    #[must_use = "builder methods return a new value"]
    pub fn high_water_mark(mut self, lines: usize) -> Self {
        self.high_water_mark = lines.max(1);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn max_latency(mut self, latency: Duration) -> Self {
        self.max_latency = latency;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn flush_timeout(mut self, timeout: Duration) -> Self {
        self.flush_timeout = timeout;
        self
    }
}

/// Flush delay for a chunk holding `buffered` lines
///
/// Scales linearly from `max_latency` for an empty chunk down to zero at the high-water mark.
pub fn adaptive_delay(buffered: usize, options: &QueueOptions) -> Duration {
    let mark = options.high_water_mark.max(1);
    if buffered >= mark {
        return Duration::ZERO;
    }
    let remaining = (mark - buffered) as f64 / mark as f64;
    options.max_latency.mul_f64(remaining)
}

/// Rendered lines waiting for one sink, in call order
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BufferedChunk {
    lines: Vec<Vec<u8>>,
}

impl BufferedChunk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: Vec<u8>) {
        self.lines.push(line);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Swap the contents out, leaving this chunk empty
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    /// All lines concatenated in order
    pub fn into_bytes(self) -> Vec<u8> {
        self.lines.concat()
    }
}

enum FlushAck {
    Blocking(Sender<()>),
    #[cfg(feature = "async")]
    Async(tokio::sync::oneshot::Sender<()>),
}

impl FlushAck {
    fn complete(self) {
        match self {
            FlushAck::Blocking(tx) => {
                let _ = tx.send(());
            }
            #[cfg(feature = "async")]
            FlushAck::Async(tx) => {
                let _ = tx.send(());
            }
        }
    }
}

enum Command {
    Write { bytes: Vec<u8>, buffered: bool },
    Flush(Option<FlushAck>),
    Shutdown,
}

struct Worker {
    kind: SinkKind,
    sink: Box<dyn Sink>,
    chunk: BufferedChunk,
    deadline: Option<Instant>,
    options: QueueOptions,
    metrics: Arc<OutputMetrics>,
    diagnostics: DiagnosticHandler,
}

impl Worker {
    fn run(mut self, receiver: Receiver<Command>) {
        loop {
            let command = match self.deadline {
                Some(deadline) => match receiver.recv_deadline(deadline) {
                    Ok(command) => command,
                    Err(RecvTimeoutError::Timeout) => {
                        self.metrics.record_scheduled_flush();
                        self.flush_chunk();
                        continue;
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                },
                None => match receiver.recv() {
                    Ok(command) => command,
                    Err(_) => break,
                },
            };

            match command {
                Command::Write { bytes, buffered: true } => self.buffer(bytes),
                Command::Write { bytes, buffered: false } => {
                    // Lines buffered earlier must reach the sink first
                    self.flush_chunk();
                    self.deliver(bytes, 1);
                }
                Command::Flush(ack) => {
                    if ack.is_some() {
                        self.metrics.record_forced_flush();
                    }
                    self.flush_chunk();
                    if let Some(ack) = ack {
                        ack.complete();
                    }
                }
                Command::Shutdown => break,
            }
        }

        self.flush_chunk();
    }

    fn buffer(&mut self, bytes: Vec<u8>) {
        self.chunk.push(bytes);
        if self.chunk.len() >= self.options.high_water_mark {
            self.metrics.record_immediate_flush();
            self.flush_chunk();
            return;
        }

        let at = Instant::now() + adaptive_delay(self.chunk.len(), &self.options);
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(at),
            None => at,
        });
    }

    fn flush_chunk(&mut self) {
        self.deadline = None;
        if self.chunk.is_empty() {
            return;
        }
        let chunk = self.chunk.take();
        let lines = chunk.len() as u64;
        self.deliver(chunk.into_bytes(), lines);
    }

    /// Write one unit and account for it; failures are reported and the unit is dropped
    fn deliver(&mut self, bytes: Vec<u8>, lines: u64) {
        let sink = &mut self.sink;
        let metrics = &self.metrics;
        let timeout = self.options.flush_timeout;
        let result = catch_unwind(AssertUnwindSafe(|| safe_write(sink.as_mut(), &bytes, metrics, timeout)));

        match result {
            Ok(Ok(())) => {
                self.metrics.record_written(lines);
            }
            Ok(Err(e)) => {
                self.metrics.record_failure(lines);
                report(&self.diagnostics, &LoggerError::sink_write(self.kind.as_str(), e));
            }
            Err(panic_info) => {
                self.metrics.record_failure(lines);
                report(
                    &self.diagnostics,
                    &LoggerError::worker_panic(self.kind.as_str(), panic_message(panic_info.as_ref())),
                );
            }
        }
    }
}

/// Yield first, then sleep with exponential growth up to a cap
struct Backoff {
    attempt: u32,
    deadline: Instant,
}

impl Backoff {
    fn new(timeout: Duration) -> Self {
        Self {
            attempt: 0,
            deadline: Instant::now() + timeout,
        }
    }

    /// Wait one step; `false` once the deadline has passed
    fn wait(&mut self) -> bool {
        if Instant::now() >= self.deadline {
            return false;
        }
        if self.attempt < SPIN_ATTEMPTS {
            thread::yield_now();
        } else {
            let exponent = (self.attempt - SPIN_ATTEMPTS).min(12);
            let sleep = Duration::from_micros(50u64 << exponent).min(MAX_BACKOFF);
            thread::sleep(sleep);
        }
        self.attempt += 1;
        true
    }
}

/// Write all of `bytes` to `sink` and flush it, waiting out backpressure
///
/// Returns only after the sink has accepted every byte, or with the error that stopped it.
pub fn safe_write(
    sink: &mut dyn Sink,
    bytes: &[u8],
    metrics: &OutputMetrics,
    timeout: Duration,
) -> io::Result<()> {
    let mut backoff = Backoff::new(timeout);
    let mut written = 0;

    while written < bytes.len() {
        match sink.write(&bytes[written..]) {
            Ok(0) => {
                return Err(io::Error::new(
                    ErrorKind::WriteZero,
                    format!("{} accepted no bytes", sink.name()),
                ));
            }
            Ok(n) => {
                written += n;
                // Progress restarts the wait
                backoff = Backoff::new(timeout);
                if written < bytes.len() {
                    metrics.record_backpressure();
                    if !backoff.wait() {
                        return Err(blocked_error(sink, written, bytes.len()));
                    }
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                metrics.record_backpressure();
                if !backoff.wait() {
                    return Err(blocked_error(sink, written, bytes.len()));
                }
            }
            Err(e) => return Err(e),
        }
    }

    loop {
        match sink.flush() {
            Ok(()) => return Ok(()),
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                metrics.record_backpressure();
                if !backoff.wait() {
                    return Err(blocked_error(sink, written, bytes.len()));
                }
            }
            Err(e) => return Err(e),
        }
    }
}

fn blocked_error(sink: &dyn Sink, written: usize, total: usize) -> io::Error {
    io::Error::new(
        ErrorKind::TimedOut,
        format!("{} stayed blocked after accepting {} of {} bytes", sink.name(), written, total),
    )
}

struct SinkQueue {
    kind: SinkKind,
    sender: Sender<Command>,
    handle: Mutex<Option<JoinHandle<()>>>,
    metrics: Arc<OutputMetrics>,
}

impl SinkQueue {
    fn spawn(
        kind: SinkKind,
        sink: Box<dyn Sink>,
        options: QueueOptions,
        diagnostics: DiagnosticHandler,
    ) -> Result<Self> {
        let (sender, receiver) = unbounded();
        let metrics = Arc::new(OutputMetrics::new());
        let worker = Worker {
            kind,
            sink,
            chunk: BufferedChunk::new(),
            deadline: None,
            options,
            metrics: Arc::clone(&metrics),
            diagnostics,
        };

        let handle = thread::Builder::new()
            .name(format!("spectral-{}", kind.as_str()))
            .spawn(move || worker.run(receiver))?;

        Ok(Self {
            kind,
            sender,
            handle: Mutex::new(Some(handle)),
            metrics,
        })
    }

    fn send(&self, command: Command) -> Result<()> {
        self.sender.send(command).map_err(|_| LoggerError::LoggerStopped)
    }

    /// Wait for the worker to exit; `false` if it did not within `timeout` or panicked
    fn join(&self, timeout: Duration, diagnostics: &DiagnosticHandler) -> bool {
        let Some(handle) = self.handle.lock().take() else {
            return true;
        };
        let start = Instant::now();

        loop {
            if handle.is_finished() {
                return match handle.join() {
                    Ok(()) => true,
                    Err(panic_info) => {
                        report(
                            diagnostics,
                            &LoggerError::worker_panic(self.kind.as_str(), panic_message(panic_info.as_ref())),
                        );
                        false
                    }
                };
            }

            if start.elapsed() >= timeout {
                report(diagnostics, &LoggerError::FlushTimeout { timeout });
                return false;
            }

            thread::sleep(Duration::from_millis(1));
        }
    }
}

/// Per-sink ordered delivery with buffering, adaptive flush and forced flush
///
/// # Example
///
/// ```
/// use spectral_logger::sinks::MemorySink;
/// use spectral_logger::{diagnostics, OutputQueue, QueueOptions, SinkKind};
/// use std::time::Duration;
///
/// let stdout = MemorySink::new("stdout");
/// let queue = OutputQueue::new(
///     Box::new(stdout.clone()),
///     Box::new(MemorySink::new("stderr")),
///     QueueOptions::new(),
///     diagnostics::stderr_handler(),
/// )
/// .unwrap();
///
/// queue.enqueue(SinkKind::Normal, b"first\n".to_vec(), true).unwrap();
/// queue.enqueue(SinkKind::Normal, b"second\n".to_vec(), true).unwrap();
/// queue.force_flush(Duration::from_secs(1)).unwrap();
///
/// assert_eq!(stdout.lines(), vec!["first", "second"]);
/// ```
pub struct OutputQueue {
    normal: SinkQueue,
    elevated: SinkQueue,
    options: QueueOptions,
    diagnostics: DiagnosticHandler,
    stopped: AtomicBool,
    outcome: Mutex<Option<bool>>,
}

impl OutputQueue {
    pub fn new(
        normal: Box<dyn Sink>,
        elevated: Box<dyn Sink>,
        options: QueueOptions,
        diagnostics: DiagnosticHandler,
    ) -> Result<Self> {
        Ok(Self {
            normal: SinkQueue::spawn(SinkKind::Normal, normal, options, Arc::clone(&diagnostics))?,
            elevated: SinkQueue::spawn(SinkKind::Elevated, elevated, options, Arc::clone(&diagnostics))?,
            options,
            diagnostics,
            stopped: AtomicBool::new(false),
            outcome: Mutex::new(None),
        })
    }

    fn queue(&self, kind: SinkKind) -> &SinkQueue {
        match kind {
            SinkKind::Normal => &self.normal,
            SinkKind::Elevated => &self.elevated,
        }
    }

    pub fn options(&self) -> &QueueOptions {
        &self.options
    }

    pub fn metrics(&self, kind: SinkKind) -> &OutputMetrics {
        &self.queue(kind).metrics
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Append one encoded line to `kind`'s chain; never blocks on I/O
    pub fn enqueue(&self, kind: SinkKind, bytes: Vec<u8>, buffered: bool) -> Result<()> {
        if self.is_stopped() {
            return Err(LoggerError::LoggerStopped);
        }
        let queue = self.queue(kind);
        queue.send(Command::Write { bytes, buffered })?;
        queue.metrics.record_enqueued();
        Ok(())
    }

    /// Ask both workers to flush what they hold, without waiting
    pub fn flush(&self) {
        for queue in [&self.normal, &self.elevated] {
            let _ = queue.send(Command::Flush(None));
        }
    }

    /// Flush both sinks and wait until everything enqueued before this call has been written
    pub fn force_flush(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let mut pending = Vec::with_capacity(2);

        for queue in [&self.normal, &self.elevated] {
            let (tx, rx) = bounded(1);
            // A stopped worker already drained its chain
            if queue.send(Command::Flush(Some(FlushAck::Blocking(tx)))).is_ok() {
                pending.push(rx);
            }
        }

        for rx in pending {
            match rx.recv_deadline(deadline) {
                Ok(()) => {}
                Err(RecvTimeoutError::Timeout) => return Err(LoggerError::FlushTimeout { timeout }),
                Err(RecvTimeoutError::Disconnected) => return Err(LoggerError::LoggerStopped),
            }
        }
        Ok(())
    }

    /// Awaitable flush; the returned future resolves once both sinks have drained
    ///
    /// The flush requests are sent when this is called, not when the future is first polled.
    #[cfg(feature = "async")]
    pub fn flush_async(&self) -> impl std::future::Future<Output = Result<()>> + Send + 'static {
        let mut pending = Vec::with_capacity(2);
        for queue in [&self.normal, &self.elevated] {
            let (tx, rx) = tokio::sync::oneshot::channel();
            if queue.send(Command::Flush(Some(FlushAck::Async(tx)))).is_ok() {
                pending.push(rx);
            }
        }

        async move {
            for rx in pending {
                rx.await.map_err(|_| LoggerError::LoggerStopped)?;
            }
            Ok(())
        }
    }

    /// Drain both sinks and stop the workers
    ///
    /// Returns `false` if a worker did not finish within `timeout`; later calls return the
    /// first call's result. Later enqueues fail with [`LoggerError::LoggerStopped`].
    pub fn shutdown(&self, timeout: Duration) -> bool {
        // Later calls wait for the first one and report its result
        let mut outcome = self.outcome.lock();
        if let Some(drained) = *outcome {
            return drained;
        }

        self.stopped.store(true, Ordering::Release);
        for queue in [&self.normal, &self.elevated] {
            let _ = queue.send(Command::Shutdown);
        }

        let deadline = Instant::now() + timeout;
        let normal = self.normal.join(timeout, &self.diagnostics);
        let remaining = deadline.saturating_duration_since(Instant::now());
        let elevated = self.elevated.join(remaining, &self.diagnostics);

        let drained = normal && elevated;
        *outcome = Some(drained);
        drained
    }
}

impl Drop for OutputQueue {
    fn drop(&mut self) {
        self.shutdown(self.options.flush_timeout);
    }
}

impl std::fmt::Debug for OutputQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputQueue")
            .field("options", &self.options)
            .field("stopped", &self.is_stopped())
            .field("normal", self.metrics(SinkKind::Normal))
            .field("elevated", self.metrics(SinkKind::Elevated))
            .finish()
    }
}
