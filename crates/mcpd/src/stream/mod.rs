//! Newline-delimited JSON transport.
//!
//! Each inbound line carries one envelope and produces one response line.
//! Lines are read on the calling thread and dispatched on scoped worker
//! threads, at most `max_in_flight` at a time, so responses may be written in
//! a different order from their requests; clients correlate on `response_to`.
//!
//! A line longer than `max_message_bytes` is discarded without being buffered
//! and answered with an `invalid_message` error. Blank lines are skipped.

use std::io::{self, BufRead, Read, Write};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::thread;

use mcp_config::Config;
use mcp_engine::{DispatchEngine, DispatchError};
use mcp_protocol::Envelope;
use thiserror::Error;
use tracing::{debug, warn};

const STREAM_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::stream");

/// Limits applied by [`serve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamOptions {
    max_message_bytes: usize,
    max_in_flight: usize,
}

impl StreamOptions {
    /// Creates options; `max_in_flight` is raised to at least one.
    #[must_use]
    pub const fn new(max_message_bytes: usize, max_in_flight: usize) -> Self {
        Self {
            max_message_bytes,
            max_in_flight: if max_in_flight == 0 { 1 } else { max_in_flight },
        }
    }

    /// Reads the limits from the daemon configuration.
    #[must_use]
    pub const fn from_config(config: &Config) -> Self {
        Self::new(config.max_message_bytes(), config.max_in_flight())
    }

    /// Longest accepted line, excluding the terminator.
    #[must_use]
    pub const fn max_message_bytes(&self) -> usize {
        self.max_message_bytes
    }

    /// Number of messages dispatched concurrently.
    #[must_use]
    pub const fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }
}

/// Errors that terminate a stream.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Reading from the inbound stream failed.
    #[error("failed to read inbound message: {0}")]
    Read(#[source] io::Error),
    /// Writing a response failed.
    #[error("failed to write response: {0}")]
    Write(#[source] io::Error),
    /// A response could not be encoded.
    #[error("failed to encode response: {0}")]
    Encode(#[source] serde_json::Error),
    /// A worker panicked while holding a shared lock.
    #[error("{resource} lock poisoned")]
    Poisoned {
        /// Name of the poisoned resource.
        resource: &'static str,
    },
}

/// Counts reported when a stream ends cleanly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamSummary {
    /// Lines answered with a response, including error responses.
    pub answered: usize,
    /// Blank lines ignored.
    pub skipped: usize,
    /// Lines rejected for exceeding the size limit.
    pub oversized: usize,
}

/// Serves `reader` until end of input, writing responses to `writer`.
///
/// Returns once every dispatched message has been answered.
///
/// # Errors
///
/// Returns a [`StreamError`] if the input cannot be read or a response cannot
/// be written. Messages already dispatched are still allowed to finish.
pub fn serve<R, W>(
    engine: &DispatchEngine,
    mut reader: R,
    writer: W,
    options: StreamOptions,
) -> Result<StreamSummary, StreamError>
where
    R: BufRead,
    W: Write + Send,
{
    let sink = ResponseSink::new(writer);
    let limiter = InFlight::new(options.max_in_flight());
    let mut summary = StreamSummary::default();

    thread::scope(|scope| {
        loop {
            sink.check()?;
            let Some(inbound) = read_message(&mut reader, options.max_message_bytes())
                .map_err(StreamError::Read)?
            else {
                break;
            };

            match inbound {
                Inbound::TooLarge(size) => {
                    summary.oversized += 1;
                    let error = DispatchError::too_large(size, options.max_message_bytes());
                    warn!(target: STREAM_TARGET, %error, "rejected oversized message");
                    sink.send(&DispatchEngine::reject(None, &error))?;
                    summary.answered += 1;
                }
                Inbound::Line(line) if line.trim_ascii().is_empty() => summary.skipped += 1,
                Inbound::Line(line) => {
                    let permit = limiter.acquire()?;
                    let (sink_ref, engine_ref) = (&sink, engine);
                    scope.spawn(move || {
                        let response = engine_ref.process_line(&line);
                        if let Err(error) = sink_ref.send(&response) {
                            sink_ref.record(error);
                        }
                        drop(permit);
                    });
                    summary.answered += 1;
                }
            }
        }
        Ok::<(), StreamError>(())
    })?;

    sink.check()?;
    debug!(
        target: STREAM_TARGET,
        answered = summary.answered,
        skipped = summary.skipped,
        oversized = summary.oversized,
        "stream closed"
    );
    Ok(summary)
}

enum Inbound {
    Line(Vec<u8>),
    TooLarge(usize),
}

/// Reads one line of at most `max` bytes, excluding the terminator.
///
/// Returns `Ok(None)` at end of input. An over-long line is consumed up to and
/// including its terminator without being retained.
fn read_message<R: BufRead>(reader: &mut R, max: usize) -> io::Result<Option<Inbound>> {
    let mut line = Vec::new();
    let limit = u64::try_from(max).unwrap_or(u64::MAX).saturating_add(1);
    let read = reader.by_ref().take(limit).read_until(b'\n', &mut line)?;
    if read == 0 {
        return Ok(None);
    }
    if line.last() == Some(&b'\n') {
        line.pop();
        return Ok(Some(Inbound::Line(line)));
    }
    if line.len() <= max {
        return Ok(Some(Inbound::Line(line)));
    }
    let rest = reader.skip_until(b'\n')?;
    Ok(Some(Inbound::TooLarge(line.len().saturating_add(rest))))
}

/// Serialises responses onto the shared writer and remembers the first
/// failure reported by a worker.
struct ResponseSink<W> {
    writer: Mutex<W>,
    failure: Mutex<Option<StreamError>>,
}

impl<W: Write> ResponseSink<W> {
    const fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            failure: Mutex::new(None),
        }
    }

    fn send(&self, response: &Envelope) -> Result<(), StreamError> {
        let mut encoded = serde_json::to_vec(response).map_err(StreamError::Encode)?;
        encoded.push(b'\n');
        let mut writer = self.writer.lock().map_err(|_| StreamError::Poisoned {
            resource: "response writer",
        })?;
        writer.write_all(&encoded).map_err(StreamError::Write)?;
        writer.flush().map_err(StreamError::Write)
    }

    fn record(&self, error: StreamError) {
        warn!(target: STREAM_TARGET, %error, "response delivery failed");
        if let Ok(mut slot) = self.failure.lock()
            && slot.is_none()
        {
            *slot = Some(error);
        }
    }

    fn check(&self) -> Result<(), StreamError> {
        let mut slot = self.failure.lock().map_err(|_| StreamError::Poisoned {
            resource: "stream failure",
        })?;
        slot.take().map_or(Ok(()), Err)
    }
}

/// Counting gate bounding concurrent dispatches.
struct InFlight {
    active: Mutex<usize>,
    released: Condvar,
    limit: usize,
}

impl InFlight {
    const fn new(limit: usize) -> Self {
        Self {
            active: Mutex::new(0),
            released: Condvar::new(),
            limit,
        }
    }

    fn acquire(&self) -> Result<Permit<'_>, StreamError> {
        let poisoned = |_| StreamError::Poisoned {
            resource: "in-flight counter",
        };
        let guard = self.active.lock().map_err(poisoned)?;
        let mut active: MutexGuard<'_, usize> = self
            .released
            .wait_while(guard, |count| *count >= self.limit)
            .map_err(poisoned)?;
        *active += 1;
        Ok(Permit { gate: self })
    }
}

struct Permit<'a> {
    gate: &'a InFlight,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if let Ok(mut active) = self.gate.active.lock() {
            *active = active.saturating_sub(1);
        }
        self.gate.released.notify_one();
    }
}
