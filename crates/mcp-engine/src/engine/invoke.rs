//! Deadline-bounded handler invocation.
//!
//! A handler cannot be cancelled: when its deadline expires the worker thread
//! keeps running detached until the handler returns. [`WorkerPool`] caps the
//! workers alive at once, detached ones included, so a hung backend cannot
//! pile up threads without bound; calls beyond the cap fail fast with
//! [`FailureKind::Unavailable`](crate::FailureKind::Unavailable).

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use mcp_protocol::Payload;
use tracing::debug;

use super::DISPATCH_TARGET;
use crate::handler::{FailureKind, Handler, HandlerFailure};

const WORKER_NAME: &str = "mcp-handler";

/// Counts handler workers that have not yet returned.
#[derive(Debug)]
pub(super) struct WorkerPool {
    live: Arc<AtomicUsize>,
    limit: usize,
}

impl WorkerPool {
    pub(super) fn new(limit: usize) -> Self {
        Self {
            live: Arc::new(AtomicUsize::new(0)),
            limit: limit.max(1),
        }
    }

    pub(super) const fn limit(&self) -> usize {
        self.limit
    }

    fn admit(&self) -> Option<WorkerSlot> {
        self.live
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
                (count < self.limit).then_some(count + 1)
            })
            .ok()
            .map(|_| WorkerSlot {
                live: Arc::clone(&self.live),
            })
    }
}

/// Held by a worker for as long as its thread runs.
struct WorkerSlot {
    live: Arc<AtomicUsize>,
}

impl Drop for WorkerSlot {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Runs `handler` on a worker thread and waits at most `deadline`.
///
/// The worker owns its copy of the payload, so an invocation that outlives
/// its deadline keeps running detached and its result is dropped. A worker
/// that exits without sending (a panic) is reported as
/// [`FailureKind::Panicked`](crate::FailureKind::Panicked).
pub(super) fn invoke(
    workers: &WorkerPool,
    handler: Arc<dyn Handler>,
    payload: Payload,
    deadline: Option<Duration>,
) -> Result<Payload, HandlerFailure> {
    let Some(slot) = workers.admit() else {
        return Err(HandlerFailure::new(
            FailureKind::Unavailable,
            format!(
                "all {} handler workers are busy, some past their deadline",
                workers.limit()
            ),
        ));
    };

    let (sender, receiver) = mpsc::sync_channel(1);
    let spawned = thread::Builder::new()
        .name(WORKER_NAME.to_owned())
        .spawn(move || {
            let outcome = handler.handle(&payload);
            drop(slot);
            if sender.send(outcome).is_err() {
                debug!(target: DISPATCH_TARGET, "discarded handler result after deadline");
            }
        });
    if let Err(error) = spawned {
        return Err(HandlerFailure::internal(format!(
            "failed to start handler worker: {error}"
        )));
    }

    let Some(limit) = deadline else {
        return receiver
            .recv()
            .unwrap_or_else(|_| Err(HandlerFailure::panicked()));
    };
    match receiver.recv_timeout(limit) {
        Ok(outcome) => outcome,
        Err(RecvTimeoutError::Timeout) => Err(HandlerFailure::timeout(limit)),
        Err(RecvTimeoutError::Disconnected) => Err(HandlerFailure::panicked()),
    }
}
