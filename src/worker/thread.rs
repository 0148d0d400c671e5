//! # Dedicated dispatch thread.
//!
//! [`WorkQueue`] owns one OS thread that executes submitted [`Work`] in FIFO
//! order. Submission goes through a bounded `tokio::sync::mpsc` channel using
//! `try_send`, so producers never block; the thread parks in `blocking_recv`.
//!
//! ## Architecture
//! ```text
//! submit(work) ──try_send──► [bounded mpsc] ──blocking_recv──► thread "dispatch"
//!                                                                 └─► catch_unwind(work)
//! ```
//!
//! ## Shutdown
//! `shutdown()` stops accepting work, lets the thread finish everything already
//! queued, then joins it. Dropping the last handle stops the thread the same way
//! without joining.

use std::io;
use std::sync::{Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{run_work, Work, Worker};
use crate::config::WorkQueueConfig;
use crate::error::WorkerError;

/// Single-threaded executor backed by a dedicated OS thread.
pub struct WorkQueue {
    name: String,
    tx: mpsc::Sender<Work>,
    stop: CancellationToken,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl WorkQueue {
    /// Spawns the dispatch thread.
    ///
    /// Fails only if the OS refuses to create the thread.
    pub fn spawn(cfg: WorkQueueConfig) -> io::Result<Self> {
        let (tx, rx) = mpsc::channel::<Work>(cfg.capacity_clamped());
        let stop = CancellationToken::new();

        let name = cfg.thread_name;
        let thread = thread::Builder::new().name(name.clone()).spawn({
            let name = name.clone();
            let stop = stop.clone();
            move || worker_loop(&name, rx, &stop)
        })?;
        tracing::debug!(worker = %name, capacity = cfg.capacity, "dispatch thread started");

        Ok(Self {
            name,
            tx,
            stop,
            thread: Mutex::new(Some(thread)),
        })
    }

    /// Name of the dispatch thread.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stops accepting work and waits for queued work to finish.
    ///
    /// Idempotent. Called from the dispatch thread itself it only stops the
    /// queue; the join is skipped.
    pub fn shutdown(&self) {
        self.request_stop();

        let handle = self
            .thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(handle) = handle else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            return;
        }
        if handle.join().is_err() {
            tracing::warn!(worker = %self.name, "dispatch thread exited with a panic");
        }
        tracing::debug!(worker = %self.name, "dispatch thread stopped");
    }

    fn request_stop(&self) {
        self.stop.cancel();
        // Wake the thread if it is parked on an empty queue. A full queue
        // means it is busy and will observe the stop after the next item.
        let _ = self.tx.try_send(Box::new(|| {}));
    }
}

impl Worker for WorkQueue {
    fn submit(&self, work: Work) -> Result<(), WorkerError> {
        if self.stop.is_cancelled() {
            return Err(WorkerError::Closed);
        }
        self.tx.try_send(work).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => WorkerError::Full,
            mpsc::error::TrySendError::Closed(_) => WorkerError::Closed,
        })
    }
}

impl Drop for WorkQueue {
    fn drop(&mut self) {
        self.request_stop();
    }
}

fn worker_loop(name: &str, mut rx: mpsc::Receiver<Work>, stop: &CancellationToken) {
    while let Some(work) = rx.blocking_recv() {
        run_work(name, work);
        if stop.is_cancelled() {
            rx.close();
            while let Ok(work) = rx.try_recv() {
                run_work(name, work);
            }
            break;
        }
    }
}
