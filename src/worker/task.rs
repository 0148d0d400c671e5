//! # Dispatch loop as a tokio task.
//!
//! [`TaskWorker`] is the [`WorkQueue`](super::WorkQueue) loop for applications
//! that already drive a tokio runtime. Work items still run one at a time and in
//! submission order; on a multi-threaded runtime the task may migrate between
//! runtime threads, but never runs two items concurrently.
//!
//! Work items are synchronous. A long-running item stalls the runtime thread it
//! happens to run on, just as it would stall a dedicated thread.

use std::sync::{Mutex, PoisonError};

use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use super::{run_work, Work, Worker};
use crate::error::WorkerError;

const NAME: &str = "task-worker";

/// Dispatch worker running as a spawned tokio task.
pub struct TaskWorker {
    tx: mpsc::Sender<Work>,
    token: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl TaskWorker {
    /// Spawns the worker task on the current runtime.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime (as `tokio::spawn` does).
    pub fn spawn(capacity: usize) -> Self {
        Self::spawn_with_token(capacity, CancellationToken::new())
    }

    /// Spawns the worker task, stopping it when `token` is cancelled.
    ///
    /// Pass a child of the application's runtime token to tie the worker to
    /// application shutdown.
    pub fn spawn_with_token(capacity: usize, token: CancellationToken) -> Self {
        let (tx, mut rx) = mpsc::channel::<Work>(capacity.max(1));
        let stop = token.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    work = rx.recv() => match work {
                        Some(work) => run_work(NAME, work),
                        None => break,
                    },
                    _ = stop.cancelled() => {
                        rx.close();
                        while let Ok(work) = rx.try_recv() {
                            run_work(NAME, work);
                        }
                        break;
                    }
                }
            }
        });

        Self {
            tx,
            token,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Stops accepting work and waits until queued work has run.
    pub async fn shutdown(&self) {
        self.token.cancel();
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

impl Worker for TaskWorker {
    fn submit(&self, work: Work) -> Result<(), WorkerError> {
        if self.token.is_cancelled() {
            return Err(WorkerError::Closed);
        }
        self.tx.try_send(work).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => WorkerError::Full,
            mpsc::error::TrySendError::Closed(_) => WorkerError::Closed,
        })
    }
}

impl Drop for TaskWorker {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_runs_work_in_order() {
        let worker = TaskWorker::spawn(8);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = oneshot::channel();

        for i in 0..4 {
            let seen = Arc::clone(&seen);
            worker.submit(Box::new(move || seen.lock().unwrap().push(i))).unwrap();
        }
        worker.submit(Box::new(move || { let _ = tx.send(()); })).unwrap();

        tokio::time::timeout(Duration::from_secs(1), rx)
            .await
            .expect("worker should run queued work")
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3]);
        worker.shutdown().await;
    }

    #[tokio::test]
    async fn test_cancelled_token_closes_worker() {
        let token = CancellationToken::new();
        let worker = TaskWorker::spawn_with_token(4, token.child_token());
        token.cancel();
        assert_eq!(worker.submit(Box::new(|| {})), Err(WorkerError::Closed));
        worker.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_shutdown_runs_queued_work() {
        let worker = TaskWorker::spawn(8);
        let seen = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let seen = Arc::clone(&seen);
            worker.submit(Box::new(move || seen.lock().unwrap().push(i))).unwrap();
        }
        worker.shutdown().await;
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    }
}
