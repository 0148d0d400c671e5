//! # Step-by-step worker for tests.
//!
//! [`ManualWorker`] stores submitted work and runs it only when the caller asks,
//! on the caller's thread. Tests use it to hold the dispatch thread "stalled"
//! for as long as they need, then release it one drain at a time.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use dispatchbus::{Bus, BusConfig, ManualWorker};
//!
//! let worker = Arc::new(ManualWorker::new());
//! let bus: Bus<u32> = Bus::new(BusConfig::new(4, 4), worker.clone());
//!
//! assert!(bus.publish(1));
//! assert_eq!(worker.pending(), 1); // one drain request, nothing delivered yet
//! worker.run_until_idle();
//! assert_eq!(bus.pending_events(), 0);
//! ```

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{run_work, Work, Worker};
use crate::error::WorkerError;

#[derive(Default)]
struct State {
    queue: VecDeque<Work>,
    closed: bool,
}

/// Worker that runs submitted work only on request.
#[derive(Default)]
pub struct ManualWorker {
    state: Mutex<State>,
    capacity: Option<usize>,
}

impl ManualWorker {
    /// Unbounded manual worker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Manual worker that reports [`WorkerError::Full`] beyond `capacity` pending items.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::default(),
            capacity: Some(capacity),
        }
    }

    /// Number of submitted items not yet run.
    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    /// Runs the oldest pending item. Returns `false` if there was none.
    pub fn run_next(&self) -> bool {
        let next = self.lock().queue.pop_front();
        match next {
            Some(work) => {
                run_work("manual", work);
                true
            }
            None => false,
        }
    }

    /// Runs pending items, including ones submitted meanwhile, until none remain.
    ///
    /// Returns how many items ran.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }

    /// Rejects further submissions with [`WorkerError::Closed`]. Pending items stay runnable.
    pub fn close(&self) {
        self.lock().closed = true;
    }

    /// Accepts submissions again after [`close`](Self::close).
    pub fn reopen(&self) {
        self.lock().closed = false;
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Worker for ManualWorker {
    fn submit(&self, work: Work) -> Result<(), WorkerError> {
        let mut st = self.lock();
        if st.closed {
            return Err(WorkerError::Closed);
        }
        if self.capacity.is_some_and(|cap| st.queue.len() >= cap) {
            return Err(WorkerError::Full);
        }
        st.queue.push_back(work);
        Ok(())
    }
}
