//! Dispatch workers: the single-consumer execution facility the bus runs on.
//!
//! The bus only needs one capability from its environment: "run this callable
//! later, once, on the dispatch thread, in submission order". That capability
//! is the [`Worker`] trait. The bus references a worker but does not own it;
//! several buses (one per event type) may share the same worker.
//!
//! ## Contents
//! - [`Worker`], [`Work`] the consumed interface
//! - [`WorkQueue`] dedicated OS thread fed by a bounded queue
//! - [`TaskWorker`] the same loop as a tokio task
//! - [`ManualWorker`] deterministic test double, run step by step by the caller
//!
//! ## Quick wiring
//! ```text
//! producer ── Bus::publish ──► Worker::submit(drain) ──► [bounded queue] ──► dispatch thread
//!                                                                               └─► drain()
//! ```

mod manual;
mod task;
mod thread;

pub use manual::ManualWorker;
pub use task::TaskWorker;
pub use thread::WorkQueue;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::error::WorkerError;

/// A unit of work: a callable run exactly once on the dispatch thread.
pub type Work = Box<dyn FnOnce() + Send + 'static>;

/// Contract for dispatch workers.
///
/// ### Rules
/// - Work items run one at a time, in submission order.
/// - `submit` never runs `work` inline on the caller's thread (callers may hold locks).
/// - `submit` never blocks; a saturated or stopped worker reports [`WorkerError`].
pub trait Worker: Send + Sync + 'static {
    /// Queues `work` for later execution.
    fn submit(&self, work: Work) -> Result<(), WorkerError>;
}

/// Runs one work item, containing any panic it raises.
pub(crate) fn run_work(worker: &str, work: Work) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(work)) {
        tracing::warn!(
            worker,
            panic = %panic_message(payload.as_ref()),
            "work item panicked"
        );
    }
}

/// Extracts a printable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_variants() {
        let p = panic::catch_unwind(|| {
            panic!("static");
        })
        .unwrap_err();
        assert_eq!(panic_message(p.as_ref()), "static");

        let p = panic::catch_unwind(|| {
            panic!("formatted {}", 7);
        })
        .unwrap_err();
        assert_eq!(panic_message(p.as_ref()), "formatted 7");

        let p = panic::catch_unwind(|| {
            std::panic::panic_any(42u32);
        })
        .unwrap_err();
        assert_eq!(panic_message(p.as_ref()), "unknown panic");
    }

    #[test]
    fn test_run_work_contains_panic() {
        run_work("test", Box::new(|| panic!("boom")));
    }
}
