//! Error types used by the bus and its workers.
//!
//! This module defines two enums:
//!
//! - [`BusError`]: capacity and token failures reported by [`Bus`](crate::Bus) operations.
//! - [`WorkerError`]: failures to hand a unit of work to a [`Worker`](crate::Worker).
//!
//! Every failure is reported through a return value. A failed operation leaves
//! the queue and the subscriber table exactly as they were before the call.

use thiserror::Error;

/// # Errors produced by bus operations.
///
/// The taxonomy is capacity based: nothing here signals corrupted state.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// The event queue is at capacity; the event was dropped, not delayed.
    #[error("event queue full")]
    QueueFull,

    /// Every subscriber slot is occupied; nothing was registered.
    #[error("subscriber table full")]
    SubscriberTableFull,

    /// The token does not refer to a live subscription (already removed or never issued).
    #[error("invalid or stale subscription token (slot {slot})")]
    InvalidOrStaleToken {
        /// Slot index carried by the rejected token.
        slot: usize,
    },

    /// The dispatch worker refused the drain request; the event was not queued.
    #[error("dispatch worker unavailable: {0}")]
    WorkerUnavailable(#[from] WorkerError),
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use dispatchbus::BusError;
    ///
    /// assert_eq!(BusError::QueueFull.as_label(), "queue_full");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::QueueFull => "queue_full",
            BusError::SubscriberTableFull => "subscriber_table_full",
            BusError::InvalidOrStaleToken { .. } => "invalid_or_stale_token",
            BusError::WorkerUnavailable(_) => "worker_unavailable",
        }
    }
}

/// # Errors produced when submitting work to a worker.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerError {
    /// The worker's submission queue is full.
    #[error("work queue full")]
    Full,

    /// The worker has shut down and accepts no more work.
    #[error("worker closed")]
    Closed,
}

impl WorkerError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkerError::Full => "worker_full",
            WorkerError::Closed => "worker_closed",
        }
    }
}
