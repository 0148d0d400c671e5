//! # Construction-time configuration.
//!
//! Provides [`BusConfig`] for sizing a [`Bus`](crate::Bus) and [`WorkQueueConfig`]
//! for the dedicated dispatch thread ([`WorkQueue`](crate::WorkQueue)).
//!
//! Capacities are fixed when the bus is built and never resized afterwards.
//!
//! ## Sentinel values
//! - `queue_capacity = 0` → clamped to 1
//! - `max_subscribers = 0` → clamped to 1
//! - `capacity = 0` (work queue) → clamped to 1

/// Sizing of a single bus instance.
///
/// ## Field semantics
/// - `queue_capacity`: pending events held before `publish` starts dropping
/// - `max_subscribers`: number of subscriber slots
///
/// ## Notes
/// All fields are public. Use the clamped accessors instead of reading the
/// fields directly when allocating storage.
#[derive(Clone, Debug)]
pub struct BusConfig {
    /// Maximum number of events waiting for delivery.
    ///
    /// When the queue is full, `publish` reports the event as lost.
    pub queue_capacity: usize,

    /// Maximum number of simultaneously registered subscribers.
    pub max_subscribers: usize,
}

impl BusConfig {
    /// Creates a config with explicit capacities.
    pub fn new(queue_capacity: usize, max_subscribers: usize) -> Self {
        Self {
            queue_capacity,
            max_subscribers,
        }
    }

    /// Returns the queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn queue_capacity_clamped(&self) -> usize {
        self.queue_capacity.max(1)
    }

    /// Returns the subscriber capacity clamped to a minimum of 1.
    #[inline]
    pub fn max_subscribers_clamped(&self) -> usize {
        self.max_subscribers.max(1)
    }
}

impl Default for BusConfig {
    /// Default configuration:
    ///
    /// - `queue_capacity = 16`
    /// - `max_subscribers = 8`
    fn default() -> Self {
        Self {
            queue_capacity: 16,
            max_subscribers: 8,
        }
    }
}

/// Settings for the dedicated dispatch thread.
#[derive(Clone, Debug)]
pub struct WorkQueueConfig {
    /// Number of submitted work items that may wait before `submit` reports `Full`.
    pub capacity: usize,

    /// Name given to the OS thread (shows up in panics and debuggers).
    pub thread_name: String,
}

impl WorkQueueConfig {
    /// Returns the submission capacity clamped to a minimum of 1.
    #[inline]
    pub fn capacity_clamped(&self) -> usize {
        self.capacity.max(1)
    }
}

impl Default for WorkQueueConfig {
    /// Default configuration:
    ///
    /// - `capacity = 64`
    /// - `thread_name = "dispatch"`
    fn default() -> Self {
        Self {
            capacity: 64,
            thread_name: "dispatch".to_string(),
        }
    }
}
