//! # Bounded publish/subscribe bus.
//!
//! [`Bus`] owns a fixed-capacity [`EventQueue`] and a fixed-capacity
//! [`SubscriberTable`] behind **one** mutex, and hands delivery off to an
//! injected [`Worker`]. Producers on any thread call `publish`; subscribers
//! only ever run on the worker.
//!
//! ## Architecture
//! ```text
//! Producers (any thread):              Dispatch thread (worker):
//!   sampler ──┐
//!   buttons ──┼── publish(E) ──► [queue] ─── drain ──► slot 0 ─► slot 1 ─► … ─► slot N
//!   timers  ──┘      │                          │
//!                    └─ submit(drain) ──────────┘ re-arms itself while events remain
//! ```
//!
//! ## Rules
//! - **Non-blocking**: `publish`/`subscribe`/`unsubscribe` take the lock for
//!   bookkeeping only and never wait on subscribers.
//! - **Best-effort publish**: a full queue drops the event and `publish` returns `false`.
//! - **One drain in flight**: at most one drain request is outstanding per bus.
//! - **Global FIFO**: events are delivered in the order their `push` won the lock.
//! - **No interleaving**: one event reaches every subscriber before the next starts.
//! - **Subscriber order**: ascending slot index.
//! - **Re-entrant**: subscribers may call `publish`/`subscribe`/`unsubscribe`.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::SubscriptionToken;
use crate::config::BusConfig;
use crate::error::{BusError, WorkerError};
use crate::storage::{EventQueue, Lent, SubscriberTable};
use crate::subscribers::Subscribe;
use crate::worker::Worker;

pub(super) type BoxedSubscriber<E> = Box<dyn Subscribe<E>>;

/// Everything guarded by the bus lock.
pub(super) struct State<E> {
    pub queue: EventQueue<E>,
    pub table: SubscriberTable<BoxedSubscriber<E>>,
    /// Set while a drain request is queued on, or running on, the worker.
    pub drain_scheduled: bool,
    /// Delivery buffer reused by every drain; sized for the whole table.
    pub scratch: Vec<Lent<BoxedSubscriber<E>>>,
}

pub(super) struct Inner<E> {
    state: Mutex<State<E>>,
    worker: Arc<dyn Worker>,
}

impl<E> Inner<E>
where
    E: Clone + Send + 'static,
{
    pub(super) fn lock(&self) -> MutexGuard<'_, State<E>> {
        // Subscribers never run under the lock, so a poisoned lock still guards
        // consistent state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hands one drain step to the worker. Called with the lock held.
    pub(super) fn schedule_drain(self: &Arc<Self>) -> Result<(), WorkerError> {
        let inner = Arc::clone(self);
        self.worker.submit(Box::new(move || inner.drain()))
    }
}

/// Bounded, single-topic event bus.
///
/// Cheap to clone: clones share the same queue, subscribers and worker.
pub struct Bus<E> {
    pub(super) inner: Arc<Inner<E>>,
}

impl<E> Clone for Bus<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> Bus<E>
where
    E: Clone + Send + 'static,
{
    /// Creates a bus sized by `cfg`, dispatching on `worker`.
    ///
    /// All storage is allocated here; nothing on the publish/deliver path allocates.
    pub fn new(cfg: BusConfig, worker: Arc<dyn Worker>) -> Self {
        let max_subscribers = cfg.max_subscribers_clamped();
        let state = State {
            queue: EventQueue::with_capacity(cfg.queue_capacity_clamped()),
            table: SubscriberTable::with_capacity(max_subscribers),
            drain_scheduled: false,
            scratch: Vec::with_capacity(max_subscribers),
        };
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                worker,
            }),
        }
    }

    /// Publishes `event` to every subscriber.
    ///
    /// Returns `false` if the event was **lost** (queue full or worker
    /// unavailable). A `false` never means "delayed".
    pub fn publish(&self, event: E) -> bool {
        self.try_publish(event).is_ok()
    }

    /// Like [`publish`](Self::publish), reporting why an event was lost.
    ///
    /// ### Errors
    /// - [`BusError::QueueFull`]: the queue is at capacity.
    /// - [`BusError::WorkerUnavailable`]: no drain could be scheduled; the event
    ///   was taken back out of the queue.
    pub fn try_publish(&self, event: E) -> Result<(), BusError> {
        let mut st = self.inner.lock();
        if let Err(event) = st.queue.push(event) {
            let capacity = st.queue.capacity();
            drop(st);
            drop(event);
            tracing::warn!(capacity, "event queue full; event dropped");
            return Err(BusError::QueueFull);
        }

        if !st.drain_scheduled {
            if let Err(err) = self.inner.schedule_drain() {
                let event = st.queue.pop_back();
                drop(st);
                drop(event);
                tracing::warn!(error = %err, "could not schedule drain; event dropped");
                return Err(err.into());
            }
            st.drain_scheduled = true;
        }

        tracing::trace!(pending = st.queue.len(), "event queued");
        Ok(())
    }

    /// Registers `subscriber` in the first free slot.
    ///
    /// Returns `None` when the table is full. Treat that as a hard limit: it
    /// does not clear up by retrying unless someone unsubscribes.
    pub fn subscribe(&self, subscriber: impl Subscribe<E>) -> Option<SubscriptionToken> {
        self.try_subscribe(subscriber).ok()
    }

    /// Like [`subscribe`](Self::subscribe), returning [`BusError::SubscriberTableFull`] on failure.
    pub fn try_subscribe(
        &self,
        subscriber: impl Subscribe<E>,
    ) -> Result<SubscriptionToken, BusError> {
        let boxed: BoxedSubscriber<E> = Box::new(subscriber);
        let name = boxed.name();

        let inserted = self.inner.lock().table.insert(boxed);
        match inserted {
            Ok(token) => {
                tracing::debug!(subscriber = name, slot = token.slot(), "subscribed");
                Ok(token)
            }
            Err(rejected) => {
                drop(rejected);
                tracing::debug!(subscriber = name, "subscriber table full");
                Err(BusError::SubscriberTableFull)
            }
        }
    }

    /// Removes the subscription named by `token`.
    ///
    /// Returns `false` if the token is stale or was never issued by this bus.
    /// Safe to call repeatedly. A delivery already in progress on the worker
    /// may still reach the subscriber; later events will not.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        self.try_unsubscribe(token).is_ok()
    }

    /// Like [`unsubscribe`](Self::unsubscribe), returning [`BusError::InvalidOrStaleToken`] on failure.
    pub fn try_unsubscribe(&self, token: SubscriptionToken) -> Result<(), BusError> {
        let removed = self.inner.lock().table.take(token);
        match removed {
            Some(removed) => {
                drop(removed);
                tracing::debug!(slot = token.slot(), "unsubscribed");
                Ok(())
            }
            None => Err(BusError::InvalidOrStaleToken { slot: token.slot() }),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().table.count()
    }

    /// Number of subscriber slots.
    pub fn max_subscribers(&self) -> usize {
        self.inner.lock().table.capacity()
    }

    /// Number of events queued and not yet taken by a drain.
    pub fn pending_events(&self) -> usize {
        self.inner.lock().queue.len()
    }

    /// Maximum number of queued events.
    pub fn queue_capacity(&self) -> usize {
        self.inner.lock().queue.capacity()
    }
}

impl<E> fmt::Debug for Bus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.inner.state.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Bus")
            .field("pending_events", &st.queue.len())
            .field("queue_capacity", &st.queue.capacity())
            .field("subscribers", &st.table.count())
            .field("max_subscribers", &st.table.capacity())
            .field("drain_scheduled", &st.drain_scheduled)
            .finish()
    }
}
