//! # Drain step: the unit of work executed on the dispatch worker.
//!
//! ```text
//! drain():
//!   ├─ lock
//!   │    ├─ queue empty?  → drain_scheduled = false, return
//!   │    ├─ pop oldest event
//!   │    └─ lend every present subscriber into scratch   (snapshot)
//!   ├─ unlock
//!   ├─ deliver event to each lent subscriber, slot order, catch_unwind per call
//!   ├─ lock
//!   │    ├─ restore subscribers (removed ones are set aside)
//!   │    └─ queue non-empty? → submit next drain : drain_scheduled = false
//!   │                         (submit refused → loop and deliver the next event here)
//!   ├─ unlock
//!   └─ drop removed subscribers
//! ```
//!
//! Subscribers that register while an event is being delivered are not part
//! of the snapshot and first see the next event.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use super::engine::{BoxedSubscriber, Inner};
use crate::storage::Lent;
use crate::worker::panic_message;

impl<E> Inner<E>
where
    E: Clone + Send + 'static,
{
    pub(super) fn drain(self: &Arc<Self>) {
        while self.drain_one() {}
    }

    /// Delivers one event. Returns `true` when the worker refused the re-arm
    /// and the caller must keep delivering on this thread.
    fn drain_one(self: &Arc<Self>) -> bool {
        let (event, mut lent) = {
            let mut st = self.lock();
            let Some(event) = st.queue.pop() else {
                st.drain_scheduled = false;
                return false;
            };
            let mut lent = std::mem::take(&mut st.scratch);
            st.table.lend(&mut lent);
            (event, lent)
        };

        tracing::trace!(subscribers = lent.len(), "delivering event");
        deliver(event, &mut lent);

        let (removed, inline) = {
            let mut st = self.lock();
            let mut removed = Vec::new();
            for entry in lent.drain(..) {
                if let Some(subscriber) = entry.subscriber {
                    if let Some(stale) = st.table.restore(entry.token, subscriber) {
                        removed.push(stale);
                    }
                }
            }
            st.scratch = lent;

            // drain_scheduled stays set while this drain keeps going inline.
            let inline = if st.queue.is_empty() {
                st.drain_scheduled = false;
                false
            } else if let Err(err) = self.schedule_drain() {
                tracing::debug!(
                    error = %err,
                    pending = st.queue.len(),
                    "could not re-arm drain; delivering inline"
                );
                true
            } else {
                false
            };
            (removed, inline)
        };
        drop(removed);
        inline
    }
}

/// Delivers `event` to every lent subscriber; the last one receives the original.
fn deliver<E: Clone + 'static>(event: E, lent: &mut [Lent<BoxedSubscriber<E>>]) {
    let Some((last, rest)) = lent.split_last_mut() else {
        return;
    };
    for entry in rest {
        invoke(entry, event.clone());
    }
    invoke(last, event);
}

fn invoke<E: 'static>(entry: &mut Lent<BoxedSubscriber<E>>, event: E) {
    let Some(subscriber) = entry.subscriber.as_mut() else {
        return;
    };
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| subscriber.on_event(event)));
    if let Err(payload) = outcome {
        tracing::warn!(
            subscriber = subscriber.name(),
            slot = entry.token.slot(),
            panic = %panic_message(payload.as_ref()),
            "subscriber panicked"
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::bus::{Bus, SubscriptionToken};
    use crate::config::BusConfig;
    use crate::worker::ManualWorker;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc, Mutex};

    fn manual_bus(queue: usize, subs: usize) -> (Arc<ManualWorker>, Bus<u32>) {
        let worker = Arc::new(ManualWorker::new());
        let bus = Bus::new(BusConfig::new(queue, subs), worker.clone());
        (worker, bus)
    }

    #[test]
    fn test_subscriber_added_during_delivery_misses_current_event() {
        let (worker, bus) = manual_bus(4, 4);
        let (tx, rx) = mpsc::channel();

        let late_tx = tx.clone();
        let handle = bus.clone();
        let mut added = false;
        bus.subscribe(move |v: u32| {
            tx.send(("first", v)).unwrap();
            if !added {
                added = true;
                let late_tx = late_tx.clone();
                handle
                    .subscribe(move |v: u32| late_tx.send(("late", v)).unwrap())
                    .unwrap();
            }
        })
        .unwrap();

        bus.publish(1);
        bus.publish(2);
        worker.run_until_idle();
        assert_eq!(bus.subscriber_count(), 2);

        let seen: Vec<_> = rx.try_iter().collect();
        assert_eq!(seen, vec![("first", 1), ("first", 2), ("late", 2)]);
    }

    #[test]
    fn test_subscriber_can_unsubscribe_itself() {
        let (worker, bus) = manual_bus(4, 2);
        let hits = Arc::new(AtomicUsize::new(0));
        let token: Arc<Mutex<Option<SubscriptionToken>>> = Arc::default();

        let handle = bus.clone();
        let (h, t) = (Arc::clone(&hits), Arc::clone(&token));
        let issued = bus
            .subscribe(move |_v: u32| {
                h.fetch_add(1, Ordering::SeqCst);
                if let Some(token) = t.lock().unwrap().take() {
                    assert!(handle.unsubscribe(token));
                }
            })
            .unwrap();
        *token.lock().unwrap() = Some(issued);

        bus.publish(1);
        bus.publish(2);
        worker.run_until_idle();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(bus.subscriber_count(), 0);
        assert!(!bus.unsubscribe(issued));
    }

    #[test]
    fn test_unsubscribe_of_later_slot_during_delivery() {
        let (worker, bus) = manual_bus(4, 2);
        let (tx, rx) = mpsc::channel();
        let victim: Arc<Mutex<Option<SubscriptionToken>>> = Arc::default();

        let handle = bus.clone();
        let v = Arc::clone(&victim);
        let tx0 = tx.clone();
        bus.subscribe(move |e: u32| {
            tx0.send((0, e)).unwrap();
            if let Some(token) = v.lock().unwrap().take() {
                handle.unsubscribe(token);
            }
        })
        .unwrap();
        let second = bus.subscribe(move |e: u32| tx.send((1, e)).unwrap()).unwrap();
        *victim.lock().unwrap() = Some(second);

        bus.publish(1);
        bus.publish(2);
        worker.run_until_idle();

        // The in-flight event was already snapshotted for slot 1; later ones are not.
        let seen: Vec<_> = rx.try_iter().collect();
        assert_eq!(seen, vec![(0, 1), (1, 1), (0, 2)]);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn test_subscriber_can_publish_without_deadlock() {
        let (worker, bus) = manual_bus(4, 1);
        let (tx, rx) = mpsc::channel();
        let handle = bus.clone();
        bus.subscribe(move |v: u32| {
            tx.send(v).unwrap();
            if v < 3 {
                assert!(handle.publish(v + 1));
            }
        })
        .unwrap();

        bus.publish(1);
        assert_eq!(worker.run_until_idle(), 3);
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_panicking_subscriber_does_not_block_others() {
        let (worker, bus) = manual_bus(4, 3);
        let hits = Arc::new(AtomicUsize::new(0));

        let h = Arc::clone(&hits);
        bus.subscribe(move |_v: u32| {
            h.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        bus.subscribe(|v: u32| {
            if v == 1 {
                panic!("bad sample");
            }
        })
        .unwrap();
        let h = Arc::clone(&hits);
        bus.subscribe(move |_v: u32| {
            h.fetch_add(10, Ordering::SeqCst);
        })
        .unwrap();

        bus.publish(1);
        bus.publish(2);
        worker.run_until_idle();

        assert_eq!(hits.load(Ordering::SeqCst), 22);
        assert_eq!(bus.subscriber_count(), 3);
    }

    #[test]
    fn test_unsubscribed_subscriber_is_dropped() {
        struct DropFlag(Arc<AtomicUsize>);
        impl Drop for DropFlag {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let (worker, bus) = manual_bus(4, 1);
        let drops = Arc::new(AtomicUsize::new(0));
        let flag = DropFlag(Arc::clone(&drops));
        let token = bus
            .subscribe(move |_v: u32| {
                let _keep = &flag;
            })
            .unwrap();

        bus.publish(1);
        worker.run_until_idle();
        assert_eq!(drops.load(Ordering::SeqCst), 0);

        assert!(bus.unsubscribe(token));
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_refused_rearm_delivers_remaining_events_inline() {
        // One slot shared by two buses: a's subscriber fills it with b's drain.
        let worker = Arc::new(ManualWorker::with_capacity(1));
        let a: Bus<u32> = Bus::new(BusConfig::new(4, 1), worker.clone());
        let b: Bus<u32> = Bus::new(BusConfig::new(4, 1), worker.clone());
        let (a_tx, a_rx) = mpsc::channel();
        let (b_tx, b_rx) = mpsc::channel();

        let to_b = b.clone();
        a.subscribe(move |v: u32| {
            a_tx.send(v).unwrap();
            if v == 1 {
                assert!(to_b.publish(10));
            }
        })
        .unwrap();
        b.subscribe(move |v: u32| b_tx.send(v).unwrap()).unwrap();

        assert!(a.publish(1));
        assert!(a.publish(2));
        assert_eq!(worker.run_until_idle(), 2);

        assert_eq!(a_rx.try_iter().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(b_rx.try_iter().collect::<Vec<_>>(), vec![10]);
        assert_eq!(a.pending_events(), 0);
        assert_eq!(b.pending_events(), 0);

        // The inline drain finished cleanly; the next publish schedules again.
        assert!(a.publish(3));
        assert_eq!(worker.pending(), 1);
    }

    #[test]
    fn test_empty_drain_is_a_no_op() {
        let (worker, bus) = manual_bus(2, 1);
        bus.publish(7);
        worker.run_until_idle();

        // A stray extra drain finds nothing and leaves the bus schedulable.
        bus.inner.drain();
        assert!(bus.publish(8));
        assert_eq!(worker.pending(), 1);
    }
}
