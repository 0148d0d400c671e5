//! # dispatchbus
//!
//! **dispatchbus** is a bounded publish/subscribe bus for small control
//! applications. It decouples event producers (sensor polling loops, input
//! handlers, timers) from event consumers (state machines, services) and runs
//! every consumer on a single dispatch worker.
//!
//! Memory is fixed at construction: the event queue and the subscriber table
//! never grow, and nothing on the publish/deliver path allocates.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   sampler    │   │   buttons    │   │    timer     │   producers (any thread)
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            └───────── publish(E) → bool ─────────┘
//!                               ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Bus<E>                          (one mutex)                      │
//! │  - EventQueue<E>      fixed capacity FIFO; full → event dropped   │
//! │  - SubscriberTable    fixed slots; subscribe → token              │
//! │  - drain_scheduled    at most one drain request outstanding       │
//! └───────────────────────────────┬───────────────────────────────────┘
//!                                 │ Worker::submit(drain)
//!                                 ▼
//!                   ┌───────────────────────────┐
//!                   │  Worker (dispatch thread) │
//!                   │  drain: pop 1 event,      │
//!                   │  deliver without the lock │
//!                   └─────┬─────────┬─────────┬─┘
//!                         ▼         ▼         ▼
//!                      slot 0    slot 1 ... slot N     Subscribe::on_event(E)
//! ```
//!
//! ### Drain lifecycle
//! ```text
//! publish(e) ─► queue.push(e) ─┬─ full            ─► false (event lost)
//!                              └─ ok ─► drain already scheduled? ─ yes ─► true
//!                                                               └─ no  ─► submit(drain) ─► true
//!
//! drain() on worker:
//!   ├─► pop one event, snapshot subscribers          (under lock)
//!   ├─► invoke each subscriber in slot order          (no lock; panics contained)
//!   └─► restore subscribers; events left? re-submit   (under lock)
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                          |
//! |-------------------|--------------------------------------------------------------|---------------------------------------------|
//! | **Bus**           | Publish, subscribe, unsubscribe over one event type.         | [`Bus`], [`SubscriptionToken`]              |
//! | **Subscribers**   | Closures or custom types invoked on the dispatch worker.     | [`Subscribe`]                               |
//! | **Workers**       | Single-consumer executors the bus hands delivery to.         | [`Worker`], [`WorkQueue`], [`TaskWorker`], [`ManualWorker`] |
//! | **Storage**       | Fixed-capacity queue and slot table.                         | [`EventQueue`], [`SubscriberTable`]         |
//! | **Errors**        | Capacity-based failures, reported through return values.     | [`BusError`], [`WorkerError`]               |
//! | **Configuration** | Construction-time capacities.                                | [`BusConfig`], [`WorkQueueConfig`]          |
//!
//! ## Optional features
//! - `logging` (default): exports the [`LogWriter`] subscriber, which traces every event.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::mpsc;
//! use std::time::Duration;
//! use dispatchbus::{Bus, BusConfig, WorkQueue, WorkQueueConfig};
//!
//! #[derive(Clone, Debug)]
//! struct ProximitySample(u16);
//!
//! let worker = Arc::new(WorkQueue::spawn(WorkQueueConfig::default())?);
//! let bus: Bus<ProximitySample> = Bus::new(BusConfig::default(), worker.clone());
//!
//! let (tx, rx) = mpsc::channel();
//! let token = bus
//!     .subscribe(move |s: ProximitySample| { let _ = tx.send(s.0); })
//!     .expect("subscriber table full");
//!
//! assert!(bus.publish(ProximitySample(412)));
//! assert_eq!(rx.recv_timeout(Duration::from_secs(1)).unwrap(), 412);
//!
//! assert!(bus.unsubscribe(token));
//! worker.shutdown();
//! # Ok::<(), std::io::Error>(())
//! ```
mod bus;
mod config;
mod error;
mod storage;
mod subscribers;
mod worker;

// ---- Public re-exports ----

pub use bus::{Bus, SubscriptionToken};
pub use config::{BusConfig, WorkQueueConfig};
pub use error::{BusError, WorkerError};
pub use storage::{EventQueue, SubscriberTable};
pub use subscribers::Subscribe;
pub use worker::{ManualWorker, TaskWorker, Work, WorkQueue, Worker};

// Optional: built-in subscriber that traces every delivered event.
// Enabled by default; disable with `--no-default-features`.
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
