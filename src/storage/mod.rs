//! Fixed-capacity storage owned by the bus.
//!
//! Both containers allocate their storage once, at construction, and are
//! never resized. The bus guards them with a single lock.
//!
//! ## Contents
//! - [`EventQueue`] bounded FIFO of pending events
//! - [`SubscriberTable`] slots of revocable subscribers, addressed by token

mod queue;
mod table;

pub use queue::EventQueue;
pub use table::SubscriberTable;
pub(crate) use table::Lent;
