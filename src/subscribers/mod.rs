//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait and the built-in
//! [`LogWriter`] subscriber.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   producer ── publish(E) ──► Bus ──► drain step (dispatch thread)
//!                                           │
//!                                           ├──► slot 0: Subscribe::on_event(E)
//!                                           ├──► slot 1: Subscribe::on_event(E)
//!                                           └──► slot N: Subscribe::on_event(E)
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use dispatchbus::Subscribe;
//!
//! #[derive(Clone, Debug)]
//! struct ProximitySample(u16);
//!
//! struct Average { sum: u64, n: u64 }
//!
//! impl Subscribe<ProximitySample> for Average {
//!     fn on_event(&mut self, ev: ProximitySample) {
//!         self.sum += u64::from(ev.0);
//!         self.n += 1;
//!     }
//!     fn name(&self) -> &'static str { "average" }
//! }
//! ```

#[cfg(feature = "logging")]
mod log;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use subscribe::Subscribe;
