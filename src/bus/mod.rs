//! Dispatch engine: the bus, its tokens and the drain step.
//!
//! ## Contents
//! - [`Bus`] publish / subscribe / unsubscribe over one event type
//! - [`SubscriptionToken`] handle required to unsubscribe
//! - `drain` the worker-side delivery step (internal)
//!
//! One bus carries exactly one event type; use one bus per topic.

mod drain;
mod engine;
mod token;

pub use engine::Bus;
pub use token::SubscriptionToken;
