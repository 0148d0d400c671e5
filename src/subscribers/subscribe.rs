//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for consuming events. Each registered
//! subscriber occupies one slot of the bus's subscriber table and is invoked
//! on the dispatch worker, once per delivered event.
//!
//! ## Contract
//! - Invocations are serialized on the dispatch thread, so `on_event` gets
//!   `&mut self` and needs no internal locking.
//! - Implementations should return quickly: one subscriber's latency delays
//!   every later subscriber and every later event.
//! - A panic is caught and logged by the bus; the subscriber stays registered.
//!
//! Closures subscribe directly through the blanket impl:
//! ```rust
//! use dispatchbus::Subscribe;
//!
//! fn assert_subscriber<S: Subscribe<u32>>(_: &S) {}
//!
//! let mut total = 0u64;
//! let sum = move |v: u32| total += u64::from(v);
//! assert_subscriber(&sum);
//! ```

/// Contract for event subscribers.
pub trait Subscribe<E>: Send + 'static {
    /// Handles one event. Called on the dispatch thread.
    fn on_event(&mut self, event: E);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl<E, F> Subscribe<E> for F
where
    F: FnMut(E) + Send + 'static,
{
    #[inline]
    fn on_event(&mut self, event: E) {
        self(event)
    }
}
