//! # LogWriter: event tracer
//!
//! A minimal subscriber that records every delivered event through `tracing`.
//! Use it while wiring up producers, or in demos.
//!
//! ## Example output (with `tracing-subscriber`'s fmt layer)
//! ```text
//! INFO dispatchbus::subscribers::log: event delivered bus="sense" seq=1 event=ProximitySample(412)
//! INFO dispatchbus::subscribers::log: event delivered bus="sense" seq=2 event=ButtonPressed(A)
//! ```

use std::fmt::Debug;

use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Debug)]
pub struct LogWriter {
    label: &'static str,
    seq: u64,
}

impl LogWriter {
    /// Construct a new [`LogWriter`] tagging its records with `label`.
    #[must_use]
    pub fn new(label: &'static str) -> Self {
        Self { label, seq: 0 }
    }

    /// Number of events recorded so far.
    pub fn seen(&self) -> u64 {
        self.seq
    }
}

impl Default for LogWriter {
    fn default() -> Self {
        Self::new("bus")
    }
}

impl<E: Debug> Subscribe<E> for LogWriter {
    fn on_event(&mut self, event: E) {
        self.seq += 1;
        tracing::info!(bus = self.label, seq = self.seq, event = ?event, "event delivered");
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_events() {
        let mut w = LogWriter::new("test");
        w.on_event(1u8);
        w.on_event("two");
        assert_eq!(w.seen(), 2);
        assert_eq!(Subscribe::<u8>::name(&w), "LogWriter");
    }
}
