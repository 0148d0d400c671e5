use std::fmt;

/// Opaque handle returned by [`Bus::subscribe`](crate::Bus::subscribe).
///
/// Identifies one subscriber slot together with the generation the slot had
/// when the subscription was made. Once the subscription is removed the token
/// is stale: it is rejected even if the slot has since been given to someone else.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken {
    slot: usize,
    generation: u32,
}

impl SubscriptionToken {
    pub(crate) fn new(slot: usize, generation: u32) -> Self {
        Self { slot, generation }
    }

    /// Index of the subscriber slot (stable for the subscription's lifetime).
    #[inline]
    pub fn slot(&self) -> usize {
        self.slot
    }

    #[inline]
    pub(crate) fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for SubscriptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionToken({}#{})", self.slot, self.generation)
    }
}
