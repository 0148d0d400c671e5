//! # Fixed-capacity table of revocable subscriber slots.
//!
//! [`SubscriberTable`] stores up to `capacity` subscribers, each in a slot
//! identified by its index. Slots are allocated at construction; `insert` and
//! `remove` only flip slot state.
//!
//! ## Slot lifecycle
//! ```text
//!            insert (generation += 1)
//!   Empty ──────────────────────────────► Occupied(Some(s))
//!     ▲                                      │        ▲
//!     │ remove(token)                   lend │        │ restore
//!     │                                      ▼        │
//!     └──────────────────────────────── Occupied(None) ┘
//!                 remove(token)             (in flight on the dispatch thread)
//! ```
//!
//! ## Rules
//! - `insert` picks the **first** empty slot (lowest index) and hands the
//!   subscriber back when the table is full
//! - occupied slots are visited in ascending index order
//! - `remove` checks the token's generation, so a stale token never frees a newer subscriber
//! - a slot removed while its subscriber is lent out stays empty; `restore` hands
//!   the subscriber back to the caller for dropping

use crate::bus::SubscriptionToken;

enum SlotState<S> {
    Empty,
    /// `None` while the subscriber is lent to an in-flight drain.
    Occupied(Option<S>),
}

struct Slot<S> {
    generation: u32,
    state: SlotState<S>,
}

/// A subscriber temporarily taken out of its slot for delivery.
pub(crate) struct Lent<S> {
    pub token: SubscriptionToken,
    pub subscriber: Option<S>,
}

/// Outcome of a successful [`SubscriberTable::take`].
pub(crate) enum Removed<S> {
    /// The subscriber was idle in its slot and is returned to the caller.
    Idle(S),
    /// The subscriber is currently lent out; it is dropped when the drain restores it.
    InFlight,
}

/// Fixed-capacity collection of subscriber slots.
pub struct SubscriberTable<S> {
    slots: Box<[Slot<S>]>,
    count: usize,
}

impl<S> SubscriberTable<S> {
    /// Creates a table with `capacity` empty slots (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: (0..capacity)
                .map(|_| Slot {
                    generation: 0,
                    state: SlotState::Empty,
                })
                .collect(),
            count: 0,
        }
    }

    /// Stores `subscriber` in the first empty slot.
    ///
    /// Hands `subscriber` back as `Err` and leaves the table untouched when
    /// every slot is occupied.
    pub fn insert(&mut self, subscriber: S) -> Result<SubscriptionToken, S> {
        let Some((index, slot)) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, slot)| matches!(slot.state, SlotState::Empty))
        else {
            return Err(subscriber);
        };

        slot.generation = slot.generation.wrapping_add(1);
        slot.state = SlotState::Occupied(Some(subscriber));
        self.count += 1;
        Ok(SubscriptionToken::new(index, slot.generation))
    }

    /// Frees the slot named by `token`.
    ///
    /// Returns `false` for out-of-range, empty or stale tokens.
    pub fn remove(&mut self, token: SubscriptionToken) -> bool {
        self.take(token).is_some()
    }

    /// Frees the slot named by `token`, handing back its subscriber if idle.
    pub(crate) fn take(&mut self, token: SubscriptionToken) -> Option<Removed<S>> {
        let slot = self.live_slot_mut(token)?;
        let state = std::mem::replace(&mut slot.state, SlotState::Empty);
        self.count -= 1;
        match state {
            SlotState::Occupied(Some(subscriber)) => Some(Removed::Idle(subscriber)),
            _ => Some(Removed::InFlight),
        }
    }

    /// Invokes `f` for every occupied slot whose subscriber is present, in index order.
    pub fn for_each_occupied(&mut self, mut f: impl FnMut(SubscriptionToken, &mut S)) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let SlotState::Occupied(Some(subscriber)) = &mut slot.state {
                f(SubscriptionToken::new(index, slot.generation), subscriber);
            }
        }
    }

    /// Moves every present subscriber into `out`, in index order.
    ///
    /// `out` is expected to have capacity for [`capacity()`](Self::capacity)
    /// entries so this never allocates.
    pub(crate) fn lend(&mut self, out: &mut Vec<Lent<S>>) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let SlotState::Occupied(present) = &mut slot.state {
                if let Some(subscriber) = present.take() {
                    out.push(Lent {
                        token: SubscriptionToken::new(index, slot.generation),
                        subscriber: Some(subscriber),
                    });
                }
            }
        }
    }

    /// Puts a lent subscriber back into its slot.
    ///
    /// Returns it as `Some` if the subscription was removed meanwhile.
    pub(crate) fn restore(&mut self, token: SubscriptionToken, subscriber: S) -> Option<S> {
        if let Some(slot) = self.live_slot_mut(token) {
            if let SlotState::Occupied(present) = &mut slot.state {
                if present.is_none() {
                    *present = Some(subscriber);
                    return None;
                }
            }
        }
        Some(subscriber)
    }

    /// Number of occupied slots (including subscribers currently lent out).
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Total number of slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn live_slot_mut(&mut self, token: SubscriptionToken) -> Option<&mut Slot<S>> {
        self.slots.get_mut(token.slot()).filter(|slot| {
            slot.generation == token.generation() && matches!(slot.state, SlotState::Occupied(_))
        })
    }
}
