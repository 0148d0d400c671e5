//! # Fixed-capacity FIFO of pending events.
//!
//! [`EventQueue`] is a ring buffer whose storage is allocated once, at
//! construction. After that, `push` and `pop` never allocate.
//!
//! ## Rules
//! - `len() <= capacity()` at all times
//! - FIFO order is preserved across `push`/`pop`
//! - `push` on a full queue hands the event back and mutates nothing
//!
//! ```text
//!   head                 head + len
//!    │                       │
//!    ▼                       ▼
//!  [ e1 | e2 | e3 | e4 | ·· | ·· ]   (indices wrap modulo capacity)
//! ```

/// Bounded FIFO of events backed by a preallocated ring buffer.
pub struct EventQueue<E> {
    slots: Box<[Option<E>]>,
    head: usize,
    len: usize,
}

impl<E> EventQueue<E> {
    /// Creates an empty queue holding at most `capacity` events (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
        }
    }

    /// Appends `event` at the back.
    ///
    /// Returns the event back as `Err` if the queue is full; the queue is left untouched.
    pub fn push(&mut self, event: E) -> Result<(), E> {
        if self.is_full() {
            return Err(event);
        }
        let tail = self.index(self.len);
        self.slots[tail] = Some(event);
        self.len += 1;
        Ok(())
    }

    /// Removes and returns the oldest event, or `None` when empty.
    ///
    /// The bus only calls this after checking the queue is non-empty.
    pub fn pop(&mut self) -> Option<E> {
        if self.len == 0 {
            return None;
        }
        let event = self.slots[self.head].take();
        self.head = self.index(1);
        self.len -= 1;
        event
    }

    /// Removes and returns the newest event (undoes the last `push`).
    pub(crate) fn pop_back(&mut self) -> Option<E> {
        if self.len == 0 {
            return None;
        }
        let tail = self.index(self.len - 1);
        self.len -= 1;
        self.slots[tail].take()
    }

    /// Number of queued events.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Maximum number of queued events.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    #[inline]
    fn index(&self, offset: usize) -> usize {
        (self.head + offset) % self.slots.len()
    }
}
