//! Fixed-capacity FIFO bound to a task channel
//!
//! The queue itself never blocks. A push on a full queue or a pop on an
//! empty queue hands the element back or returns `None`; the blocking
//! endpoints in [`super::msg`] turn those events into wait reasons.

use heapless::Deque;

/// Fixed-capacity queue
pub struct Fifo<T, const N: usize> {
    queue: Deque<T, N>,
}

impl<T, const N: usize> Fifo<T, N> {
    pub const fn new() -> Self {
        Fifo { queue: Deque::new() }
    }

    /// Append at the tail, returning the element if the queue is full
    #[inline]
    pub fn push(&mut self, item: T) -> Result<(), T> {
        self.queue.push_back(item)
    }

    /// Remove from the head
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        self.queue.pop_front()
    }

    #[inline]
    pub fn peek(&self) -> Option<&T> {
        self.queue.front()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.queue.is_full()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<T, const N: usize> Default for Fifo<T, N> {
    fn default() -> Self {
        Self::new()
    }
}
