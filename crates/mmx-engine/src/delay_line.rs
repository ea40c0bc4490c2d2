//! Fixed-length circular transit buffer.

use alloc::vec;
use alloc::vec::Vec;

/// Marbles in transit, one slot per beat of remaining travel.
///
/// The slot at `head` arrives next; the slot just behind it is the tail,
/// where newly entered marbles start with the full transit time ahead.
#[derive(Clone, Debug)]
pub struct DelayLine {
    slots: Vec<u32>,
    head: usize,
}

impl DelayLine {
    /// Create an empty line of `length` slots. A zero-length line does not exist.
    pub fn new(length: usize) -> Option<Self> {
        (length > 0).then(|| Self { slots: vec![0; length], head: 0 })
    }

    pub fn length(&self) -> usize {
        self.slots.len()
    }

    /// Marbles completing transit this beat. Clears the head slot and moves on.
    pub fn advance(&mut self) -> u32 {
        let arrived = core::mem::take(&mut self.slots[self.head]);
        self.head = (self.head + 1) % self.slots.len();
        arrived
    }

    /// Put `n` marbles at the tail of the line.
    pub fn enqueue(&mut self, n: u32) {
        let len = self.slots.len();
        let tail = (self.head + len - 1) % len;
        self.slots[tail] += n;
    }

    /// Slots in arrival order, head first.
    pub fn contents(&self) -> Vec<u32> {
        self.slots[self.head..]
            .iter()
            .chain(&self.slots[..self.head])
            .copied()
            .collect()
    }

    /// Marbles currently in transit.
    pub fn total(&self) -> u64 {
        self.slots.iter().map(|&n| n as u64).sum()
    }
}
