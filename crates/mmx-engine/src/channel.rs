//! A single note channel: the marble pipe between the divider and its gate.

/// Marble reservoir for one playable note.
#[derive(Clone, Debug, PartialEq)]
pub struct Channel {
    /// Position in the divider scan order
    index: usize,
    /// Probability that a passing marble drops into this channel when it has room
    accept_p: f64,
    /// Marbles currently held
    pub(crate) count: u32,
    /// Capacity of the pipe
    max_count: u32,
}

impl Channel {
    /// Create a full channel.
    pub fn new(index: usize, accept_p: f64, max_count: u32) -> Self {
        Self { index, accept_p, count: max_count, max_count }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn accept_p(&self) -> f64 {
        self.accept_p
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn max_count(&self) -> u32 {
        self.max_count
    }

    pub fn is_full(&self) -> bool {
        self.count >= self.max_count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Drop one marble through the gate. Returns false if the channel was empty.
    pub fn fire(&mut self) -> bool {
        if self.count == 0 {
            return false;
        }
        self.count -= 1;
        true
    }

    /// Take one marble from the divider. Returns false if the channel is full.
    pub(crate) fn accept(&mut self) -> bool {
        if self.is_full() {
            return false;
        }
        self.count += 1;
        true
    }
}
