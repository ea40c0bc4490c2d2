//! The divider: routes each released marble into the first channel that takes it.

use alloc::vec::Vec;
use mmx_ir::DividerDirection;

use crate::channel::Channel;
use crate::random::{bernoulli, RandomSource};

/// Where a marble ended up after crossing the divider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Dropped into the channel with this index
    Channel(usize),
    /// Rolled off the end, bound for the recycle transport
    Recycle,
}

/// The channel bank in divider scan order.
#[derive(Clone, Debug)]
pub struct Divider {
    channels: Vec<Channel>,
    direction: DividerDirection,
}

impl Divider {
    pub fn new(channels: Vec<Channel>, direction: DividerDirection) -> Self {
        Self { channels, direction }
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn channel(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    pub(crate) fn channel_mut(&mut self, index: usize) -> Option<&mut Channel> {
        self.channels.get_mut(index)
    }

    pub fn direction(&self) -> DividerDirection {
        self.direction
    }

    /// Run one marble down the divider from `start`.
    ///
    /// Forward scans `start..len`; reverse mirrors the entry point and scans
    /// down to channel 0. Full channels are passed over without a draw.
    pub fn place_marble<R: RandomSource + ?Sized>(&mut self, start: usize, rng: &mut R) -> Placement {
        let len = self.channels.len();
        match self.direction {
            DividerDirection::Forward => {
                for index in start.min(len)..len {
                    if self.try_channel(index, rng) {
                        return Placement::Channel(index);
                    }
                }
            }
            DividerDirection::Reverse => {
                for index in (0..len.saturating_sub(start)).rev() {
                    if self.try_channel(index, rng) {
                        return Placement::Channel(index);
                    }
                }
            }
        }
        Placement::Recycle
    }

    fn try_channel<R: RandomSource + ?Sized>(&mut self, index: usize, rng: &mut R) -> bool {
        let channel = &mut self.channels[index];
        if channel.is_full() {
            return false;
        }
        bernoulli(rng, channel.accept_p()) && channel.accept()
    }

    /// Marbles held across every channel.
    pub fn total(&self) -> u64 {
        self.channels.iter().map(|c| c.count() as u64).sum()
    }
}
