//! Marble-flow engine for the MMX simulator.
//!
//! Steps the channel bank, the divider and the return/recycle transports
//! one beat at a time against a song.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod channel;
mod delay_line;
mod divider;
mod engine;
pub mod random;
mod transport;

pub use channel::Channel;
pub use delay_line::DelayLine;
pub use divider::{Divider, Placement};
pub use engine::{Engine, Snapshot, StepOutcome};
pub use random::{bernoulli, uniform, RandomSource, Rng};
pub use transport::{MarbleTransport, ReleaseCycle, Releases};
