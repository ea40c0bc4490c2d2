//! Core IR types for the MMX marble-flow simulator.
//!
//! This crate defines the plain data shared by every other crate: the
//! machine settings the engine is built from, the configuration errors
//! they can produce, and the song interface the engine consumes.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod error;
mod settings;
pub mod song;

pub use error::ConfigError;
pub use settings::{DividerDirection, Settings, TransportSettings, MAX_RELEASE_CHANNELS};
pub use song::{MuteSection, Song, WheelSong, BEATS_PER_WHEEL, MAX_SONG_CHANNELS, STANDARD_MUTE_GROUPS};
