//! Configuration errors.

use thiserror::Error;

/// A machine or song configuration the engine refuses to run.
///
/// Raised before anything runs; a running engine never fails.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    #[error("the channel bank must contain at least one channel")]
    NoChannels,
    #[error("channels must hold at least one marble")]
    ZeroChannelCapacity,
    #[error("{name} probability {value} must lie within [0, 1]")]
    ProbabilityOutOfRange { name: &'static str, value: f64 },
    #[error("channel acceptance range is inverted: min {min} > max {max}")]
    InvertedAcceptRange { min: f64, max: f64 },
    #[error("{transport} transport needs at least one release channel")]
    NoReleaseChannels { transport: &'static str },
    #[error("{transport} transport has {count} release channels, at most {max} are supported")]
    TooManyReleaseChannels { transport: &'static str, count: usize, max: usize },
    #[error("{transport} transport must release at least every beat (cadence 0)")]
    ZeroReleaseCadence { transport: &'static str },
    #[error("{transport} transport delay line must be at least one beat long")]
    ZeroLengthDelay { transport: &'static str },
    #[error("{transport} transport enters the divider at channel {entry}, but only {num_channels} channels exist")]
    EntryPointOutOfRange { transport: &'static str, entry: usize, num_channels: usize },
    #[error("song has no beats")]
    EmptySong,
    #[error("wheel channel {channel} has {beats} beats, expected {expected}")]
    RaggedWheel { channel: usize, beats: usize, expected: usize },
    #[error("mute section {section} enables undefined mute group {group}")]
    UndefinedMuteGroup { section: usize, group: usize },
    #[error("song addresses {song_channels} channels, the machine has {num_channels}")]
    SongTooWide { song_channels: usize, num_channels: usize },
    #[error("machine holds {total} marbles, at most {max} can be tracked")]
    TooManyMarbles { total: u64, max: u64 },
    #[error("wheel has {channels} channels, mute masks cover at most {max}")]
    WheelTooWide { channels: usize, max: usize },
    #[error("song plays no notes, a run would never reach its marble goal")]
    SilentSong,
}
