//! Song interface and the programming-wheel song.

use alloc::vec;
use alloc::vec::Vec;
use arrayvec::ArrayString;

use crate::error::ConfigError;

/// Beats on one revolution of the programming wheel.
pub const BEATS_PER_WHEEL: usize = 64;

/// Widest wheel a `WheelSong` can describe (one bit per channel in a mute mask).
pub const MAX_SONG_CHANNELS: usize = 64;

/// Channel masks of the MMX mute groups, indexed by mute-mask bit.
///
/// Bit 0 is the bass (channels 0-7), then hi-hat, snare drum, kick drum,
/// cymbal, and bit 5 is the vibraphone (channels 16-37).
pub const STANDARD_MUTE_GROUPS: [u64; 6] = [
    0b1111_1111,
    0b11 << 8,
    0b11 << 10,
    0b11 << 12,
    0b11 << 14,
    ((1 << 22) - 1) << 16,
];

/// The cyclic note source driving the engine.
pub trait Song {
    /// Length of one cycle of the song in beats.
    fn beat_count(&self) -> usize;

    /// Number of channels the song may address (every note index is below this).
    fn channel_count(&self) -> usize;

    /// Channel indices firing on `beat`, already reduced modulo `beat_count`.
    ///
    /// A channel appears once per note it plays on that beat.
    fn notes_on_beat(&self, beat: usize) -> impl Iterator<Item = usize> + '_;
}

impl<S: Song> Song for &S {
    fn beat_count(&self) -> usize {
        (**self).beat_count()
    }

    fn channel_count(&self) -> usize {
        (**self).channel_count()
    }

    fn notes_on_beat(&self, beat: usize) -> impl Iterator<Item = usize> + '_ {
        (**self).notes_on_beat(beat)
    }
}

/// A stretch of the song during which a fixed set of mute groups is audible.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MuteSection {
    /// Bit `j` set means mute group `j` plays
    pub mask: u32,
    /// Section length in beats
    pub length: usize,
    pub name: ArrayString<32>,
}

impl MuteSection {
    pub fn new(mask: u32, length: usize, name: &str) -> Self {
        Self { mask, length, name: truncated(name) }
    }
}

/// A song made of one programming wheel replayed under a sequence of mute sections.
#[derive(Clone, Debug)]
pub struct WheelSong {
    pub title: ArrayString<32>,
    /// Notes per channel per wheel beat (`wheel[channel][beat]`)
    wheel: Vec<Vec<u8>>,
    beats_per_wheel: usize,
    mute_groups: Vec<u64>,
    sections: Vec<MuteSection>,
    /// (first beat, audible channel mask) per section, ascending
    section_masks: Vec<(usize, u64)>,
    beat_count: usize,
}

impl WheelSong {
    /// Build a song from a wheel, the channel masks of its mute groups and its sections.
    ///
    /// With no sections the whole wheel plays unmuted for one revolution.
    pub fn new(
        title: &str,
        wheel: Vec<Vec<u8>>,
        mute_groups: Vec<u64>,
        sections: Vec<MuteSection>,
    ) -> Result<Self, ConfigError> {
        if wheel.len() > MAX_SONG_CHANNELS {
            return Err(ConfigError::WheelTooWide {
                channels: wheel.len(),
                max: MAX_SONG_CHANNELS,
            });
        }
        let beats_per_wheel = wheel.first().map_or(BEATS_PER_WHEEL, Vec::len);
        if beats_per_wheel == 0 {
            return Err(ConfigError::EmptySong);
        }
        if let Some((channel, row)) = wheel.iter().enumerate().find(|(_, row)| row.len() != beats_per_wheel) {
            return Err(ConfigError::RaggedWheel {
                channel,
                beats: row.len(),
                expected: beats_per_wheel,
            });
        }

        let (section_masks, beat_count) = if sections.is_empty() {
            (vec![(0, u64::MAX)], beats_per_wheel)
        } else {
            let mut masks = Vec::with_capacity(sections.len());
            let mut start = 0;
            for (index, section) in sections.iter().enumerate() {
                let mut channels = 0u64;
                for group in 0..u32::BITS as usize {
                    if section.mask & (1 << group) == 0 {
                        continue;
                    }
                    let group_mask = mute_groups
                        .get(group)
                        .ok_or(ConfigError::UndefinedMuteGroup { section: index, group })?;
                    channels |= group_mask;
                }
                masks.push((start, channels));
                start += section.length;
            }
            (masks, start)
        };
        if beat_count == 0 {
            return Err(ConfigError::EmptySong);
        }

        Ok(Self {
            title: truncated(title),
            wheel,
            beats_per_wheel,
            mute_groups,
            sections,
            section_masks,
            beat_count,
        })
    }

    /// A song that plays the whole wheel unmuted, once per revolution.
    pub fn unmuted(title: &str, wheel: Vec<Vec<u8>>) -> Result<Self, ConfigError> {
        Self::new(title, wheel, Vec::new(), Vec::new())
    }

    pub fn wheel(&self) -> &[Vec<u8>] {
        &self.wheel
    }

    pub fn beats_per_wheel(&self) -> usize {
        self.beats_per_wheel
    }

    pub fn mute_groups(&self) -> &[u64] {
        &self.mute_groups
    }

    pub fn sections(&self) -> &[MuteSection] {
        &self.sections
    }

    /// Whether `channel` is audible on `beat` (taken modulo the song length).
    pub fn is_unmuted_on_beat(&self, beat: usize, channel: usize) -> bool {
        channel < MAX_SONG_CHANNELS && self.audible_mask(beat % self.beat_count) & (1 << channel) != 0
    }

    /// Notes played over one full cycle of the song.
    pub fn note_count(&self) -> usize {
        (0..self.beat_count).map(|beat| self.notes_on_beat(beat).count()).sum()
    }

    /// Average notes per beat over one cycle.
    pub fn notes_per_beat(&self) -> f64 {
        self.note_count() as f64 / self.beat_count as f64
    }

    fn audible_mask(&self, beat: usize) -> u64 {
        let index = self.section_masks.partition_point(|(start, _)| *start <= beat);
        index
            .checked_sub(1)
            .map_or(0, |i| self.section_masks[i].1)
    }
}

impl Song for WheelSong {
    fn beat_count(&self) -> usize {
        self.beat_count
    }

    fn channel_count(&self) -> usize {
        self.wheel.len()
    }

    fn notes_on_beat(&self, beat: usize) -> impl Iterator<Item = usize> + '_ {
        let beat = beat % self.beat_count;
        let audible = self.audible_mask(beat);
        let column = beat % self.beats_per_wheel;
        self.wheel
            .iter()
            .enumerate()
            .filter(move |(channel, _)| audible & (1 << channel) != 0)
            .flat_map(move |(channel, row)| core::iter::repeat(channel).take(row[column] as usize))
    }
}

/// Copy as much of `text` as fits, cutting on a character boundary.
fn truncated<const CAP: usize>(text: &str) -> ArrayString<CAP> {
    let mut out = ArrayString::new();
    for ch in text.chars() {
        if out.try_push(ch).is_err() {
            break;
        }
    }
    out
}
