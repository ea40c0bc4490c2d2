//! JSON song files.
//!
//! ```json
//! {
//!   "title": "Demo",
//!   "wheel": [[0, 1, 0, 2], [1, 0, 0, 0]],
//!   "mute_groups": [1, 2],
//!   "sections": [{ "mask": 3, "length": 8, "name": "Full MMX" }]
//! }
//! ```
//!
//! `wheel[channel][beat]` counts the notes a channel plays on each beat of
//! the wheel. `mute_groups` defaults to the standard MMX groups; without
//! `sections` the wheel plays unmuted for one revolution.

use mmx_ir::{MuteSection, WheelSong, STANDARD_MUTE_GROUPS};
use serde::Deserialize;

use crate::FormatError;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SongFile {
    #[serde(default)]
    title: String,
    wheel: Vec<Vec<u8>>,
    #[serde(default)]
    mute_groups: Option<Vec<u64>>,
    #[serde(default)]
    sections: Vec<SectionEntry>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SectionEntry {
    mask: u32,
    length: usize,
    #[serde(default)]
    name: String,
}

/// Load a song from JSON text.
pub fn load_song(json: &str) -> Result<WheelSong, FormatError> {
    let file: SongFile = serde_json::from_str(json)?;
    let mute_groups = file
        .mute_groups
        .unwrap_or_else(|| STANDARD_MUTE_GROUPS.to_vec());
    let sections = file
        .sections
        .iter()
        .map(|s| MuteSection::new(s.mask, s.length, &s.name))
        .collect();
    Ok(WheelSong::new(&file.title, file.wheel, mute_groups, sections)?)
}
