//! Format loaders for the MMX simulator.
//!
//! Parses JSON song and settings files into the IR.

mod settings_json;
mod song_json;

use mmx_ir::ConfigError;
use thiserror::Error;

pub use settings_json::load_settings;
pub use song_json::load_song;

/// Error type for format loading.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Not JSON, or JSON of the wrong shape
    #[error("malformed file: {0}")]
    Json(#[from] serde_json::Error),
    /// Well-formed file describing an impossible song or machine
    #[error("invalid contents: {0}")]
    Invalid(#[from] ConfigError),
}
