//! Machine settings.
//!
//! Every tunable of the simulated machine lives here as one explicit value.
//! Defaults describe the current MMX build.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Most release channels a single transport may drive per beat.
pub const MAX_RELEASE_CHANNELS: usize = 32;

/// Direction in which the divider scans channels from an entry point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DividerDirection {
    /// Scan from the entry point towards the last channel.
    #[default]
    Forward,
    /// Scan from the mirrored entry point down to channel 0.
    Reverse,
}

/// One feedback path back onto the divider (conveyor return or fishstair recycle).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct TransportSettings {
    /// Lanes releasing marbles onto the divider each release beat
    pub release_channels: usize,
    /// Probability that a lane picks up a marble when one is waiting
    pub channel_accept_p: f64,
    /// Release every Nth beat
    pub beats_per_release: u64,
    /// Beats a marble spends in transit before it waits at the reservoir
    pub beats_to_transport: usize,
    /// Divider channel where the first lane enters
    pub divider_entry_start: usize,
    /// Divider channel where the last lane enters
    pub divider_entry_end: usize,
    /// Waiting marbles above this count are reported as overflow
    pub reservoir_capacity: u32,
    /// Marbles waiting at the reservoir when the run starts
    pub reservoir_initial: u32,
}

impl TransportSettings {
    /// Conveyor return path, from the drops back to the top of the divider.
    pub const fn marble_return() -> Self {
        Self {
            release_channels: 8,
            channel_accept_p: 15.0 / 16.0,
            beats_per_release: 1,
            beats_to_transport: 48,
            divider_entry_start: 4,
            divider_entry_end: 38 - 10,
            reservoir_capacity: 40,
            reservoir_initial: 0,
        }
    }

    /// Fishstair recycle path, from the end of the divider back onto it.
    pub const fn marble_recycle() -> Self {
        Self {
            release_channels: 4,
            channel_accept_p: 0.9999,
            beats_per_release: 2,
            beats_to_transport: 16,
            divider_entry_start: 0,
            divider_entry_end: 0,
            reservoir_capacity: 4 * 70,
            reservoir_initial: 4 * 60,
        }
    }

    fn validate(&self, transport: &'static str, num_channels: usize) -> Result<(), ConfigError> {
        if self.release_channels == 0 {
            return Err(ConfigError::NoReleaseChannels { transport });
        }
        if self.release_channels > MAX_RELEASE_CHANNELS {
            return Err(ConfigError::TooManyReleaseChannels {
                transport,
                count: self.release_channels,
                max: MAX_RELEASE_CHANNELS,
            });
        }
        check_probability("lane acceptance", self.channel_accept_p)?;
        if self.beats_per_release == 0 {
            return Err(ConfigError::ZeroReleaseCadence { transport });
        }
        if self.beats_to_transport == 0 {
            return Err(ConfigError::ZeroLengthDelay { transport });
        }
        for entry in [self.divider_entry_start, self.divider_entry_end] {
            if entry >= num_channels {
                return Err(ConfigError::EntryPointOutOfRange { transport, entry, num_channels });
            }
        }
        Ok(())
    }
}

/// Complete machine configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
pub struct Settings {
    /// Channels on the divider (two per channel pair)
    pub num_channels: usize,
    /// Marbles held in the pipe between divider and gate
    pub max_marbles_per_channel: u32,
    /// Lower bound of the per-channel divider acceptance probability
    pub channel_accept_min: f64,
    /// Upper bound of the per-channel divider acceptance probability
    pub channel_accept_max: f64,
    /// Divider scan direction
    pub divider_direction: DividerDirection,
    /// Played marbles returning to the divider
    pub return_transport: TransportSettings,
    /// Marbles that fell off the end of the divider
    pub recycle_transport: TransportSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            num_channels: 38,
            max_marbles_per_channel: 32,
            channel_accept_min: 0.4,
            channel_accept_max: 0.8,
            divider_direction: DividerDirection::Forward,
            return_transport: TransportSettings::marble_return(),
            recycle_transport: TransportSettings::marble_recycle(),
        }
    }
}

impl Settings {
    /// Reject any configuration the engine cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_channels == 0 {
            return Err(ConfigError::NoChannels);
        }
        if self.max_marbles_per_channel == 0 {
            return Err(ConfigError::ZeroChannelCapacity);
        }
        check_probability("channel acceptance min", self.channel_accept_min)?;
        check_probability("channel acceptance max", self.channel_accept_max)?;
        if self.channel_accept_min > self.channel_accept_max {
            return Err(ConfigError::InvertedAcceptRange {
                min: self.channel_accept_min,
                max: self.channel_accept_max,
            });
        }
        self.return_transport.validate("return", self.num_channels)?;
        self.recycle_transport.validate("recycle", self.num_channels)?;
        // every per-channel, per-slot and reservoir count is a u32
        let total = self.initial_marbles();
        if total > u32::MAX as u64 {
            return Err(ConfigError::TooManyMarbles { total, max: u32::MAX as u64 });
        }
        Ok(())
    }

    /// Marbles in the machine at the start of a run: full channels plus both reservoirs.
    ///
    /// Saturates instead of wrapping for absurd channel counts.
    pub fn initial_marbles(&self) -> u64 {
        (self.num_channels as u64)
            .saturating_mul(self.max_marbles_per_channel as u64)
            .saturating_add(self.return_transport.reservoir_initial as u64)
            .saturating_add(self.recycle_transport.reservoir_initial as u64)
    }
}

fn check_probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ProbabilityOutOfRange { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(Settings::default().validate(), Ok(()));
    }

    #[test]
    fn default_marble_total() {
        // 38 full channels of 32 plus 240 waiting for the fishstair
        assert_eq!(Settings::default().initial_marbles(), 38 * 32 + 240);
    }

    #[test]
    fn rejects_zero_channels() {
        let settings = Settings { num_channels: 0, ..Settings::default() };
        assert_eq!(settings.validate(), Err(ConfigError::NoChannels));
    }

    #[test]
    fn rejects_inverted_accept_range() {
        let settings = Settings {
            channel_accept_min: 0.9,
            channel_accept_max: 0.1,
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(ConfigError::InvertedAcceptRange { .. })));
    }

    #[test]
    fn rejects_nan_probability() {
        let mut settings = Settings::default();
        settings.return_transport.channel_accept_p = f64::NAN;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::ProbabilityOutOfRange { name: "lane acceptance", .. })
        ));
    }

    #[test]
    fn rejects_zero_length_delay() {
        let mut settings = Settings::default();
        settings.recycle_transport.beats_to_transport = 0;
        assert_eq!(
            settings.validate(),
            Err(ConfigError::ZeroLengthDelay { transport: "recycle" })
        );
    }

    #[test]
    fn rejects_zero_cadence() {
        let mut settings = Settings::default();
        settings.return_transport.beats_per_release = 0;
        assert_eq!(
            settings.validate(),
            Err(ConfigError::ZeroReleaseCadence { transport: "return" })
        );
    }

    #[test]
    fn rejects_release_channel_counts() {
        let mut settings = Settings::default();
        settings.return_transport.release_channels = 0;
        assert_eq!(
            settings.validate(),
            Err(ConfigError::NoReleaseChannels { transport: "return" })
        );

        settings.return_transport.release_channels = MAX_RELEASE_CHANNELS + 1;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::TooManyReleaseChannels { count, .. }) if count == MAX_RELEASE_CHANNELS + 1
        ));
    }

    #[test]
    fn single_release_channel_is_valid() {
        let mut settings = Settings::default();
        settings.recycle_transport.release_channels = 1;
        assert_eq!(settings.validate(), Ok(()));
    }

    #[test]
    fn rejects_more_marbles_than_counters_hold() {
        let mut settings = Settings::default();
        settings.return_transport.reservoir_initial = u32::MAX;
        settings.return_transport.channel_accept_p = 0.0;
        assert_eq!(
            settings.validate(),
            Err(ConfigError::TooManyMarbles {
                total: 38 * 32 + 240 + u32::MAX as u64,
                max: u32::MAX as u64,
            })
        );

        // exactly u32::MAX marbles still fits
        settings.return_transport.reservoir_initial = u32::MAX - (38 * 32 + 240);
        assert_eq!(settings.validate(), Ok(()));
    }

    #[test]
    fn marble_total_saturates() {
        let settings = Settings { num_channels: usize::MAX, max_marbles_per_channel: u32::MAX, ..Settings::default() };
        assert_eq!(settings.initial_marbles(), u64::MAX);
        assert!(matches!(settings.validate(), Err(ConfigError::TooManyMarbles { .. })));
    }

    #[test]
    fn rejects_entry_point_past_last_channel() {
        let mut settings = Settings::default();
        settings.return_transport.divider_entry_end = 38;
        assert_eq!(
            settings.validate(),
            Err(ConfigError::EntryPointOutOfRange { transport: "return", entry: 38, num_channels: 38 })
        );
    }
}
