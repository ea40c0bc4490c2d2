//! The marble machine: channels, divider and both feedback transports,
//! advanced one crank turn (beat) at a time.

use alloc::vec::Vec;
use mmx_ir::{ConfigError, Settings, Song};

use crate::channel::Channel;
use crate::divider::{Divider, Placement};
use crate::random::{uniform, RandomSource, Rng};
use crate::transport::MarbleTransport;

/// What happened during one beat.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepOutcome {
    /// Notes that dropped a marble
    pub played: u32,
    /// A note fired on an empty channel
    pub played_empty: bool,
    /// Recycle reservoir above capacity before this beat's notes
    pub recycle_overflowed: bool,
    /// Return reservoir above capacity before this beat's notes
    pub return_overflowed: bool,
}

/// Diagnostic copy of where every marble is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub beat: u64,
    pub channels: Vec<u32>,
    /// Return delay line, next arrival first
    pub return_queue: Vec<u32>,
    pub return_waiting: u32,
    /// Recycle delay line, next arrival first
    pub recycle_queue: Vec<u32>,
    pub recycle_waiting: u32,
}

/// The simulated machine.
pub struct Engine<S, R = Rng> {
    settings: Settings,
    divider: Divider,
    return_transport: MarbleTransport,
    recycle_transport: MarbleTransport,
    song: S,
    rng: R,
    /// Beats stepped so far
    beat: u64,
    initial_marbles: u64,
}

impl<S: Song> Engine<S, Rng> {
    /// Create an engine drawing from a freshly seeded generator.
    pub fn with_seed(settings: Settings, song: S, seed: u64) -> Result<Self, ConfigError> {
        Self::new(settings, song, Rng::with_seed(seed))
    }
}

impl<S: Song, R: RandomSource> Engine<S, R> {
    /// Build a machine with full channels and both reservoirs at their initial counts.
    ///
    /// Channel acceptance probabilities are drawn from `rng` in channel order.
    pub fn new(settings: Settings, song: S, mut rng: R) -> Result<Self, ConfigError> {
        settings.validate()?;
        if song.beat_count() == 0 {
            return Err(ConfigError::EmptySong);
        }
        if song.channel_count() > settings.num_channels {
            return Err(ConfigError::SongTooWide {
                song_channels: song.channel_count(),
                num_channels: settings.num_channels,
            });
        }

        let channels = (0..settings.num_channels)
            .map(|index| {
                let accept_p = uniform(&mut rng, settings.channel_accept_min, settings.channel_accept_max);
                Channel::new(index, accept_p, settings.max_marbles_per_channel)
            })
            .collect();
        let divider = Divider::new(channels, settings.divider_direction);
        let return_transport = MarbleTransport::new("return", settings.return_transport)?;
        let recycle_transport = MarbleTransport::new("recycle", settings.recycle_transport)?;

        let initial_marbles = settings.initial_marbles();
        log::debug!(
            "engine: {} channels, {} marbles, return entries {:?}, recycle entries {:?}",
            settings.num_channels,
            initial_marbles,
            return_transport.entry_points(),
            recycle_transport.entry_points(),
        );

        Ok(Self {
            settings,
            divider,
            return_transport,
            recycle_transport,
            song,
            rng,
            beat: 0,
            initial_marbles,
        })
    }

    /// Turn the crank once.
    ///
    /// Both transports advance, then release onto the divider (return first,
    /// each marble placed before the next lane draws). Overflow is sampled
    /// before the song's notes for this beat fire, and played marbles only
    /// join the return path once every note of the beat has resolved.
    pub fn step(&mut self) -> StepOutcome {
        let beat = self.beat;
        let mut return_cycle = self.return_transport.begin_beat(beat);
        let mut recycle_cycle = self.recycle_transport.begin_beat(beat);

        let mut recycled = 0;
        while let Some(entry) = self.return_transport.release_next(&mut return_cycle, &mut self.rng) {
            if self.divider.place_marble(entry, &mut self.rng) == Placement::Recycle {
                recycled += 1;
            }
        }
        while let Some(entry) = self.recycle_transport.release_next(&mut recycle_cycle, &mut self.rng) {
            if self.divider.place_marble(entry, &mut self.rng) == Placement::Recycle {
                recycled += 1;
            }
        }
        self.recycle_transport.add_marbles(recycled);

        let mut outcome = StepOutcome {
            recycle_overflowed: self.recycle_transport.overflowed(),
            return_overflowed: self.return_transport.overflowed(),
            ..StepOutcome::default()
        };

        let song_beat = (beat % self.song.beat_count() as u64) as usize;
        for index in self.song.notes_on_beat(song_beat) {
            match self.divider.channel_mut(index) {
                Some(channel) => {
                    if channel.fire() {
                        outcome.played += 1;
                    } else {
                        log::warn!("beat {}: channel {} fired while empty", beat, index);
                        outcome.played_empty = true;
                    }
                }
                None => log::warn!("beat {}: song fired nonexistent channel {}", beat, index),
            }
        }
        self.return_transport.add_marbles(outcome.played);

        self.beat += 1;
        outcome
    }

    /// Beats stepped so far.
    pub fn beat(&self) -> u64 {
        self.beat
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn song(&self) -> &S {
        &self.song
    }

    pub fn divider(&self) -> &Divider {
        &self.divider
    }

    pub fn channels(&self) -> &[Channel] {
        self.divider.channels()
    }

    pub fn channel(&self, index: usize) -> Option<&Channel> {
        self.divider.channel(index)
    }

    pub fn return_transport(&self) -> &MarbleTransport {
        &self.return_transport
    }

    pub fn recycle_transport(&self) -> &MarbleTransport {
        &self.recycle_transport
    }

    /// Lowest marble count across the channel bank.
    pub fn min_channel_count(&self) -> u32 {
        self.channels().iter().map(Channel::count).min().unwrap_or(0)
    }

    /// Marbles currently in the machine, wherever they are.
    pub fn total_marbles(&self) -> u64 {
        self.divider.total() + self.return_transport.total() + self.recycle_transport.total()
    }

    /// Marbles the machine was loaded with.
    pub fn initial_marbles(&self) -> u64 {
        self.initial_marbles
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            beat: self.beat,
            channels: self.channels().iter().map(Channel::count).collect(),
            return_queue: self.return_transport.delay_line().contents(),
            return_waiting: self.return_transport.reservoir_waiting(),
            recycle_queue: self.recycle_transport.delay_line().contents(),
            recycle_waiting: self.recycle_transport.reservoir_waiting(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::testing::Scripted;
    use alloc::vec;
    use mmx_ir::{DividerDirection, TransportSettings, WheelSong};

    fn quiet_transport(beats_to_transport: usize) -> TransportSettings {
        TransportSettings {
            release_channels: 2,
            channel_accept_p: 1.0,
            beats_per_release: 1,
            beats_to_transport,
            divider_entry_start: 0,
            divider_entry_end: 0,
            reservoir_capacity: 10,
            reservoir_initial: 0,
        }
    }

    fn small_settings() -> Settings {
        Settings {
            num_channels: 2,
            max_marbles_per_channel: 1,
            channel_accept_min: 0.5,
            channel_accept_max: 0.5,
            divider_direction: DividerDirection::Forward,
            return_transport: quiet_transport(3),
            recycle_transport: quiet_transport(3),
        }
    }

    /// Two channels, one beat; `notes[c]` notes on channel `c`.
    fn one_beat_song(notes: [u8; 2]) -> WheelSong {
        WheelSong::unmuted("test", vec![vec![notes[0]], vec![notes[1]]]).unwrap()
    }

    #[test]
    fn fires_notes_and_returns_marbles() {
        let mut engine = Engine::with_seed(small_settings(), one_beat_song([1, 0]), 1).unwrap();
        let outcome = engine.step();
        assert_eq!(outcome.played, 1);
        assert!(!outcome.played_empty);
        assert_eq!(engine.channel(0).unwrap().count(), 0);
        assert_eq!(engine.return_transport().in_transit(), 1);
        assert_eq!(engine.beat(), 1);
    }

    #[test]
    fn starvation_is_reported_without_underflow() {
        let mut engine = Engine::with_seed(small_settings(), one_beat_song([0, 1]), 1).unwrap();
        engine.divider.channel_mut(1).unwrap().count = 0;
        let outcome = engine.step();
        assert!(outcome.played_empty);
        assert_eq!(outcome.played, 0);
        assert_eq!(engine.channel(1).unwrap().count(), 0);
        assert_eq!(engine.return_transport().in_transit(), 0);
    }

    #[test]
    fn dry_and_full_channels_fire_in_the_same_beat() {
        let mut engine = Engine::with_seed(small_settings(), one_beat_song([1, 1]), 1).unwrap();
        engine.divider.channel_mut(0).unwrap().count = 0;
        let outcome = engine.step();
        assert_eq!(outcome.played, 1);
        assert!(outcome.played_empty);
        assert_eq!(engine.channel(1).unwrap().count(), 0);
        assert_eq!(engine.return_transport().in_transit(), 1);
    }

    #[test]
    fn played_marble_is_not_released_in_same_beat() {
        let mut settings = small_settings();
        settings.return_transport.beats_to_transport = 1;
        settings.channel_accept_min = 1.0;
        settings.channel_accept_max = 1.0;
        let mut engine = Engine::with_seed(settings, one_beat_song([1, 0]), 1).unwrap();

        engine.step();
        assert_eq!(engine.return_transport().in_transit(), 1);
        assert_eq!(engine.channel(0).unwrap().count(), 0);

        // arrives, is released onto the divider, refills channel 0, which fires again
        let outcome = engine.step();
        assert_eq!(outcome.played, 1);
        assert_eq!(engine.return_transport().reservoir_waiting(), 0);
        assert_eq!(engine.return_transport().in_transit(), 1);
    }

    #[test]
    fn overflow_is_sampled_before_notes() {
        let mut settings = small_settings();
        settings.return_transport.channel_accept_p = 0.0;
        settings.return_transport.reservoir_capacity = 0;
        settings.return_transport.reservoir_initial = 1;
        let mut engine = Engine::new(settings, one_beat_song([0, 0]), Scripted::constant(0.5)).unwrap();
        let outcome = engine.step();
        assert!(outcome.return_overflowed);
        assert!(!outcome.recycle_overflowed);
    }

    #[test]
    fn unplaced_marbles_go_to_recycle() {
        let mut settings = small_settings();
        settings.return_transport.reservoir_initial = 2;
        // channels start full, so both released marbles fall off the end
        let mut engine = Engine::with_seed(settings, one_beat_song([0, 0]), 9).unwrap();
        engine.step();
        assert_eq!(engine.return_transport().reservoir_waiting(), 0);
        assert_eq!(engine.recycle_transport().in_transit(), 2);
        assert_eq!(engine.total_marbles(), engine.initial_marbles());
    }

    #[test]
    fn release_and_placement_draws_interleave() {
        let mut settings = small_settings();
        settings.return_transport.channel_accept_p = 0.5;
        settings.return_transport.reservoir_initial = 2;
        let draws = [
            0.0, 0.0, // channel acceptance at construction
            0.1, // lane 0 releases
            0.9, 0.1, // channel 0 refuses, channel 1 takes it
            0.1, // lane 1 releases
            0.2, // channel 0 takes it
        ];
        let mut engine = Engine::new(settings, one_beat_song([0, 0]), Scripted::new(&draws)).unwrap();
        engine.divider.channel_mut(0).unwrap().count = 0;
        engine.divider.channel_mut(1).unwrap().count = 0;

        engine.step();
        assert_eq!(engine.channel(0).unwrap().count(), 1);
        assert_eq!(engine.channel(1).unwrap().count(), 1);
        assert_eq!(engine.rng.consumed(), draws.len());
    }

    #[test]
    fn conserves_marbles_under_default_settings() {
        let mut wheel = vec![vec![0u8; 64]; 38];
        for (channel, row) in wheel.iter_mut().enumerate() {
            for (beat, notes) in row.iter_mut().enumerate() {
                *notes = ((channel * 7 + beat * 3) % 5 == 0) as u8;
            }
        }
        let song = WheelSong::unmuted("busy", wheel).unwrap();
        let mut engine = Engine::with_seed(Settings::default(), song, 1234).unwrap();
        let initial = engine.total_marbles();
        assert_eq!(initial, engine.initial_marbles());
        for _ in 0..2000 {
            engine.step();
            assert_eq!(engine.total_marbles(), initial);
            assert!(engine.channels().iter().all(|c| c.count() <= c.max_count()));
        }
    }

    #[test]
    fn acceptance_drawn_within_range() {
        let settings = Settings::default();
        let wide = WheelSong::unmuted("wide", vec![vec![0]; 38]).unwrap();
        let engine = Engine::with_seed(settings, &wide, 5).unwrap();
        for channel in engine.channels() {
            assert!((0.4..=0.8).contains(&channel.accept_p()));
        }
    }

    #[test]
    fn rejects_song_wider_than_machine() {
        let song = WheelSong::unmuted("wide", vec![vec![0]; 3]).unwrap();
        assert_eq!(
            Engine::with_seed(small_settings(), song, 1).err(),
            Some(ConfigError::SongTooWide { song_channels: 3, num_channels: 2 })
        );
    }

    #[test]
    fn rejects_marble_totals_beyond_counter_range() {
        let mut settings = Settings::default();
        settings.return_transport.reservoir_initial = u32::MAX;
        settings.return_transport.channel_accept_p = 0.0;
        settings.return_transport.beats_to_transport = 1;
        let song = WheelSong::unmuted("every beat", vec![vec![1]; 38]).unwrap();
        assert!(matches!(
            Engine::with_seed(settings, song, 1).err(),
            Some(ConfigError::TooManyMarbles { .. })
        ));
    }

    #[test]
    fn snapshot_reports_queues_head_first() {
        let mut engine = Engine::with_seed(small_settings(), one_beat_song([1, 1]), 1).unwrap();
        engine.step();
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.beat, 1);
        assert_eq!(snapshot.channels, vec![0, 0]);
        assert_eq!(snapshot.return_queue, vec![0, 0, 2]);
        assert_eq!(snapshot.recycle_waiting, 0);
    }
}
