//! Headless controller for the MMX simulator.
//!
//! Owns a song and machine settings, and drives seeded runs of the engine
//! until a channel runs dry or the marble goal is reached. The CLI and the
//! integration tests share this API.

mod report;

use std::num::NonZeroUsize;
use std::thread;

use mmx_engine::Engine;

// Re-export common types so callers don't need mmx-ir/mmx-engine directly.
pub use mmx_engine::Snapshot;
pub use mmx_formats::{load_settings, load_song, FormatError};
pub use mmx_ir::{ConfigError, DividerDirection, Settings, Song, WheelSong};

pub use report::{describe_state, Milestone, RunReport, TraceRow};

/// Knobs for a single run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunOptions {
    pub seed: u64,
    /// Stop once more than this many marbles have been dropped
    pub marble_goal: u64,
    /// Progress lines logged over the course of a full run
    pub report_count: u64,
    /// Keep a `TraceRow` per beat
    pub record_trace: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            seed: 0,
            marble_goal: 1_000_000,
            report_count: 20,
            record_trace: false,
        }
    }
}

/// Headless simulator controller: owns a song and the machine it runs on.
pub struct Controller {
    settings: Settings,
    song: WheelSong,
}

impl Controller {
    pub fn new(settings: Settings, song: WheelSong) -> Self {
        Self { settings, song }
    }

    // --- Song and settings management ---

    pub fn song(&self) -> &WheelSong {
        &self.song
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn load_song_json(&mut self, json: &str) -> Result<(), FormatError> {
        self.song = mmx_formats::load_song(json)?;
        Ok(())
    }

    pub fn load_settings_json(&mut self, json: &str) -> Result<(), FormatError> {
        self.settings = mmx_formats::load_settings(json)?;
        Ok(())
    }

    pub fn set_settings(&mut self, settings: Settings) -> Result<(), ConfigError> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    // --- Runs ---

    /// Run one seeded machine until a channel runs dry or the goal is passed.
    pub fn run(&self, options: &RunOptions) -> Result<RunReport, ConfigError> {
        if self.song.note_count() == 0 {
            return Err(ConfigError::SilentSong);
        }
        let mut engine = Engine::with_seed(self.settings, &self.song, options.seed)?;
        let beat_count = self.song.beat_count() as f64;
        let milestone = |marbles_played: u64, beat: u64| Milestone {
            marbles_played,
            beat,
            song_plays: beat as f64 / beat_count,
        };

        log::info!(
            "seed {}: running \"{}\" ({} notes per cycle) to {} marbles",
            options.seed,
            self.song.title,
            self.song.note_count(),
            options.marble_goal
        );

        let report_every = options
            .marble_goal
            .checked_div(options.report_count)
            .filter(|&step| step > 0);
        let mut last_report = 0;
        let mut marbles_played = 0;
        let mut ran_dry = None;
        let mut recycle_overflow = None;
        let mut return_overflow = None;
        let mut trace = Vec::new();

        while marbles_played <= options.marble_goal {
            let outcome = engine.step();
            if outcome.played_empty {
                let dry = milestone(marbles_played, engine.beat());
                log::info!("seed {}: ran dry {}", options.seed, dry);
                ran_dry = Some(dry);
                break;
            }
            if outcome.recycle_overflowed && recycle_overflow.is_none() {
                let overflow = milestone(marbles_played, engine.beat());
                log::info!("seed {}: fishstair overflowed {}", options.seed, overflow);
                recycle_overflow = Some(overflow);
            }
            if outcome.return_overflowed && return_overflow.is_none() {
                let overflow = milestone(marbles_played, engine.beat());
                log::info!("seed {}: conveyor overflowed {}", options.seed, overflow);
                return_overflow = Some(overflow);
            }
            marbles_played += u64::from(outcome.played);

            if options.record_trace {
                trace.push(TraceRow {
                    marbles_played,
                    min_channel: engine.min_channel_count(),
                    return_waiting: engine.return_transport().reservoir_waiting(),
                    recycle_waiting: engine.recycle_transport().reservoir_waiting(),
                });
            }

            if let Some(step) = report_every {
                if marbles_played > last_report + step {
                    last_report += step;
                    log::info!("seed {}: played {} marbles", options.seed, marbles_played);
                }
            }
        }

        if ran_dry.is_none() {
            log::info!(
                "seed {}: never ran dry, {} marbles over {} crank turns",
                options.seed,
                marbles_played,
                engine.beat()
            );
        }

        Ok(RunReport {
            seed: options.seed,
            marbles_played,
            beats: engine.beat(),
            song_plays: engine.beat() as f64 / beat_count,
            ran_dry,
            recycle_overflow,
            return_overflow,
            trace,
            final_state: engine.snapshot(),
        })
    }

    /// Run one independent machine per seed across worker threads.
    ///
    /// Reports come back in the order of `seeds`; every other option is shared.
    pub fn sweep(&self, options: &RunOptions, seeds: &[u64]) -> Result<Vec<RunReport>, ConfigError> {
        let workers = thread::available_parallelism().map_or(1, NonZeroUsize::get);
        let per_worker = seeds.len().div_ceil(workers).max(1);

        thread::scope(|scope| {
            let handles: Vec<_> = seeds
                .chunks(per_worker)
                .map(|chunk| {
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|&seed| self.run(&RunOptions { seed, ..*options }))
                            .collect::<Result<Vec<_>, _>>()
                    })
                })
                .collect();

            let mut reports = Vec::with_capacity(seeds.len());
            for handle in handles {
                match handle.join() {
                    Ok(chunk) => reports.extend(chunk?),
                    Err(panic) => std::panic::resume_unwind(panic),
                }
            }
            Ok(reports)
        })
    }
}
