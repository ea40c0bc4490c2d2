//! Marble transport: a transit delay feeding a waiting reservoir that
//! releases marbles onto the divider.
//!
//! The return transport carries played marbles back up to the divider;
//! the recycle transport carries marbles that fell off the end of it.

use heapless::Vec as FixedVec;
use mmx_ir::{ConfigError, TransportSettings, MAX_RELEASE_CHANNELS};

use crate::delay_line::DelayLine;
use crate::random::{bernoulli, RandomSource};

/// Divider entry points released during one beat.
pub type Releases = FixedVec<usize, MAX_RELEASE_CHANNELS>;

/// Cursor over the release lanes of a single beat.
///
/// Obtained from [`MarbleTransport::begin_beat`] and drained with
/// [`MarbleTransport::release_next`].
#[derive(Clone, Copy, Debug)]
pub struct ReleaseCycle {
    /// Next lane to try
    lane: usize,
    /// False on off-cadence beats and once the reservoir runs dry
    open: bool,
}

/// One feedback path back onto the divider.
#[derive(Clone, Debug)]
pub struct MarbleTransport {
    name: &'static str,
    settings: TransportSettings,
    delay_line: DelayLine,
    /// Marbles done travelling, waiting for a lane
    pub(crate) reservoir_waiting: u32,
    /// Divider channel each lane drops onto
    entry_points: FixedVec<usize, MAX_RELEASE_CHANNELS>,
}

impl MarbleTransport {
    /// Build a transport with an empty delay line and its initial reservoir.
    pub fn new(name: &'static str, settings: TransportSettings) -> Result<Self, ConfigError> {
        if settings.release_channels == 0 {
            return Err(ConfigError::NoReleaseChannels { transport: name });
        }
        if settings.beats_per_release == 0 {
            return Err(ConfigError::ZeroReleaseCadence { transport: name });
        }
        let delay_line = DelayLine::new(settings.beats_to_transport)
            .ok_or(ConfigError::ZeroLengthDelay { transport: name })?;

        let mut entry_points = FixedVec::new();
        for lane in 0..settings.release_channels {
            entry_points
                .push(entry_point(&settings, lane))
                .map_err(|_| ConfigError::TooManyReleaseChannels {
                    transport: name,
                    count: settings.release_channels,
                    max: MAX_RELEASE_CHANNELS,
                })?;
        }

        Ok(Self {
            name,
            settings,
            delay_line,
            reservoir_waiting: settings.reservoir_initial,
            entry_points,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn settings(&self) -> &TransportSettings {
        &self.settings
    }

    pub fn delay_line(&self) -> &DelayLine {
        &self.delay_line
    }

    pub fn entry_points(&self) -> &[usize] {
        &self.entry_points
    }

    pub fn reservoir_waiting(&self) -> u32 {
        self.reservoir_waiting
    }

    /// Marbles still travelling.
    pub fn in_transit(&self) -> u64 {
        self.delay_line.total()
    }

    /// Every marble this transport holds, travelling or waiting.
    pub fn total(&self) -> u64 {
        self.in_transit() + self.reservoir_waiting as u64
    }

    /// More marbles waiting than the reservoir physically holds. Advisory only.
    pub fn overflowed(&self) -> bool {
        self.reservoir_waiting > self.settings.reservoir_capacity
    }

    /// Send `n` marbles down the transport; they wait at the reservoir after the full transit time.
    pub fn add_marbles(&mut self, n: u32) {
        self.delay_line.enqueue(n);
    }

    /// Move the delay line one beat and open this beat's release cycle.
    pub fn begin_beat(&mut self, beat: u64) -> ReleaseCycle {
        self.reservoir_waiting += self.delay_line.advance();
        ReleaseCycle {
            lane: 0,
            open: beat % self.settings.beats_per_release == 0,
        }
    }

    /// Try the remaining lanes in order until one picks up a marble.
    ///
    /// Returns the divider entry point of that lane, or `None` once every
    /// lane has been tried or nothing is left waiting.
    pub fn release_next<R: RandomSource + ?Sized>(
        &mut self,
        cycle: &mut ReleaseCycle,
        rng: &mut R,
    ) -> Option<usize> {
        while cycle.open && cycle.lane < self.entry_points.len() {
            if self.reservoir_waiting == 0 {
                cycle.open = false;
                break;
            }
            let lane = cycle.lane;
            cycle.lane += 1;
            if bernoulli(rng, self.settings.channel_accept_p) {
                self.reservoir_waiting -= 1;
                return Some(self.entry_points[lane]);
            }
        }
        None
    }

    /// Advance one beat and release everything this beat will release.
    pub fn step<R: RandomSource + ?Sized>(&mut self, beat: u64, rng: &mut R) -> Releases {
        let mut cycle = self.begin_beat(beat);
        let mut releases = Releases::new();
        while let Some(entry) = self.release_next(&mut cycle, rng) {
            let pushed = releases.push(entry);
            debug_assert!(pushed.is_ok(), "more releases than release lanes");
        }
        releases
    }
}

/// Lanes are spread evenly between the start and end entry points.
fn entry_point(settings: &TransportSettings, lane: usize) -> usize {
    let lanes = settings.release_channels;
    if lanes < 2 {
        return settings.divider_entry_start;
    }
    let start = settings.divider_entry_start as f64;
    let end = settings.divider_entry_end as f64;
    libm::floor(start + (end - start) * (lane as f64 / (lanes - 1) as f64)) as usize
}
