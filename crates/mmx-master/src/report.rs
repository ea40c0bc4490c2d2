use std::fmt;

use mmx_engine::Snapshot;

/// Where a run stood when something notable first happened.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Milestone {
    /// Marbles dropped before the beat on which it happened
    pub marbles_played: u64,
    /// Crank turns completed, that beat included
    pub beat: u64,
    /// `beat` measured in plays of the song
    pub song_plays: f64,
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "after {} marbles dropped, {} crank turns, or {:.2} plays of the song",
            self.marbles_played, self.beat, self.song_plays
        )
    }
}

/// One beat of a recorded run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceRow {
    pub marbles_played: u64,
    /// Fewest marbles held by any channel
    pub min_channel: u32,
    pub return_waiting: u32,
    pub recycle_waiting: u32,
}

/// Outcome of one seeded run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunReport {
    pub seed: u64,
    pub marbles_played: u64,
    pub beats: u64,
    pub song_plays: f64,
    /// Set when a note fired on an empty channel, ending the run
    pub ran_dry: Option<Milestone>,
    pub recycle_overflow: Option<Milestone>,
    pub return_overflow: Option<Milestone>,
    /// Per-beat trace, empty unless requested
    pub trace: Vec<TraceRow>,
    pub final_state: Snapshot,
}

impl RunReport {
    /// Whether the run reached its marble goal without a channel running dry.
    pub fn survived(&self) -> bool {
        self.ran_dry.is_none()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seed {}: ", self.seed)?;
        match &self.ran_dry {
            Some(milestone) => write!(f, "ran dry {}", milestone)?,
            None => write!(
                f,
                "never ran dry ({} marbles, {} crank turns)",
                self.marbles_played, self.beats
            )?,
        }
        if let Some(milestone) = &self.recycle_overflow {
            write!(f, "; fishstair overflowed {}", milestone)?;
        }
        if let Some(milestone) = &self.return_overflow {
            write!(f, "; conveyor overflowed {}", milestone)?;
        }
        Ok(())
    }
}

/// Multi-line dump of where every marble sits.
pub fn describe_state(state: &Snapshot) -> String {
    let join = |counts: &[u32]| {
        counts
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        "beat {}\nchannels: {}\nreturn queue: {} ({} waiting)\nrecycle queue: {} ({} waiting)",
        state.beat,
        join(&state.channels),
        join(&state.return_queue),
        state.return_waiting,
        join(&state.recycle_queue),
        state.recycle_waiting
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(ran_dry: Option<Milestone>) -> RunReport {
        RunReport {
            seed: 7,
            marbles_played: 120,
            beats: 64,
            song_plays: 1.0,
            ran_dry,
            recycle_overflow: None,
            return_overflow: None,
            trace: Vec::new(),
            final_state: Snapshot {
                beat: 64,
                channels: vec![3, 0],
                return_queue: vec![1, 2],
                return_waiting: 4,
                recycle_queue: vec![0],
                recycle_waiting: 5,
            },
        }
    }

    #[test]
    fn summary_line() {
        assert_eq!(
            report(None).to_string(),
            "seed 7: never ran dry (120 marbles, 64 crank turns)"
        );

        let dry = Milestone { marbles_played: 100, beat: 32, song_plays: 0.5 };
        let dry_report = report(Some(dry));
        assert!(!dry_report.survived());
        assert_eq!(
            dry_report.to_string(),
            "seed 7: ran dry after 100 marbles dropped, 32 crank turns, or 0.50 plays of the song"
        );
    }

    #[test]
    fn state_dump() {
        let text = describe_state(&report(None).final_state);
        assert_eq!(
            text,
            "beat 64\nchannels: 3, 0\nreturn queue: 1, 2 (4 waiting)\nrecycle queue: 0 (5 waiting)"
        );
    }
}
