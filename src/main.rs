//! mmx-sim: estimate how long a song can run on the MMX before a channel runs dry.
//!
//! Usage:
//!   mmx-sim song.json
//!   mmx-sim song.json --settings machine.json --runs 16 --goal 200000
//!
//! Set `RUST_LOG=info` to see milestones and progress as they happen.

use anyhow::Context;
use clap::Parser;
use mmx_ir::DividerDirection;
use mmx_master::{describe_state, load_song, Controller, RunOptions, Settings, Song};

#[derive(Parser, Debug)]
#[clap(author, about, long_about = None)]
struct Args {
    /// Song to play, as a JSON wheel file
    song: String,

    /// Machine settings JSON; any field left out keeps its default
    #[clap(short = 's', long, value_parser)]
    settings: Option<String>,

    /// Seed of the first run (random when omitted)
    #[clap(long, value_parser)]
    seed: Option<u64>,

    /// Number of runs, seeded consecutively from --seed
    #[clap(short = 'n', long, value_parser = clap::value_parser!(u64).range(1..), default_value_t = 1)]
    runs: u64,

    /// Stop a run once this many marbles have been dropped
    #[clap(short = 'g', long, value_parser, default_value_t = 1_000_000)]
    goal: u64,

    /// Progress lines logged per run
    #[clap(long, value_parser, default_value_t = 20)]
    reports: u64,

    /// Scan the divider from the last channel towards the first
    #[clap(long, value_parser)]
    reverse_divider: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let song_json = std::fs::read_to_string(&args.song)
        .with_context(|| format!("error while opening {}", args.song))?;
    let song = load_song(&song_json).with_context(|| format!("error while parsing {}", args.song))?;
    let mut controller = Controller::new(Settings::default(), song);

    if let Some(path) = &args.settings {
        let settings_json =
            std::fs::read_to_string(path).with_context(|| format!("error while opening {path}"))?;
        controller
            .load_settings_json(&settings_json)
            .with_context(|| format!("error while parsing {path}"))?;
    }
    log::debug!("settings: {:?}", controller.settings());
    if args.reverse_divider {
        let settings = Settings {
            divider_direction: DividerDirection::Reverse,
            ..*controller.settings()
        };
        controller.set_settings(settings)?;
    }

    let song = controller.song();
    println!("Title:    {}", song.title);
    println!("Channels: {}", song.channel_count());
    println!("Beats:    {} ({} per wheel)", song.beat_count(), song.beats_per_wheel());
    println!("Notes:    {} ({:.2} per beat)", song.note_count(), song.notes_per_beat());
    println!();

    let first_seed = args.seed.unwrap_or_else(|| fastrand::u64(..));
    let options = RunOptions {
        seed: first_seed,
        marble_goal: args.goal,
        report_count: args.reports,
        record_trace: false,
    };

    if args.runs == 1 {
        let report = controller.run(&options)?;
        println!("{report}");
        println!();
        println!("{}", describe_state(&report.final_state));
        return Ok(());
    }

    let seeds: Vec<u64> = (0..args.runs).map(|i| first_seed.wrapping_add(i)).collect();
    let reports = controller.sweep(&options, &seeds)?;
    for report in &reports {
        println!("{report}");
    }
    let survived = reports.iter().filter(|report| report.survived()).count();
    println!();
    println!("{survived} of {} runs never ran dry", reports.len());
    Ok(())
}
