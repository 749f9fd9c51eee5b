use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use lyric_sync_core::{
    parse_with_mode, parse_with_report, AppConfig, LyricsError, ParseMode, PlaybackClock,
    Position, Timeline,
};
use tracing_subscriber::EnvFilter;

fn main() -> lyric_sync_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::Inspect {
            transcript,
            strict,
            json,
        } => run_inspect(&config, &transcript, strict, json),
        Commands::At {
            transcript,
            seconds,
        } => run_at(&config, &transcript, seconds),
        Commands::Play {
            transcript,
            from,
            until,
            realtime,
        } => run_play(&config, &transcript, from, until, realtime),
    }
}

fn run_inspect(
    config: &AppConfig,
    transcript: &Path,
    strict: bool,
    json: bool,
) -> lyric_sync_core::Result<()> {
    let strict = strict || config.parser.mode == ParseMode::Strict;
    tracing::info!(?transcript, strict, "inspecting transcript");
    let text = std::fs::read_to_string(transcript)?;

    let report = parse_with_report(&text);
    if strict {
        report.ensure_clean()?;
    }

    if json {
        println!("{}", report.timeline.to_json()?);
    } else {
        for (index, line) in report.timeline.iter().enumerate() {
            println!("{index:>4}  {line}");
        }
    }

    for skipped in &report.skipped {
        tracing::warn!(line_number = skipped.line_number, content = %skipped.content, "skipped line");
    }
    tracing::info!(
        lines = report.timeline.len(),
        skipped = report.skipped_count(),
        "transcript parsed"
    );
    Ok(())
}

fn run_at(config: &AppConfig, transcript: &Path, seconds: f64) -> lyric_sync_core::Result<()> {
    let timeline = load(config, transcript)?;
    let position = timeline.position(seconds);
    println!("current: {}", describe(&timeline, position.current));
    println!("next:    {}", describe(&timeline, position.next));
    Ok(())
}

fn run_play(
    config: &AppConfig,
    transcript: &Path,
    from: f64,
    until: Option<f64>,
    realtime: bool,
) -> lyric_sync_core::Result<()> {
    let timeline = load(config, transcript)?;
    let interval = config.playback.poll_interval();
    let end = playback_end(from, until, timeline.last_timestamp())?;
    tracing::info!(from, end, ?interval, "starting simulated playback");

    let mut clock = PlaybackClock::new();
    clock.seek(from);
    let mut cursor = timeline.cursor();
    let mut previous: Option<Position> = None;

    while clock.time_seconds <= end {
        let position = if config.playback.use_cursor {
            cursor.advance(clock.time_seconds)
        } else {
            timeline.position(clock.time_seconds)
        };

        if previous.map_or(true, |last| position.changed_from(&last)) {
            println!(
                "{:>8.2}s  {}",
                clock.time_seconds,
                describe(&timeline, position.current)
            );
        }
        previous = Some(position);

        if realtime {
            std::thread::sleep(interval);
        }
        clock.advance(interval.as_secs_f64());
    }

    tracing::debug!(seeks = cursor.seeks(), "playback finished");
    Ok(())
}

/// Resolves where simulated playback stops. Both ends must be finite or the
/// clock would never reach them.
fn playback_end(from: f64, until: Option<f64>, last: Option<f64>) -> lyric_sync_core::Result<f64> {
    if !from.is_finite() {
        return Err(LyricsError::msg(format!("start position must be finite, got {from}")));
    }
    match until {
        Some(end) if !end.is_finite() => Err(LyricsError::msg(format!(
            "stop position must be finite, got {end}"
        ))),
        Some(end) => Ok(end),
        None => Ok(last.unwrap_or(from)),
    }
}

fn load(config: &AppConfig, transcript: &Path) -> lyric_sync_core::Result<Timeline> {
    let text = std::fs::read_to_string(transcript)?;
    parse_with_mode(&text, config.parser.mode)
}

fn describe(timeline: &Timeline, index: Option<usize>) -> String {
    match index.and_then(|index| timeline.get(index)) {
        Some(line) => line.to_string(),
        None => "-".to_string(),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Timed transcript follower", long_about = None)]
struct Cli {
    /// Optional JSON configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a transcript and print its timeline.
    Inspect {
        /// Path to the transcript file.
        transcript: PathBuf,
        /// Fail instead of skipping lines without a timestamp tag.
        #[arg(long)]
        strict: bool,
        /// Print the timeline as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show the current and next line at a playback time.
    At {
        transcript: PathBuf,
        /// Playback position in seconds.
        #[arg(allow_negative_numbers = true)]
        seconds: f64,
    },
    /// Simulate playback and print every highlight change.
    Play {
        transcript: PathBuf,
        /// Start position in seconds.
        #[arg(long, default_value_t = 0.0)]
        from: f64,
        /// Stop position in seconds; defaults to the last line.
        #[arg(long)]
        until: Option<f64>,
        /// Sleep between ticks instead of running as fast as possible.
        #[arg(long)]
        realtime: bool,
    },
}
