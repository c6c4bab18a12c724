//! Pose Match CLI
//!
//! Score a performance against a recorded ghost, record estimator output,
//! and replay or inspect recordings.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use crossbeam_channel::{bounded, RecvTimeoutError};
use pose_match::{
    config::Config,
    core::{BoundingBox, MatchSession, ScoringError, CANONICAL_LENGTH},
    pose::{parse_detection, store, Pose, Recorder},
    stats::{Counter, MatchStats},
    SCORING_NOTES, VERSION,
};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "pose-match")]
#[command(version = VERSION)]
#[command(about = "Score dance poses against a recorded ghost", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a recorded performance against a ghost recording
    Play {
        /// Ghost (reference) recording
        #[arg(long)]
        reference: PathBuf,

        /// Performance recording fed in as live detections
        #[arg(long)]
        performance: PathBuf,

        /// Number of ghost frames compared per tick
        #[arg(long)]
        window_size: Option<usize>,

        /// Decimal places kept on cosine similarity
        #[arg(long)]
        decimals: Option<u32>,

        /// Maximum detection ticks per second
        #[arg(long)]
        fps: Option<u32>,

        /// Print each tick's full score result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record estimator output (JSON lines on stdin) until EOF
    Record {
        /// Output file (defaults to a timestamped file in the export path)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Print the poses of a recording, optionally limited to a range
    Replay {
        #[arg(long, short)]
        input: PathBuf,

        /// First frame (inclusive)
        #[arg(long, default_value = "0")]
        from: usize,

        /// Last frame (exclusive)
        #[arg(long)]
        to: Option<usize>,

        /// Pace output at the configured tick rate
        #[arg(long)]
        realtime: bool,
    },

    /// Summarize a recording
    Inspect {
        #[arg(long, short)]
        input: PathBuf,
    },

    /// Show cumulative statistics
    Stats,

    /// Explain how scores are computed
    Notes,

    /// Show configuration
    Config,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            reference,
            performance,
            window_size,
            decimals,
            fps,
            json,
        } => cmd_play(&reference, &performance, window_size, decimals, fps, json),
        Commands::Record { output } => cmd_record(output),
        Commands::Replay {
            input,
            from,
            to,
            realtime,
        } => cmd_replay(&input, from, to, realtime),
        Commands::Inspect { input } => cmd_inspect(&input),
        Commands::Stats => cmd_stats(),
        Commands::Notes => {
            println!("{SCORING_NOTES}");
            Ok(())
        }
        Commands::Config => cmd_config(),
    }
}

const STATS_FILE: &str = "stats.json";

fn load_config() -> Config {
    Config::load().unwrap_or_else(|e| {
        warn!("Could not load config, using defaults: {e}");
        Config::default()
    })
}

fn open_stats(config: &Config) -> MatchStats {
    MatchStats::open(config.data_path.join(STATS_FILE)).unwrap_or_else(|e| {
        warn!("Could not load previous match stats, not saving this run: {e}");
        MatchStats::new()
    })
}

/// Which side of a length mismatch has the non-canonical pose.
///
/// Live poses are encoded first, so `left` is the live vector length.
fn mismatch_source(left: usize) -> &'static str {
    if left == CANONICAL_LENGTH {
        "ghost frame"
    } else {
        "live pose"
    }
}

fn cmd_play(
    reference: &Path,
    performance: &Path,
    window_size: Option<usize>,
    decimals: Option<u32>,
    fps: Option<u32>,
    json: bool,
) -> Result<()> {
    let mut config = load_config();
    if let Some(size) = window_size {
        config.scoring.window_size = size;
    }
    if let Some(d) = decimals {
        config.scoring.decimals = d;
    }
    if let Some(fps) = fps {
        config.tick_interval = Config::interval_for_fps(fps);
    }
    config.validate().context("invalid configuration")?;
    if let Err(e) = config.ensure_directories() {
        warn!("Could not create directories: {e}");
    }

    let ghost = store::load(reference)
        .with_context(|| format!("loading ghost recording {}", reference.display()))?;
    let feed = store::load(performance)
        .with_context(|| format!("loading performance recording {}", performance.display()))?;
    if ghost.is_empty() {
        anyhow::bail!("ghost recording {} has no poses", reference.display());
    }

    println!("Pose Match v{VERSION}");
    println!();
    println!("  Ghost frames: {}", ghost.len());
    println!("  Performance frames: {}", feed.len());
    println!("  Window size: {}", config.scoring.window_size);
    println!("  Tick interval: {}ms", config.tick_interval.as_millis());
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let stats = open_stats(&config);

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone())?;

    // The feeder stands in for the estimator, emitting one detection per tick.
    let (sender, receiver) = bounded::<Pose>(64);
    let feeder_running = running.clone();
    let interval = config.tick_interval;
    let feeder = thread::spawn(move || {
        for pose in feed.into_inner() {
            if !feeder_running.load(Ordering::SeqCst) || sender.send(pose).is_err() {
                break;
            }
            thread::sleep(interval);
        }
    });

    let mut session = MatchSession::new(config.scoring);
    let mut completed = false;

    while running.load(Ordering::SeqCst) {
        let pose = match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(pose) => pose,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                completed = true;
                break;
            }
        };

        if !pose.is_confident(config.min_pose_confidence) {
            debug!(score = pose.score, "live pose below confidence threshold");
            session.skip(&ghost)?;
            stats.add(Counter::TicksSkipped, 1);
            continue;
        }

        let result = match session.tick(&pose, &ghost) {
            Ok(result) => result,
            Err(ScoringError::LengthMismatch { left, right }) => {
                warn!(
                    target_index = session.target_index(),
                    live_len = left,
                    ghost_len = right,
                    "Skipping tick, {} has a non-canonical keypoint count",
                    mismatch_source(left)
                );
                session.skip(&ghost)?;
                stats.add(Counter::TicksSkipped, 1);
                continue;
            }
            Err(e) => return Err(anyhow::Error::new(e).context("scoring failed")),
        };
        stats.add(Counter::TicksScored, 1);

        if json {
            println!("{}", serde_json::to_string(&result)?);
        } else {
            let aligned = result
                .all
                .iter()
                .find(|f| f.distance == 0)
                .map(|f| f.index)
                .unwrap_or_default();
            println!(
                "[{:>5}] ghost frame {:>4} | score {:>6.2} | highest {:.4} | current {:.4} | total {:.1}",
                session.ticks(),
                aligned,
                result.normalized,
                result.highest,
                result.current,
                session.total()
            );
        }
    }

    running.store(false, Ordering::SeqCst);
    drop(receiver);
    if feeder.join().is_err() {
        warn!("Performance feeder thread panicked");
    }

    let summary = session.summary();
    if completed {
        stats.record_match(&summary);
    }

    println!();
    println!("Match {}", if completed { "complete" } else { "stopped" });
    println!("  Ticks scored: {}", summary.ticks);
    println!("  Ticks skipped: {}", summary.skipped);
    println!("  Total score: {:.1}", summary.total);
    println!("  Mean score: {:.2} (std dev {:.2})", summary.mean, summary.std_dev);
    println!("  Best tick: {:.2}", summary.best);
    println!("  Ghost loops: {}", summary.wraps);
    println!("  Run time: {}s", stats.running_for().num_seconds());

    if let Err(e) = stats.save() {
        warn!("Could not save match stats: {e}");
    }

    println!();
    println!("{}", stats.snapshot());
    Ok(())
}

fn cmd_record(output: Option<PathBuf>) -> Result<()> {
    let config = load_config();
    let stats = open_stats(&config);

    let output = output.unwrap_or_else(|| {
        let id = uuid::Uuid::new_v4().simple().to_string();
        config.export_path.join(format!(
            "recording_{}_{}.json",
            Utc::now().format("%Y%m%d_%H%M%S"),
            &id[..8]
        ))
    });

    info!("Recording detections from stdin until EOF");

    let mut recorder = Recorder::new();
    let mut rejected = 0usize;
    let stdin = std::io::stdin();

    for (line_no, line) in stdin.lock().lines().enumerate() {
        let line = line.context("reading stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_detection(&line) {
            Ok(poses) => {
                stats.add(Counter::PosesRecorded, poses.len() as u64);
                recorder.extend(poses);
            }
            Err(e) => {
                rejected += 1;
                warn!(line = line_no + 1, "Skipping detection: {e}");
            }
        }
    }

    let count = recorder.len();
    let sequence = recorder.finish();
    store::save(&output, &sequence)
        .with_context(|| format!("writing recording {}", output.display()))?;

    println!("Recorded {count} poses to {output:?}");
    if rejected > 0 {
        println!("Skipped {rejected} unreadable line(s)");
    }

    if let Err(e) = stats.save() {
        warn!("Could not save match stats: {e}");
    }
    Ok(())
}

fn cmd_replay(input: &Path, from: usize, to: Option<usize>, realtime: bool) -> Result<()> {
    let config = load_config();
    let sequence =
        store::load(input).with_context(|| format!("loading recording {}", input.display()))?;

    let to = to.unwrap_or(sequence.len());
    let frames = sequence.window(from, to);
    if frames.is_empty() {
        println!("No frames in range {from}..{to} (recording has {})", sequence.len());
        return Ok(());
    }

    for (offset, pose) in frames.iter().enumerate() {
        let marker = if offset + 1 == frames.len() { "*" } else { " " };
        println!(
            "{marker} frame {:>5} | confidence {:.3} | visible keypoints {:>2}/{:<2}{}",
            from + offset,
            pose.score,
            pose.visible_keypoints(config.min_part_confidence).count(),
            pose.keypoints.len(),
            if pose.is_confident(config.min_pose_confidence) {
                ""
            } else {
                " (below pose threshold)"
            }
        );
        if realtime {
            thread::sleep(config.tick_interval);
        }
    }
    Ok(())
}

fn cmd_inspect(input: &Path) -> Result<()> {
    let config = load_config();
    let sequence =
        store::load(input).with_context(|| format!("loading recording {}", input.display()))?;

    let mut confident = 0usize;
    let mut non_canonical = 0usize;
    let mut unknown_parts = 0usize;
    let mut degenerate = 0usize;
    for pose in &sequence {
        if pose.is_confident(config.min_pose_confidence) {
            confident += 1;
        }
        if !pose.has_canonical_keypoints() {
            non_canonical += 1;
        }
        unknown_parts += pose
            .keypoints
            .iter()
            .filter(|k| k.body_part().is_none())
            .count();
        if BoundingBox::of(pose).is_some_and(|b| b.width() == 0.0 || b.height() == 0.0) {
            degenerate += 1;
        }
    }

    println!("Recording: {input:?}");
    println!("  Poses: {}", sequence.len());
    println!("  Mean confidence: {:.3}", sequence.mean_confidence());
    println!(
        "  Above pose threshold ({}): {}",
        config.min_pose_confidence, confident
    );
    println!("  Non-canonical keypoint count: {non_canonical}");
    println!("  Unrecognized keypoint names: {unknown_parts}");
    println!("  Zero-extent bounding box: {degenerate}");
    Ok(())
}

fn cmd_stats() -> Result<()> {
    let config = load_config();
    let stats_path = config.data_path.join(STATS_FILE);

    if !stats_path.exists() {
        println!("No previous match data found.");
        return Ok(());
    }

    let stats = MatchStats::open(&stats_path)
        .with_context(|| format!("reading {}", stats_path.display()))?;
    println!("{}", stats.snapshot());
    Ok(())
}

fn cmd_config() -> Result<()> {
    let config = load_config();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) -> Result<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .context("setting Ctrl+C handler")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_source_names_the_short_side() {
        assert_eq!(mismatch_source(CANONICAL_LENGTH), "ghost frame");
        assert_eq!(mismatch_source(20), "live pose");
    }

    #[test]
    fn test_cli_parses_play_overrides() {
        let cli = Cli::try_parse_from([
            "pose-match",
            "play",
            "--reference",
            "ghost.json",
            "--performance",
            "me.json",
            "--window-size",
            "7",
        ])
        .unwrap();
        match cli.command {
            Commands::Play {
                window_size, json, ..
            } => {
                assert_eq!(window_size, Some(7));
                assert!(!json);
            }
            _ => panic!("expected play"),
        }
    }
}
