//! Cumulative match statistics.
//!
//! One atomic counter per [`Counter`] kind plus the best display score of
//! any completed match. The persisted form is the [`StatsSnapshot`] itself.

use crate::core::SessionSummary;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("stats file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stats file is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Event kinds counted across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Counter {
    TicksScored,
    /// Low-confidence or malformed detections
    TicksSkipped,
    PosesRecorded,
    MatchesCompleted,
}

impl Counter {
    pub const ALL: [Counter; 4] = [
        Counter::TicksScored,
        Counter::TicksSkipped,
        Counter::PosesRecorded,
        Counter::MatchesCompleted,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Counter::TicksScored => "Ticks scored",
            Counter::TicksSkipped => "Ticks skipped",
            Counter::PosesRecorded => "Poses recorded",
            Counter::MatchesCompleted => "Matches completed",
        }
    }
}

/// Counters for this process, optionally backed by a file.
#[derive(Debug)]
pub struct MatchStats {
    counts: [AtomicU64; 4],
    /// Best normalized score as `f64` bits
    best_score: AtomicU64,
    started: DateTime<Utc>,
    path: Option<PathBuf>,
}

impl MatchStats {
    /// In-memory stats that are never saved.
    pub fn new() -> Self {
        Self {
            counts: Default::default(),
            best_score: AtomicU64::new(0f64.to_bits()),
            started: Utc::now(),
            path: None,
        }
    }

    /// Stats backed by `path`, resuming its totals when the file exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StatsError> {
        let path = path.into();
        let mut stats = Self::new();
        if path.exists() {
            let saved: StatsSnapshot = serde_json::from_str(&fs::read_to_string(&path)?)?;
            stats.restore(&saved);
            tracing::debug!(path = %path.display(), "resumed match stats");
        }
        stats.path = Some(path);
        Ok(stats)
    }

    pub fn add(&self, counter: Counter, n: u64) {
        self.counts[counter as usize].fetch_add(n, Ordering::Relaxed);
    }

    pub fn count(&self, counter: Counter) -> u64 {
        self.counts[counter as usize].load(Ordering::Relaxed)
    }

    pub fn best_score(&self) -> f64 {
        f64::from_bits(self.best_score.load(Ordering::Relaxed))
    }

    /// Fold a completed match into the totals.
    pub fn record_match(&self, summary: &SessionSummary) {
        self.add(Counter::MatchesCompleted, 1);
        let best = summary.best;
        let _ = self
            .best_score
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                (best > f64::from_bits(bits)).then(|| best.to_bits())
            });
    }

    pub fn running_for(&self) -> Duration {
        Utc::now() - self.started
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            counts: Counter::ALL.iter().map(|&c| (c, self.count(c))).collect(),
            best_score: self.best_score(),
            updated: Utc::now(),
        }
    }

    /// Write the current snapshot to the backing file, if there is one.
    pub fn save(&self) -> Result<(), StatsError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&self.snapshot())?)?;
        Ok(())
    }

    pub fn reset(&self) {
        for slot in &self.counts {
            slot.store(0, Ordering::Relaxed);
        }
        self.best_score.store(0f64.to_bits(), Ordering::Relaxed);
    }

    fn restore(&mut self, saved: &StatsSnapshot) {
        for counter in Counter::ALL {
            self.counts[counter as usize].store(saved.count(counter), Ordering::Relaxed);
        }
        self.best_score
            .store(saved.best_score.to_bits(), Ordering::Relaxed);
    }
}

impl Default for MatchStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time totals, also the on-disk format of `stats.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub counts: BTreeMap<Counter, u64>,
    pub best_score: f64,
    pub updated: DateTime<Utc>,
}

impl StatsSnapshot {
    pub fn count(&self, counter: Counter) -> u64 {
        self.counts.get(&counter).copied().unwrap_or(0)
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Match Statistics:")?;
        for counter in Counter::ALL {
            writeln!(f, "  {:<18} {}", counter.label(), self.count(counter))?;
        }
        write!(f, "  {:<18} {:.2}", "Best match score", self.best_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn summary(best: f64) -> SessionSummary {
        SessionSummary {
            ticks: 3,
            skipped: 0,
            total: best * 3.0,
            mean: best,
            std_dev: 0.0,
            best,
            wraps: 0,
        }
    }

    #[test]
    fn test_counting() {
        let stats = MatchStats::new();
        stats.add(Counter::TicksScored, 2);
        stats.add(Counter::TicksSkipped, 1);
        stats.add(Counter::PosesRecorded, 7);

        let snap = stats.snapshot();
        assert_eq!(snap.count(Counter::TicksScored), 2);
        assert_eq!(snap.count(Counter::TicksSkipped), 1);
        assert_eq!(snap.count(Counter::PosesRecorded), 7);
        assert_eq!(snap.count(Counter::MatchesCompleted), 0);
    }

    #[test]
    fn test_best_score_only_rises() {
        let stats = MatchStats::new();
        stats.record_match(&summary(62.5));
        stats.record_match(&summary(40.0));
        assert_eq!(stats.best_score(), 62.5);
        assert_eq!(stats.count(Counter::MatchesCompleted), 2);

        stats.reset();
        assert_eq!(stats.best_score(), 0.0);
        assert_eq!(stats.count(Counter::MatchesCompleted), 0);
    }

    #[test]
    fn test_counts_from_many_threads() {
        let stats = Arc::new(MatchStats::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let stats = Arc::clone(&stats);
                thread::spawn(move || {
                    for _ in 0..250 {
                        stats.add(Counter::TicksScored, 1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(stats.count(Counter::TicksScored), 1000);
    }

    #[test]
    fn test_open_resumes_saved_totals() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("stats.json");

        let stats = MatchStats::open(&path).unwrap();
        assert_eq!(stats.count(Counter::TicksScored), 0);
        stats.add(Counter::TicksScored, 5);
        stats.record_match(&summary(88.0));
        stats.save().unwrap();

        let resumed = MatchStats::open(&path).unwrap();
        assert_eq!(resumed.count(Counter::TicksScored), 5);
        assert_eq!(resumed.count(Counter::MatchesCompleted), 1);
        assert_eq!(resumed.best_score(), 88.0);
    }

    #[test]
    fn test_open_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(MatchStats::open(&path), Err(StatsError::Json(_))));
    }

    #[test]
    fn test_snapshot_json_uses_counter_names() {
        let stats = MatchStats::new();
        stats.add(Counter::PosesRecorded, 3);
        let json = serde_json::to_value(stats.snapshot()).unwrap();
        assert_eq!(json["counts"]["poses_recorded"], 3);
    }

    #[test]
    fn test_display_lists_every_counter() {
        let text = MatchStats::new().snapshot().to_string();
        for counter in Counter::ALL {
            assert!(text.contains(counter.label()));
        }
        assert!(text.contains("Best match score"));
    }

    #[test]
    fn test_unsaved_stats_write_nothing() {
        assert!(MatchStats::new().save().is_ok());
    }
}
