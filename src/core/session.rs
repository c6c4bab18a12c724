//! Caller-owned state for a competitive match.
//!
//! The scoring engine is stateless. A [`MatchSession`] carries everything
//! that survives between ticks: the target index into the ghost sequence
//! and the running score.

use crate::core::scoring::{score, ScoreResult, ScoringConfig, ScoringError};
use crate::pose::types::{Pose, PoseSequence};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Aggregate of a finished (or running) match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Ticks that produced a score
    pub ticks: usize,
    /// Ticks skipped without scoring
    pub skipped: usize,
    /// Sum of normalized scores
    pub total: f64,
    pub mean: f64,
    pub std_dev: f64,
    /// Best normalized score of any tick
    pub best: f64,
    /// Times the ghost sequence looped back to its start
    pub wraps: usize,
}

/// Mutable match context driven once per detection tick.
#[derive(Debug, Clone)]
pub struct MatchSession {
    config: ScoringConfig,
    target_index: usize,
    total: f64,
    history: Vec<f64>,
    skipped: usize,
    wraps: usize,
}

impl MatchSession {
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            config,
            target_index: 0,
            total: 0.0,
            history: Vec::new(),
            skipped: 0,
            wraps: 0,
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Index of the ghost frame the next tick is aligned with.
    pub fn target_index(&self) -> usize {
        self.target_index
    }

    /// Running sum of normalized scores.
    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn ticks(&self) -> usize {
        self.history.len()
    }

    /// Score one live pose and advance to the next ghost frame.
    ///
    /// When the target index has run past the ghost's end it restarts at 0
    /// before scoring.
    pub fn tick(
        &mut self,
        live: &Pose,
        reference: &PoseSequence,
    ) -> Result<ScoreResult, ScoringError> {
        if reference.is_empty() {
            return Err(ScoringError::EmptyReference);
        }
        self.wrap_if_past_end(reference.len());

        let result = score(live, self.target_index, reference, &self.config)?;

        self.total += result.normalized;
        self.history.push(result.normalized);
        self.target_index += 1;

        Ok(result)
    }

    /// Advance without scoring, keeping the ghost in time.
    ///
    /// Leaves the session untouched when the reference is empty.
    pub fn skip(&mut self, reference: &PoseSequence) -> Result<(), ScoringError> {
        if reference.is_empty() {
            return Err(ScoringError::EmptyReference);
        }
        self.wrap_if_past_end(reference.len());
        self.skipped += 1;
        self.target_index += 1;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.target_index = 0;
        self.total = 0.0;
        self.history.clear();
        self.skipped = 0;
        self.wraps = 0;
    }

    pub fn summary(&self) -> SessionSummary {
        let (mean, std_dev, best) = if self.history.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            let std_dev = if self.history.len() < 2 {
                0.0
            } else {
                self.history.iter().population_std_dev()
            };
            (
                self.history.iter().mean(),
                std_dev,
                Statistics::max(self.history.iter()),
            )
        };

        SessionSummary {
            ticks: self.history.len(),
            skipped: self.skipped,
            total: self.total,
            mean,
            std_dev,
            best,
            wraps: self.wraps,
        }
    }

    fn wrap_if_past_end(&mut self, len: usize) {
        if self.target_index >= len {
            tracing::info!(
                target_index = self.target_index,
                len,
                "ghost sequence finished, restarting"
            );
            self.target_index = 0;
            self.wraps += 1;
        }
    }
}
