//! Scoring of one live pose against a reference sequence.
//!
//! Each tick the live pose is compared with every frame in a small window
//! around the target index. Similarities are weighted by the reference
//! pose's confidence and nudged down by temporal distance, and the best
//! frame is remapped onto a 0-100 display score.

use crate::core::similarity::cosine_similarity;
use crate::core::vector::encode;
use crate::core::window::select_window;
use crate::pose::types::{Pose, PoseSequence};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Score deducted per frame of temporal distance.
pub const DISTANCE_PENALTY: f64 = 0.001;

/// Lowest `highest` score that maps above 0 on the display scale.
pub const NORMALIZE_FLOOR: f64 = 0.85;

/// `highest` score that maps to 100 on the display scale.
pub const NORMALIZE_CEILING: f64 = 1.0;

/// Largest supported rounding precision.
pub const MAX_DECIMALS: u32 = 10;

/// Scoring failures.
#[derive(Debug, Error, PartialEq)]
pub enum ScoringError {
    #[error("vector length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
    #[error("no aligned frame in window for target index {target_index}")]
    MissingAlignedFrame { target_index: usize },
    #[error("window size must be at least 1")]
    InvalidWindowSize,
    #[error("decimals must be at most 10, got {0}")]
    InvalidDecimals(u32),
    #[error("reference sequence is empty")]
    EmptyReference,
}

/// Tunables for a scoring call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Number of reference frames compared per tick
    pub window_size: usize,
    /// Decimal places kept on cosine similarity
    pub decimals: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            window_size: 5,
            decimals: 4,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ScoringError> {
        if self.window_size == 0 {
            return Err(ScoringError::InvalidWindowSize);
        }
        if self.decimals > MAX_DECIMALS {
            return Err(ScoringError::InvalidDecimals(self.decimals));
        }
        Ok(())
    }
}

/// Comparison of the live pose with one window candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreFrame {
    pub index: usize,
    /// Temporal offset from the target index
    pub distance: usize,
    pub cosine_similarity: f64,
    /// Cosine similarity scaled by the reference pose confidence
    pub weighted_similarity: f64,
    /// Weighted similarity minus the distance penalty
    pub score: f64,
}

impl ScoreFrame {
    /// Frame for a window index with no reference pose.
    fn missing(index: usize) -> Self {
        Self {
            index,
            distance: 1,
            cosine_similarity: 0.0,
            weighted_similarity: 0.0,
            score: 0.0,
        }
    }
}

/// Result of scoring one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// `highest` remapped from [0.85, 1.0] to [0, 100], floored at 0
    pub normalized: f64,
    /// Best frame score in the window
    pub highest: f64,
    /// Score of the frame aligned with the target index
    pub current: f64,
    /// Every window frame in index order
    pub all: Vec<ScoreFrame>,
}

/// Score `live` against `reference` at `target_index`.
pub fn score(
    live: &Pose,
    target_index: usize,
    reference: &PoseSequence,
    config: &ScoringConfig,
) -> Result<ScoreResult, ScoringError> {
    config.validate()?;
    if target_index >= reference.len() {
        return Err(ScoringError::MissingAlignedFrame { target_index });
    }

    let live_vector = encode(Some(live), true, true);
    let window = select_window(target_index, reference.len(), config.window_size);

    let all = window
        .iter()
        .map(|candidate| {
            let Some(pose) = reference.get(candidate.index) else {
                return Ok(ScoreFrame::missing(candidate.index));
            };

            let reference_vector = encode(Some(pose), true, true);
            let similarity = round_to(
                cosine_similarity(&live_vector, &reference_vector)?,
                config.decimals,
            );
            let weighted = pose.score * similarity;

            Ok(ScoreFrame {
                index: candidate.index,
                distance: candidate.distance,
                cosine_similarity: similarity,
                weighted_similarity: weighted,
                score: weighted - candidate.distance as f64 * DISTANCE_PENALTY,
            })
        })
        .collect::<Result<Vec<_>, ScoringError>>()?;

    let highest = all
        .iter()
        .map(|f| f.score)
        .fold(f64::NEG_INFINITY, f64::max);

    let current = all
        .iter()
        .find(|f| f.distance == 0)
        .map(|f| f.score)
        .ok_or(ScoringError::MissingAlignedFrame { target_index })?;

    let normalized = remap(highest, NORMALIZE_FLOOR, NORMALIZE_CEILING, 0.0, 100.0).max(0.0);

    tracing::debug!(target_index, highest, current, normalized, "scored tick");

    Ok(ScoreResult {
        normalized,
        highest,
        current,
        all,
    })
}

fn remap(value: f64, low1: f64, high1: f64, low2: f64, high2: f64) -> f64 {
    low2 + (high2 - low2) * (value - low1) / (high1 - low1)
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
