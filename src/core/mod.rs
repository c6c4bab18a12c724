//! Core scoring functionality.
//!
//! This module contains:
//! - Pose vector encoding with bounding-box normalization
//! - Cosine similarity between pose vectors
//! - Temporal window selection around a target frame
//! - The scoring engine and the caller-owned match session

pub mod scoring;
pub mod session;
pub mod similarity;
pub mod vector;
pub mod window;

// Re-export commonly used types
pub use scoring::{score, ScoreFrame, ScoreResult, ScoringConfig, ScoringError};
pub use session::{MatchSession, SessionSummary};
pub use similarity::cosine_similarity;
pub use vector::{encode, BoundingBox, PoseVector, CANONICAL_LENGTH};
pub use window::{select_window, WindowCandidate};
