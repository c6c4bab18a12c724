//! Pose Match - pose-sequence similarity scoring for a webcam dance game.
//!
//! A performer's live pose is scored against a previously recorded
//! reference sequence (the "ghost"), tolerating small timing drift between
//! the two.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Pose Match                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐        │
//! │  │  Estimator  │──▶│   Session   │──▶│   Scoring   │        │
//! │  │ (external)  │   │ (per tick)  │   │  (window)   │        │
//! │  └─────────────┘   └─────────────┘   └─────────────┘        │
//! │         │                 ▲                 │               │
//! │         ▼                 │                 ▼               │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐        │
//! │  │  Recorder   │──▶│    Ghost    │   │ Vector +    │        │
//! │  │             │   │  Sequence   │   │ Similarity  │        │
//! │  └─────────────┘   └─────────────┘   └─────────────┘        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use pose_match::{MatchSession, Pose, PoseSequence, ScoringConfig, KEYPOINT_COUNT};
//!
//! let mut coords = [(0.0, 0.0); KEYPOINT_COUNT];
//! for (i, c) in coords.iter_mut().enumerate() {
//!     *c = (i as f64 * 3.0, (i % 5) as f64 * 8.0);
//! }
//! let pose = Pose::from_coordinates(1.0, &coords);
//! let ghost = PoseSequence::new(vec![pose.clone(); 10]);
//!
//! let mut session = MatchSession::new(ScoringConfig::default());
//! let result = session.tick(&pose, &ghost).unwrap();
//! assert!(result.normalized > 99.0);
//! ```

pub mod config;
pub mod core;
pub mod pose;
pub mod stats;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use self::core::{
    cosine_similarity, encode, score, select_window, MatchSession, ScoreFrame, ScoreResult,
    ScoringConfig, ScoringError, SessionSummary, WindowCandidate,
};
pub use pose::{
    BodyPart, Keypoint, Pose, PoseSequence, Position, Recorder, SequenceError, KEYPOINT_COUNT,
};
pub use stats::{Counter, MatchStats, StatsSnapshot};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// How the display score is computed, shown by the CLI.
pub const SCORING_NOTES: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║                    POSE MATCH - HOW SCORING WORKS                ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  Each tick your pose is compared with a few ghost frames around  ║
║  the current beat, so being slightly early or late is fine.      ║
║                                                                  ║
║  ✓ WHAT COUNTS:                                                  ║
║    • The shape of your pose (position and size on screen don't)  ║
║    • How confident the ghost recording was at that frame         ║
║    • Being close in time (a tiny penalty per frame of drift)     ║
║                                                                  ║
║  ✗ WHAT SCORES ZERO:                                             ║
║    • Anything below a very close match (similarity < 0.85)       ║
║    • Frames past the end of the ghost recording                  ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoring_notes_contents() {
        assert!(SCORING_NOTES.contains("HOW SCORING WORKS"));
        assert!(SCORING_NOTES.contains("0.85"));
    }
}
