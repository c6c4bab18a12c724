//! Pose data and sequence storage.
//!
//! This module contains:
//! - The pose data model (keypoints, poses, sequences)
//! - Recording and loading of pose sequences

pub mod store;
pub mod types;

// Re-export commonly used types
pub use store::{parse_detection, parse_recording, RecordingFile, Recorder, SequenceError};
pub use types::{BodyPart, Keypoint, Pose, PoseSequence, Position, KEYPOINT_COUNT};
