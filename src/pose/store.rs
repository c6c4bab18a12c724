//! Recording, persistence and replay of pose sequences.
//!
//! Recordings are written as `{ "poseRecords": [...], "poseVideo": [...] }`.
//! Older recordings are a bare array of poses; both shapes load into the
//! same [`PoseSequence`]. Video frames are never interpreted here.

use crate::pose::types::{Pose, PoseSequence};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised at the load/save boundary.
#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid pose at index {index}: {reason}")]
    InvalidPose { index: usize, reason: String },
}

/// On-disk recording layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingFile {
    pub pose_records: Vec<Pose>,
    /// Encoded video frames; carried through untouched
    #[serde(default)]
    pub pose_video: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredRecording {
    File(RecordingFile),
    Bare(Vec<Pose>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Detection {
    Single(Pose),
    Multi(Vec<Pose>),
}

/// Parse one line of estimator output: a pose or an array of poses.
pub fn parse_detection(line: &str) -> Result<Vec<Pose>, SequenceError> {
    let poses = match serde_json::from_str::<Detection>(line)? {
        Detection::Single(pose) => vec![pose],
        Detection::Multi(poses) => poses,
    };

    for (index, pose) in poses.iter().enumerate() {
        validate_pose(pose).map_err(|reason| SequenceError::InvalidPose { index, reason })?;
    }

    Ok(poses)
}

/// Parse and validate a recording from a JSON string.
pub fn parse_recording(json: &str) -> Result<PoseSequence, SequenceError> {
    let poses = match serde_json::from_str::<StoredRecording>(json)? {
        StoredRecording::File(file) => file.pose_records,
        StoredRecording::Bare(poses) => poses,
    };

    for (index, pose) in poses.iter().enumerate() {
        validate_pose(pose).map_err(|reason| SequenceError::InvalidPose { index, reason })?;
    }

    Ok(poses.into())
}

/// Load and validate a recording file.
pub fn load(path: &Path) -> Result<PoseSequence, SequenceError> {
    let content = std::fs::read_to_string(path)?;
    let sequence = parse_recording(&content)?;
    tracing::info!(path = %path.display(), poses = sequence.len(), "loaded pose sequence");
    Ok(sequence)
}

/// Write a sequence as a recording file, creating parent directories.
pub fn save(path: &Path, sequence: &PoseSequence) -> Result<(), SequenceError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = RecordingFile {
        pose_records: sequence.poses().to_vec(),
        pose_video: Vec::new(),
    };
    let json = serde_json::to_string_pretty(&file)?;
    std::fs::write(path, json)?;

    tracing::info!(path = %path.display(), poses = sequence.len(), "saved pose sequence");
    Ok(())
}

fn validate_pose(pose: &Pose) -> Result<(), String> {
    if !is_confidence(pose.score) {
        return Err(format!("pose score {} outside [0, 1]", pose.score));
    }

    for (i, keypoint) in pose.keypoints.iter().enumerate() {
        if !keypoint.position.x.is_finite() || !keypoint.position.y.is_finite() {
            return Err(format!("keypoint {i} ({}) has a non-finite position", keypoint.part));
        }
        if !is_confidence(keypoint.score) {
            return Err(format!(
                "keypoint {i} ({}) score {} outside [0, 1]",
                keypoint.part, keypoint.score
            ));
        }
    }

    Ok(())
}

fn is_confidence(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

/// Append-only collector for a live recording.
#[derive(Debug, Default)]
pub struct Recorder {
    poses: Vec<Pose>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one detection.
    pub fn push(&mut self, pose: Pose) {
        self.poses.push(pose);
    }

    /// Append every pose of a multi-person detection, in detection order.
    pub fn extend<I>(&mut self, poses: I)
    where
        I: IntoIterator<Item = Pose>,
    {
        self.poses.extend(poses);
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    /// Close the recording.
    pub fn finish(self) -> PoseSequence {
        self.poses.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::types::{BodyPart, Keypoint};

    fn pose(score: f64) -> Pose {
        Pose::new(
            score,
            vec![
                Keypoint::new(BodyPart::Nose, 10.0, 20.0, 0.9),
                Keypoint::new(BodyPart::LeftEye, 12.0, 18.0, 0.8),
            ],
        )
    }

    #[test]
    fn test_parse_object_shape_ignores_video() {
        let json = r#"{
            "poseRecords": [
                {"score": 0.5, "keypoints": [
                    {"part": "nose", "position": {"x": 1.0, "y": 2.0}, "score": 0.9}
                ]}
            ],
            "poseVideo": ["blob:1", {"frame": 2}]
        }"#;

        let seq = parse_recording(json).unwrap();
        assert_eq!(seq.len(), 1);
        assert_eq!(seq.get(0).unwrap().keypoints[0].position.y, 2.0);
    }

    #[test]
    fn test_parse_bare_array_shape() {
        let json = r#"[{"score": 0.5, "keypoints": []}, {"score": 0.7, "keypoints": []}]"#;
        let seq = parse_recording(json).unwrap();
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.get(1).unwrap().score, 0.7);
    }

    #[test]
    fn test_parse_rejects_out_of_range_confidence() {
        let json = r#"[{"score": 0.5, "keypoints": []}, {"score": 1.5, "keypoints": []}]"#;
        match parse_recording(json) {
            Err(SequenceError::InvalidPose { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected InvalidPose, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_recording(r#"{"something": 1}"#),
            Err(SequenceError::Json(_))
        ));
    }

    #[test]
    fn test_parse_detection_single_and_multi() {
        let single = r#"{"score": 0.8, "keypoints": []}"#;
        assert_eq!(parse_detection(single).unwrap().len(), 1);

        let multi = r#"[{"score": 0.8, "keypoints": []}, {"score": 0.3, "keypoints": []}]"#;
        let poses = parse_detection(multi).unwrap();
        assert_eq!(poses.len(), 2);
        assert_eq!(poses[1].score, 0.3);

        let bad = r#"{"score": 0.8, "keypoints": [
            {"part": "nose", "position": {"x": 1.0, "y": 2.0}, "score": -0.1}
        ]}"#;
        assert!(matches!(
            parse_detection(bad),
            Err(SequenceError::InvalidPose { index: 0, .. })
        ));
    }

    #[test]
    fn test_recorder_appends_in_order() {
        let mut recorder = Recorder::new();
        recorder.push(pose(0.1));
        recorder.extend(vec![pose(0.2), pose(0.3)]);
        assert_eq!(recorder.len(), 3);

        let seq = recorder.finish();
        let scores: Vec<f64> = seq.iter().map(|p| p.score).collect();
        assert_eq!(scores, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("take.json");
        let seq = PoseSequence::new(vec![pose(0.4), pose(0.6)]);

        save(&path, &seq).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("poseRecords"));
        assert!(content.contains("poseVideo"));

        assert_eq!(load(&path).unwrap(), seq);
    }
}
