//! Pose data types consumed by the scoring engine.
//!
//! A pose is produced by an external estimator and never mutated afterwards.
//! Keypoint order carries anatomical identity, so every type here preserves
//! the order it was given.

use serde::{Deserialize, Serialize};

/// Number of keypoints emitted by the reference (PoseNet) model.
pub const KEYPOINT_COUNT: usize = 17;

/// The 17 PoseNet body parts in model output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BodyPart {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl BodyPart {
    /// All parts in canonical order.
    pub const ALL: [BodyPart; KEYPOINT_COUNT] = [
        BodyPart::Nose,
        BodyPart::LeftEye,
        BodyPart::RightEye,
        BodyPart::LeftEar,
        BodyPart::RightEar,
        BodyPart::LeftShoulder,
        BodyPart::RightShoulder,
        BodyPart::LeftElbow,
        BodyPart::RightElbow,
        BodyPart::LeftWrist,
        BodyPart::RightWrist,
        BodyPart::LeftHip,
        BodyPart::RightHip,
        BodyPart::LeftKnee,
        BodyPart::RightKnee,
        BodyPart::LeftAnkle,
        BodyPart::RightAnkle,
    ];

    /// The part name as written by the estimator.
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyPart::Nose => "nose",
            BodyPart::LeftEye => "leftEye",
            BodyPart::RightEye => "rightEye",
            BodyPart::LeftEar => "leftEar",
            BodyPart::RightEar => "rightEar",
            BodyPart::LeftShoulder => "leftShoulder",
            BodyPart::RightShoulder => "rightShoulder",
            BodyPart::LeftElbow => "leftElbow",
            BodyPart::RightElbow => "rightElbow",
            BodyPart::LeftWrist => "leftWrist",
            BodyPart::RightWrist => "rightWrist",
            BodyPart::LeftHip => "leftHip",
            BodyPart::RightHip => "rightHip",
            BodyPart::LeftKnee => "leftKnee",
            BodyPart::RightKnee => "rightKnee",
            BodyPart::LeftAnkle => "leftAnkle",
            BodyPart::RightAnkle => "rightAnkle",
        }
    }

    /// Look up a part by its estimator name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.as_str() == name)
    }
}

/// Image-space position of a keypoint.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A single body-part estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    /// Part identifier as emitted by the estimator
    pub part: String,
    /// Position in image coordinates
    pub position: Position,
    /// Confidence in [0, 1]
    pub score: f64,
}

impl Keypoint {
    pub fn new(part: BodyPart, x: f64, y: f64, score: f64) -> Self {
        Self {
            part: part.as_str().to_string(),
            position: Position { x, y },
            score,
        }
    }

    /// Resolve the part name, if it is one of the known PoseNet parts.
    pub fn body_part(&self) -> Option<BodyPart> {
        BodyPart::from_name(&self.part)
    }
}

/// One detection: an overall confidence plus ordered keypoints.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    /// Overall confidence in [0, 1]
    pub score: f64,
    /// Keypoints in model output order
    pub keypoints: Vec<Keypoint>,
}

impl Pose {
    pub fn new(score: f64, keypoints: Vec<Keypoint>) -> Self {
        Self { score, keypoints }
    }

    /// Build a full 17-keypoint pose from `(x, y)` pairs in canonical order.
    ///
    /// Every keypoint gets the same confidence as the pose.
    pub fn from_coordinates(score: f64, coords: &[(f64, f64); KEYPOINT_COUNT]) -> Self {
        let keypoints = BodyPart::ALL
            .iter()
            .zip(coords.iter())
            .map(|(&part, &(x, y))| Keypoint::new(part, x, y, score))
            .collect();
        Self { score, keypoints }
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    /// Whether the detection clears the minimum pose confidence.
    pub fn is_confident(&self, min_pose_confidence: f64) -> bool {
        self.score >= min_pose_confidence
    }

    /// Keypoints at or above the part confidence threshold.
    pub fn visible_keypoints(&self, min_part_confidence: f64) -> impl Iterator<Item = &Keypoint> {
        self.keypoints
            .iter()
            .filter(move |k| k.score >= min_part_confidence)
    }

    /// Whether the keypoint count matches the reference model.
    pub fn has_canonical_keypoints(&self) -> bool {
        self.keypoints.len() == KEYPOINT_COUNT
    }
}

/// An ordered recording of poses, one per frame.
///
/// Index is the only addressing key. Once built the sequence is read-only;
/// appending happens through [`crate::pose::Recorder`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoseSequence {
    poses: Vec<Pose>,
}

impl PoseSequence {
    pub fn new(poses: Vec<Pose>) -> Self {
        Self { poses }
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    /// Pose at `index`, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<&Pose> {
        self.poses.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Pose> {
        self.poses.iter()
    }

    pub fn poses(&self) -> &[Pose] {
        &self.poses
    }

    /// Half-open `[min, max)` replay range, clamped to the sequence.
    pub fn window(&self, min: usize, max: usize) -> &[Pose] {
        let end = max.min(self.poses.len());
        let start = min.min(end);
        &self.poses[start..end]
    }

    /// Mean overall confidence, or 0 for an empty sequence.
    pub fn mean_confidence(&self) -> f64 {
        if self.poses.is_empty() {
            return 0.0;
        }
        self.poses.iter().map(|p| p.score).sum::<f64>() / self.poses.len() as f64
    }

    pub fn into_inner(self) -> Vec<Pose> {
        self.poses
    }
}

impl From<Vec<Pose>> for PoseSequence {
    fn from(poses: Vec<Pose>) -> Self {
        Self::new(poses)
    }
}

impl<'a> IntoIterator for &'a PoseSequence {
    type Item = &'a Pose;
    type IntoIter = std::slice::Iter<'a, Pose>;

    fn into_iter(self) -> Self::IntoIter {
        self.poses.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_coords() -> [(f64, f64); KEYPOINT_COUNT] {
        let mut coords = [(0.0, 0.0); KEYPOINT_COUNT];
        for (i, c) in coords.iter_mut().enumerate() {
            *c = (i as f64 * 10.0, (i % 4) as f64 * 5.0);
        }
        coords
    }

    #[test]
    fn test_body_part_names_round_trip() {
        for part in BodyPart::ALL {
            assert_eq!(BodyPart::from_name(part.as_str()), Some(part));
        }
        assert_eq!(BodyPart::from_name("tail"), None);
    }

    #[test]
    fn test_keypoint_body_part_lookup() {
        let pose = Pose::from_coordinates(0.9, &square_coords());
        let parts: Vec<_> = pose.keypoints.iter().filter_map(Keypoint::body_part).collect();
        assert_eq!(parts, BodyPart::ALL.to_vec());

        let odd = Keypoint {
            part: "tail".to_string(),
            position: Position::default(),
            score: 0.5,
        };
        assert_eq!(odd.body_part(), None);
    }

    #[test]
    fn test_pose_from_coordinates_preserves_order() {
        let pose = Pose::from_coordinates(0.9, &square_coords());
        assert!(pose.has_canonical_keypoints());
        assert_eq!(pose.keypoints[0].part, "nose");
        assert_eq!(pose.keypoints[16].part, "rightAnkle");
        assert_eq!(pose.keypoints[3].position.x, 30.0);
    }

    #[test]
    fn test_confidence_filters() {
        let mut pose = Pose::from_coordinates(0.05, &square_coords());
        assert!(!pose.is_confident(0.1));
        pose.keypoints[0].score = 0.9;
        assert_eq!(pose.visible_keypoints(0.5).count(), 1);
    }

    #[test]
    fn test_sequence_window_clamps() {
        let seq = PoseSequence::new(vec![Pose::default(); 4]);
        assert_eq!(seq.window(1, 3).len(), 2);
        assert_eq!(seq.window(2, 100).len(), 2);
        assert!(seq.window(10, 20).is_empty());
        assert!(seq.window(3, 1).is_empty());
    }

    #[test]
    fn test_sequence_from_vec_iterates_in_order() {
        let poses: Vec<Pose> = [0.2, 0.4, 0.9]
            .iter()
            .map(|&score| Pose::new(score, Vec::new()))
            .collect();
        let seq = PoseSequence::from(poses);

        let mut scores = Vec::new();
        for pose in &seq {
            scores.push(pose.score);
        }
        assert_eq!(scores, vec![0.2, 0.4, 0.9]);
        assert!((seq.mean_confidence() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_keypoint_serde_shape() {
        let kp = Keypoint::new(BodyPart::LeftWrist, 1.5, 2.5, 0.7);
        let json = serde_json::to_value(&kp).unwrap();
        assert_eq!(json["part"], "leftWrist");
        assert_eq!(json["position"]["x"], 1.5);
        assert_eq!(json["position"]["y"], 2.5);
    }
}
