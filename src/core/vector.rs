//! Pose to vector encoding.
//!
//! A pose is flattened into `[y0, x0, y1, x1, ...]` in keypoint order.
//! Vectors are compared purely by position, so the y-before-x layout and
//! the keypoint order must never change.

use crate::pose::types::{Pose, KEYPOINT_COUNT};

/// Expected vector length for the reference model.
pub const CANONICAL_LENGTH: usize = KEYPOINT_COUNT * 2;

/// Flattened pose coordinates.
pub type PoseVector = Vec<f64>;

/// Axis-aligned bounding box of a pose's keypoint positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Compute the bounding box, or `None` for a pose without keypoints.
    pub fn of(pose: &Pose) -> Option<Self> {
        let first = pose.keypoints.first()?;
        let init = Self {
            min_x: first.position.x,
            max_x: first.position.x,
            min_y: first.position.y,
            max_y: first.position.y,
        };

        Some(pose.keypoints.iter().fold(init, |b, k| Self {
            min_x: b.min_x.min(k.position.x),
            max_x: b.max_x.max(k.position.x),
            min_y: b.min_y.min(k.position.y),
            max_y: b.max_y.max(k.position.y),
        }))
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Encode a pose into a vector.
///
/// With `normalize`, each axis is remapped from the pose's own bounding box
/// into [0, 1]. An axis with zero extent encodes as 0 on that axis.
/// With `enforce_length`, longer vectors are truncated to
/// [`CANONICAL_LENGTH`]; shorter ones are kept and logged.
pub fn encode(pose: Option<&Pose>, normalize: bool, enforce_length: bool) -> PoseVector {
    let pose = match pose {
        Some(p) if !p.is_empty() => p,
        _ => return Vec::new(),
    };

    let mut out: PoseVector = match BoundingBox::of(pose).filter(|_| normalize) {
        Some(bounds) => pose
            .keypoints
            .iter()
            .flat_map(|k| {
                [
                    unit_remap(k.position.y, bounds.min_y, bounds.max_y),
                    unit_remap(k.position.x, bounds.min_x, bounds.max_x),
                ]
            })
            .collect(),
        None => pose
            .keypoints
            .iter()
            .flat_map(|k| [k.position.y, k.position.x])
            .collect(),
    };

    if enforce_length && out.len() != CANONICAL_LENGTH {
        if out.len() < CANONICAL_LENGTH {
            tracing::warn!(
                length = out.len(),
                expected = CANONICAL_LENGTH,
                "pose vector shorter than canonical length"
            );
        }
        out.truncate(CANONICAL_LENGTH);
    }

    out
}

/// Linear remap of `value` from `[low, high]` into `[0, 1]`.
fn unit_remap(value: f64, low: f64, high: f64) -> f64 {
    let extent = high - low;
    if extent == 0.0 {
        return 0.0;
    }
    (value - low) / extent
}
