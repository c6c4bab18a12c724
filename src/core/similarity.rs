//! Cosine similarity between pose vectors.

use crate::core::scoring::ScoringError;

/// Cosine similarity of two equal-length vectors.
///
/// Returns 0 when either vector is empty or has zero magnitude. Non-empty
/// vectors of different lengths are rejected rather than aligned.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Result<f64, ScoringError> {
    if a.is_empty() || b.is_empty() {
        return Ok(0.0);
    }
    if a.len() != b.len() {
        return Err(ScoringError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = magnitude(a);
    let norm_b = magnitude(b);

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / (norm_a * norm_b))
}

fn magnitude(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}
