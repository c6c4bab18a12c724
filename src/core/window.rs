//! Temporal window selection around a target frame.
//!
//! The window tolerates timing drift between performer and reference. The
//! "before" half starts at the target and walks backwards, saturating at
//! index 0, so duplicates of frame 0 appear near the start of a sequence.
//! The "after" half is never clamped to the sequence end; indices past the
//! end are still returned and resolve to no pose when looked up.

use serde::{Deserialize, Serialize};

/// A frame index considered when scoring one live pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowCandidate {
    /// Index into the reference sequence (may be past its end)
    pub index: usize,
    /// Absolute offset from the target index
    pub distance: usize,
}

/// Split a window size into its before (target included) and after halves.
pub fn split_window(window_size: usize) -> (usize, usize) {
    let before = window_size.div_ceil(2);
    (before, window_size - before)
}

/// Select the candidate indices for `target_index`, sorted by index.
///
/// `sequence_length` does not bound the result; it is only used for
/// tracing. Indices past `usize::MAX` saturate.
pub fn select_window(
    target_index: usize,
    sequence_length: usize,
    window_size: usize,
) -> Vec<WindowCandidate> {
    let (before, after) = split_window(window_size);

    let mut indices: Vec<usize> = (0..before)
        .map(|i| target_index.saturating_sub(i))
        .chain((1..=after).map(|i| target_index.saturating_add(i)))
        .collect();
    indices.sort_unstable();

    let past_end = indices.iter().filter(|&&i| i >= sequence_length).count();
    if past_end > 0 {
        tracing::trace!(
            target_index,
            sequence_length,
            past_end,
            "window extends past sequence end"
        );
    }

    indices
        .into_iter()
        .map(|index| WindowCandidate {
            index,
            distance: target_index.abs_diff(index),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indices(window: &[WindowCandidate]) -> Vec<usize> {
        window.iter().map(|c| c.index).collect()
    }

    fn distances(window: &[WindowCandidate]) -> Vec<usize> {
        window.iter().map(|c| c.distance).collect()
    }

    #[test]
    fn test_split_window() {
        assert_eq!(split_window(5), (3, 2));
        assert_eq!(split_window(4), (2, 2));
        assert_eq!(split_window(1), (1, 0));
        assert_eq!(split_window(0), (0, 0));
    }

    #[test]
    fn test_centered_window() {
        let window = select_window(10, 100, 5);
        assert_eq!(indices(&window), vec![8, 9, 10, 11, 12]);
        assert_eq!(distances(&window), vec![2, 1, 0, 1, 2]);
    }

    #[test]
    fn test_start_clamp_keeps_duplicates() {
        let window = select_window(0, 100, 5);
        assert_eq!(indices(&window), vec![0, 0, 0, 1, 2]);
        assert_eq!(distances(&window), vec![0, 0, 0, 1, 2]);
        assert_eq!(window.iter().filter(|c| c.index == 0).count(), 3);
    }

    #[test]
    fn test_partial_clamp_near_start() {
        let window = select_window(1, 100, 5);
        assert_eq!(indices(&window), vec![0, 0, 1, 2, 3]);
    }

    #[test]
    fn test_end_is_not_clamped() {
        let window = select_window(9, 10, 5);
        assert_eq!(indices(&window), vec![7, 8, 9, 10, 11]);
        assert_eq!(distances(&window), vec![2, 1, 0, 1, 2]);
    }

    #[test]
    fn test_even_window() {
        let window = select_window(5, 10, 4);
        assert_eq!(indices(&window), vec![4, 5, 6, 7]);
    }

    #[test]
    fn test_huge_target_saturates() {
        let window = select_window(usize::MAX, 10, 5);
        assert_eq!(
            indices(&window),
            vec![usize::MAX - 2, usize::MAX - 1, usize::MAX, usize::MAX, usize::MAX]
        );
        assert_eq!(distances(&window), vec![2, 1, 0, 0, 0]);
    }

    #[test]
    fn test_single_frame_window() {
        let window = select_window(3, 10, 1);
        assert_eq!(indices(&window), vec![3]);
        assert_eq!(distances(&window), vec![0]);
    }
}
