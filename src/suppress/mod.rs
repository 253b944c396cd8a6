//! Greedy non-maximum suppression behind interchangeable backends.
//!
//! Both backends implement the same greedy algorithm: walk the
//! score-descending candidate list, keep the head, and discard every pending
//! box whose IoU with the head is strictly above the threshold. The scalar
//! backend is the reference; the SIMD backend evaluates the identical
//! arithmetic eight boxes at a time and must return the identical kept-index
//! sequence. [`NmsBackend`] selects the implementation.

use crate::boxes::CornerBox;

pub mod scalar;

#[cfg(feature = "simd")]
pub mod simd;

/// Suppression strategy over a score-descending candidate list.
pub trait Suppressor {
    /// Returns the kept indices, in input (score-descending) order.
    ///
    /// `boxes` and `scores` must be aligned and already sorted by descending
    /// score, as produced by the confidence filter.
    fn suppress(boxes: &[CornerBox], scores: &[f32], iou_threshold: f32) -> Vec<usize>;
}

/// Which suppression implementation the pipeline runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NmsBackend {
    /// Reference scalar loop.
    #[default]
    Scalar,
    /// `wide`-vectorized path, output-identical to the scalar loop.
    #[cfg(feature = "simd")]
    Simd,
}

/// Runs suppression on the selected backend and applies the final
/// `keep_top_k` cap.
///
/// The cap is applied after suppression completes, so it limits output size
/// without changing which boxes win their overlaps.
pub fn suppress(
    backend: NmsBackend,
    boxes: &[CornerBox],
    scores: &[f32],
    iou_threshold: f32,
    keep_top_k: usize,
) -> Vec<usize> {
    let mut kept = match backend {
        NmsBackend::Scalar => scalar::ScalarNms::suppress(boxes, scores, iou_threshold),
        #[cfg(feature = "simd")]
        NmsBackend::Simd => simd::SimdNms::suppress(boxes, scores, iou_threshold),
    };
    kept.truncate(keep_top_k);
    kept
}
