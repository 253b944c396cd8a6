//! Pre-suppression confidence filter.

use crate::boxes::CornerBox;
use crate::util::{DetPostError, DetPostResult};

/// A decoded box that survived the confidence filter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub bbox: CornerBox,
    pub score: f32,
}

/// Keeps boxes scoring strictly above `confidence_threshold`, sorted by
/// descending score, truncated to at most `top_k` entries.
///
/// Ties are broken by original index ascending so the ranking is fully
/// deterministic; NaN scores never pass the strict comparison. An empty
/// result is a normal outcome, not an error.
pub fn filter_candidates(
    boxes: &[CornerBox],
    scores: &[f32],
    confidence_threshold: f32,
    top_k: usize,
) -> DetPostResult<Vec<Candidate>> {
    if boxes.len() != scores.len() {
        return Err(DetPostError::ShapeMismatch {
            expected: boxes.len(),
            got: scores.len(),
            context: "candidate scores",
        });
    }

    let mut order: Vec<usize> = (0..scores.len())
        .filter(|&i| scores[i] > confidence_threshold)
        .collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then_with(|| a.cmp(&b)));
    order.truncate(top_k);

    Ok(order
        .into_iter()
        .map(|i| Candidate {
            bbox: boxes[i],
            score: scores[i],
        })
        .collect())
}
