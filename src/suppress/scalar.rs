//! Reference scalar suppression loop.

use crate::boxes::CornerBox;
use crate::suppress::Suppressor;

/// Greedy NMS, one IoU at a time. This is the semantic ground truth the
/// vectorized backend is tested against.
pub struct ScalarNms;

impl Suppressor for ScalarNms {
    fn suppress(boxes: &[CornerBox], scores: &[f32], iou_threshold: f32) -> Vec<usize> {
        debug_assert_eq!(boxes.len(), scores.len());
        debug_assert!(
            scores.windows(2).all(|pair| pair[0] >= pair[1]),
            "suppression input must be sorted by descending score"
        );

        let mut removed = vec![false; boxes.len()];
        let mut kept = Vec::new();

        for i in 0..boxes.len() {
            if removed[i] {
                continue;
            }
            kept.push(i);
            let head = boxes[i];
            for j in (i + 1)..boxes.len() {
                if !removed[j] && head.iou(&boxes[j]) > iou_threshold {
                    removed[j] = true;
                }
            }
        }

        kept
    }
}

#[cfg(test)]
mod tests {
    use super::ScalarNms;
    use crate::boxes::CornerBox;
    use crate::suppress::Suppressor;

    #[test]
    fn duplicate_boxes_keep_only_the_leader() {
        let b = CornerBox::new(10.0, 10.0, 20.0, 20.0);
        let kept = ScalarNms::suppress(&[b, b], &[0.9, 0.85], 0.2);
        assert_eq!(kept, vec![0]);
    }

    #[test]
    fn disjoint_boxes_all_survive() {
        let a = CornerBox::new(0.0, 0.0, 10.0, 10.0);
        let b = CornerBox::new(50.0, 50.0, 60.0, 60.0);
        let kept = ScalarNms::suppress(&[a, b], &[0.9, 0.8], 0.1);
        assert_eq!(kept, vec![0, 1]);
    }

    #[test]
    fn iou_exactly_at_threshold_survives() {
        // IoU(a, b) = 25 / 175 with these corners
        let a = CornerBox::new(0.0, 0.0, 10.0, 10.0);
        let b = CornerBox::new(5.0, 5.0, 15.0, 15.0);
        let threshold = 25.0 / 175.0;

        let kept = ScalarNms::suppress(&[a, b], &[0.9, 0.8], threshold);
        assert_eq!(kept, vec![0, 1]);
    }

    #[test]
    fn suppression_is_not_transitive() {
        // b overlaps both neighbors; a and c are disjoint. Greedy keeps a,
        // removes b, then keeps c because only the kept head suppresses.
        let a = CornerBox::new(0.0, 0.0, 10.0, 10.0);
        let b = CornerBox::new(8.0, 0.0, 18.0, 10.0);
        let c = CornerBox::new(16.0, 0.0, 26.0, 10.0);

        let kept = ScalarNms::suppress(&[a, b, c], &[0.9, 0.8, 0.7], 0.1);
        assert_eq!(kept, vec![0, 2]);
    }

    #[test]
    fn degenerate_boxes_neither_suppress_nor_get_suppressed() {
        let flat = CornerBox::new(5.0, 0.0, 5.0, 10.0);
        let full = CornerBox::new(0.0, 0.0, 10.0, 10.0);

        let kept = ScalarNms::suppress(&[flat, full], &[0.9, 0.8], 0.1);
        assert_eq!(kept, vec![0, 1]);

        let kept = ScalarNms::suppress(&[flat, flat], &[0.9, 0.8], 0.1);
        assert_eq!(kept, vec![0, 1]);
    }

    #[test]
    fn empty_input_keeps_nothing() {
        let kept = ScalarNms::suppress(&[], &[], 0.5);
        assert!(kept.is_empty());
    }
}
