//! SIMD suppression using the `wide` crate.
//!
//! The head box is broadcast across lanes and compared against eight pending
//! boxes per iteration. Every lane evaluates the same max/min/mul/div
//! expression the scalar loop evaluates on the same operands, so for finite
//! inputs the kept-index sequence is bit-identical to [`ScalarNms`].
//!
//! [`ScalarNms`]: crate::suppress::scalar::ScalarNms

use crate::boxes::CornerBox;
use crate::suppress::Suppressor;
use wide::f32x8;

const LANES: usize = 8;

/// Load 8 f32 values into f32x8.
#[inline]
fn load_f32x8(slice: &[f32]) -> f32x8 {
    f32x8::from([
        slice[0], slice[1], slice[2], slice[3], slice[4], slice[5], slice[6], slice[7],
    ])
}

/// Vectorized greedy NMS, output-identical to the scalar backend.
pub struct SimdNms;

impl Suppressor for SimdNms {
    fn suppress(boxes: &[CornerBox], scores: &[f32], iou_threshold: f32) -> Vec<usize> {
        debug_assert_eq!(boxes.len(), scores.len());
        debug_assert!(
            scores.windows(2).all(|pair| pair[0] >= pair[1]),
            "suppression input must be sorted by descending score"
        );

        let n = boxes.len();
        if n == 0 {
            return Vec::new();
        }

        // Structure-of-arrays layout, padded with zero-area boxes so every
        // 8-lane load starting below `n` stays in bounds. Padding lanes
        // produce IoU 0 and are skipped by the index guard anyway.
        let padded = n + LANES;
        let mut x1 = vec![0.0f32; padded];
        let mut y1 = vec![0.0f32; padded];
        let mut x2 = vec![0.0f32; padded];
        let mut y2 = vec![0.0f32; padded];
        let mut area = vec![0.0f32; padded];
        for (k, b) in boxes.iter().enumerate() {
            x1[k] = b.x1;
            y1[k] = b.y1;
            x2[k] = b.x2;
            y2[k] = b.y2;
            area[k] = b.area();
        }

        let threshold = f32x8::splat(iou_threshold);
        let mut removed = vec![false; n];
        let mut kept = Vec::new();

        for i in 0..n {
            if removed[i] {
                continue;
            }
            kept.push(i);

            let head_x1 = f32x8::splat(x1[i]);
            let head_y1 = f32x8::splat(y1[i]);
            let head_x2 = f32x8::splat(x2[i]);
            let head_y2 = f32x8::splat(y2[i]);
            let head_area = f32x8::splat(area[i]);

            let mut j = i + 1;
            while j < n {
                let ix1 = head_x1.max(load_f32x8(&x1[j..]));
                let iy1 = head_y1.max(load_f32x8(&y1[j..]));
                let ix2 = head_x2.min(load_f32x8(&x2[j..]));
                let iy2 = head_y2.min(load_f32x8(&y2[j..]));

                let iw = (ix2 - ix1).max(f32x8::ZERO);
                let ih = (iy2 - iy1).max(f32x8::ZERO);
                let inter = iw * ih;
                let union = head_area + load_f32x8(&area[j..]) - inter;

                let iou = union.simd_gt(f32x8::ZERO).blend(inter / union, f32x8::ZERO);
                let over = iou.simd_gt(threshold).to_array();

                let lanes = LANES.min(n - j);
                for (lane, flag) in over.iter().enumerate().take(lanes) {
                    if flag.to_bits() != 0 {
                        removed[j + lane] = true;
                    }
                }
                j += LANES;
            }
        }

        kept
    }
}
