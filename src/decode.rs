//! Regression decoding: location deltas + anchors -> pixel-space boxes.

use crate::anchor::Anchor;
use crate::boxes::CornerBox;
use crate::util::{DetPostError, DetPostResult};

/// The two fixed scaling constants applied to regression deltas.
///
/// These come from the model configuration, not from training; both the
/// network and the decoder must agree on them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Variance {
    /// Scales the center offsets.
    pub center: f32,
    /// Scales the log-size offsets.
    pub size: f32,
}

impl Variance {
    pub const fn new(center: f32, size: f32) -> Self {
        Self { center, size }
    }
}

impl Default for Variance {
    fn default() -> Self {
        Self::new(0.1, 0.2)
    }
}

/// Decodes per-anchor location deltas into corner-form pixel boxes.
///
/// Each delta `(dx, dy, dw, dh)` is applied to its anchor in center form,
/// the result converted to corners, scaled from normalized coordinates to
/// pixels of the network input, and divided by `resize_scale` to undo any
/// resize applied to the frame before inference. Output index `i`
/// corresponds to anchor index `i`.
pub fn decode_boxes(
    loc: &[[f32; 4]],
    anchors: &[Anchor],
    variance: Variance,
    image_height: u32,
    image_width: u32,
    resize_scale: f32,
) -> DetPostResult<Vec<CornerBox>> {
    if loc.len() != anchors.len() {
        return Err(DetPostError::ShapeMismatch {
            expected: anchors.len(),
            got: loc.len(),
            context: "location deltas",
        });
    }

    let img_w = image_width as f32;
    let img_h = image_height as f32;
    let mut boxes = Vec::with_capacity(loc.len());

    for (delta, anchor) in loc.iter().zip(anchors) {
        let [dx, dy, dw, dh] = *delta;

        let center_x = anchor.center_x + dx * variance.center * anchor.width;
        let center_y = anchor.center_y + dy * variance.center * anchor.height;
        let width = anchor.width * (dw * variance.size).exp();
        let height = anchor.height * (dh * variance.size).exp();

        let half_w = width / 2.0;
        let half_h = height / 2.0;
        boxes.push(CornerBox {
            x1: (center_x - half_w) * img_w / resize_scale,
            y1: (center_y - half_h) * img_h / resize_scale,
            x2: (center_x + half_w) * img_w / resize_scale,
            y2: (center_y + half_h) * img_h / resize_scale,
        });
    }

    Ok(boxes)
}

#[cfg(test)]
mod tests {
    use super::{decode_boxes, Variance};
    use crate::anchor::Anchor;
    use crate::util::DetPostError;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn zero_delta_reproduces_the_anchor() {
        let anchor = Anchor {
            center_x: 0.5,
            center_y: 0.5,
            width: 0.2,
            height: 0.2,
        };
        let boxes = decode_boxes(
            &[[0.0; 4]],
            &[anchor],
            Variance::default(),
            100,
            100,
            1.0,
        )
        .unwrap();

        let b = boxes[0];
        assert!(close(b.x1, 40.0));
        assert!(close(b.y1, 40.0));
        assert!(close(b.x2, 60.0));
        assert!(close(b.y2, 60.0));
    }

    #[test]
    fn center_delta_shifts_by_variance_times_anchor_size() {
        let anchor = Anchor {
            center_x: 0.5,
            center_y: 0.5,
            width: 0.2,
            height: 0.4,
        };
        let variance = Variance::new(0.1, 0.2);
        let boxes = decode_boxes(&[[1.0, 1.0, 0.0, 0.0]], &[anchor], variance, 100, 100, 1.0)
            .unwrap();

        // dx shifts the center by 0.1 * 0.2 = 0.02 (2 px), dy by 0.1 * 0.4.
        let b = boxes[0];
        assert!(close(b.x1, 42.0));
        assert!(close(b.x2, 62.0));
        assert!(close(b.y1, 34.0));
        assert!(close(b.y2, 74.0));
    }

    #[test]
    fn size_delta_scales_exponentially() {
        let anchor = Anchor {
            center_x: 0.5,
            center_y: 0.5,
            width: 0.2,
            height: 0.2,
        };
        let variance = Variance::new(0.1, 0.2);
        let boxes = decode_boxes(&[[0.0, 0.0, 1.0, 0.0]], &[anchor], variance, 100, 100, 1.0)
            .unwrap();

        let b = boxes[0];
        let expected_w = 0.2 * (0.2f32).exp() * 100.0;
        assert!(close(b.x2 - b.x1, expected_w));
        assert!(close(b.y2 - b.y1, 20.0));
    }

    #[test]
    fn resize_scale_is_inverted() {
        let anchor = Anchor {
            center_x: 0.5,
            center_y: 0.5,
            width: 0.2,
            height: 0.2,
        };
        let boxes = decode_boxes(&[[0.0; 4]], &[anchor], Variance::default(), 100, 100, 2.0)
            .unwrap();

        let b = boxes[0];
        assert!(close(b.x1, 20.0));
        assert!(close(b.x2, 30.0));
    }

    #[test]
    fn delta_count_must_match_anchor_count() {
        let anchor = Anchor {
            center_x: 0.5,
            center_y: 0.5,
            width: 0.2,
            height: 0.2,
        };
        let err = decode_boxes(&[], &[anchor], Variance::default(), 100, 100, 1.0).unwrap_err();
        assert_eq!(
            err,
            DetPostError::ShapeMismatch {
                expected: 1,
                got: 0,
                context: "location deltas",
            }
        );
    }
}
