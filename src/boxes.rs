//! Corner-form boxes and final detection records.

/// Axis-aligned box in corner form, pixel coordinates.
///
/// Decoded boxes always satisfy `x1 < x2` and `y1 < y2`; coordinates are not
/// clamped to the image bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CornerBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl CornerBox {
    #[inline]
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Box area; degenerate or inverted boxes count as zero.
    #[inline]
    pub fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    /// Intersection over union with another box.
    ///
    /// A zero-area box has IoU 0 with everything, itself included, so it can
    /// neither suppress nor be suppressed.
    pub fn iou(&self, other: &CornerBox) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        let iw = (ix2 - ix1).max(0.0);
        let ih = (iy2 - iy1).max(0.0);
        let inter = iw * ih;

        let union = self.area() + other.area() - inter;
        if union > 0.0 {
            inter / union
        } else {
            0.0
        }
    }
}

/// One final detection: a pixel-space box and its confidence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    pub bbox: CornerBox,
    pub score: f32,
}
