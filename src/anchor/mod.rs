//! Prior-box (anchor) layout and generation.
//!
//! Anchors are emitted in a fixed, fully deterministic order: feature levels
//! in declared order, grid cells in raster order (rows outer, columns
//! inner), box sizes in declared order, and dense sub-cell variants row
//! offset outer, column offset inner. An anchor's identity is its position
//! in this sequence; the detector's per-anchor outputs are aligned to it by
//! index.

use crate::boxes::CornerBox;
use crate::util::{DetPostError, DetPostResult};

pub mod cache;

pub use cache::AnchorCache;

/// Reference box in center form, normalized to the input image.
///
/// Values are plain arithmetic results and are never clamped to `[0, 1]`;
/// anchors near the border may extend past it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Anchor {
    pub center_x: f32,
    pub center_y: f32,
    pub width: f32,
    pub height: f32,
}

impl Anchor {
    /// Corner-form view of the anchor, still in normalized coordinates.
    #[inline]
    pub fn corner(&self) -> CornerBox {
        CornerBox {
            x1: self.center_x - self.width / 2.0,
            y1: self.center_y - self.height / 2.0,
            x2: self.center_x + self.width / 2.0,
            y2: self.center_y + self.height / 2.0,
        }
    }
}

/// One candidate box size at a feature level, with its sub-cell density.
///
/// Density 1 places a single anchor at the cell center (offset 0.5). Density
/// `n > 1` places an n-by-n grid of anchors at fractional offsets `k / n`
/// within the cell, the dense variants used for the smallest sizes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxSpec {
    /// Box side length in input-image pixels.
    pub size: f32,
    /// Sub-cell grid density; 1 means a single centered anchor.
    pub density: u32,
}

impl BoxSpec {
    /// A single centered anchor of the given size.
    #[inline]
    pub fn new(size: f32) -> Self {
        Self { size, density: 1 }
    }

    /// A dense `density` x `density` grid of anchors of the given size.
    #[inline]
    pub fn dense(size: f32, density: u32) -> Self {
        Self { size, density }
    }

    pub(crate) fn offsets(&self) -> Vec<f32> {
        if self.density <= 1 {
            vec![0.5]
        } else {
            (0..self.density)
                .map(|k| k as f32 / self.density as f32)
                .collect()
        }
    }
}

/// Descriptor of one feature-map scale of the detector.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureLevel {
    /// Grid rows reported by the network for this level.
    pub rows: usize,
    /// Grid columns reported by the network for this level.
    pub cols: usize,
    /// Spatial stride mapping grid cells back to input pixels.
    pub step: f32,
    /// Candidate box sizes assigned to this level, in emission order.
    pub sizes: Vec<BoxSpec>,
}

impl FeatureLevel {
    pub fn new(rows: usize, cols: usize, step: f32, sizes: Vec<BoxSpec>) -> Self {
        Self {
            rows,
            cols,
            step,
            sizes,
        }
    }

    /// Number of anchors emitted per grid cell.
    pub fn anchors_per_cell(&self) -> usize {
        self.sizes
            .iter()
            .map(|spec| (spec.density.max(1) as usize).pow(2))
            .sum()
    }

    /// Total anchors this level contributes.
    pub fn anchor_count(&self) -> usize {
        self.rows * self.cols * self.anchors_per_cell()
    }

    pub(crate) fn validate(&self) -> DetPostResult<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(DetPostError::InvalidConfig {
                reason: "feature level grid has a zero dimension",
            });
        }
        if !(self.step > 0.0) {
            return Err(DetPostError::InvalidConfig {
                reason: "feature level step must be positive",
            });
        }
        if self.sizes.is_empty() {
            return Err(DetPostError::InvalidConfig {
                reason: "feature level has no box sizes",
            });
        }
        for spec in &self.sizes {
            if !(spec.size > 0.0) {
                return Err(DetPostError::InvalidConfig {
                    reason: "box size must be positive",
                });
            }
            if spec.density == 0 {
                return Err(DetPostError::InvalidConfig {
                    reason: "box density must be at least 1",
                });
            }
        }
        Ok(())
    }
}

/// Generates the full anchor sequence for the given levels and image size.
///
/// Pure and idempotent: identical inputs produce identical sequences, so the
/// result may be cached and shared across frames of the same size (see
/// [`AnchorCache`]). The sequence length must equal the number of per-anchor
/// predictions the network emits for this input size.
pub fn generate_anchors(
    levels: &[FeatureLevel],
    image_height: u32,
    image_width: u32,
) -> DetPostResult<Vec<Anchor>> {
    if levels.is_empty() {
        return Err(DetPostError::InvalidConfig {
            reason: "feature level list is empty",
        });
    }
    if image_height == 0 || image_width == 0 {
        return Err(DetPostError::InvalidConfig {
            reason: "image dimensions must be non-zero",
        });
    }
    for level in levels {
        level.validate()?;
    }

    let img_w = image_width as f32;
    let img_h = image_height as f32;
    let total: usize = levels.iter().map(FeatureLevel::anchor_count).sum();
    let mut anchors = Vec::with_capacity(total);

    for level in levels {
        let per_size: Vec<(f32, f32, Vec<f32>)> = level
            .sizes
            .iter()
            .map(|spec| (spec.size / img_w, spec.size / img_h, spec.offsets()))
            .collect();

        for i in 0..level.rows {
            for j in 0..level.cols {
                for (width, height, offsets) in &per_size {
                    for oy in offsets {
                        let center_y = (i as f32 + oy) * level.step / img_h;
                        for ox in offsets {
                            let center_x = (j as f32 + ox) * level.step / img_w;
                            anchors.push(Anchor {
                                center_x,
                                center_y,
                                width: *width,
                                height: *height,
                            });
                        }
                    }
                }
            }
        }
    }

    debug_assert_eq!(anchors.len(), total);
    Ok(anchors)
}
