//! Memoized anchor generation.
//!
//! A video stream at fixed resolution reuses one anchor sequence for every
//! frame. The cache stores each generated sequence behind an `Arc` so it can
//! be handed out to arbitrarily many concurrent readers without copying;
//! entries are never mutated after insertion.

use std::collections::HashMap;
use std::sync::Arc;

use crate::anchor::{generate_anchors, Anchor, FeatureLevel};
use crate::util::DetPostResult;

/// Cache key: input size plus the per-level grid shapes.
///
/// Box sizes and steps are not part of the key; one cache instance belongs
/// to one pipeline whose layout is fixed at construction.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct AnchorKey {
    image_height: u32,
    image_width: u32,
    grids: Vec<(usize, usize)>,
}

/// Memoizes [`generate_anchors`] keyed on (image size, grid shapes).
#[derive(Debug, Default)]
pub struct AnchorCache {
    entries: HashMap<AnchorKey, Arc<[Anchor]>>,
}

impl AnchorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the anchor sequence for the given layout, generating and
    /// storing it on first use.
    pub fn anchors_for(
        &mut self,
        levels: &[FeatureLevel],
        image_height: u32,
        image_width: u32,
    ) -> DetPostResult<Arc<[Anchor]>> {
        let key = AnchorKey {
            image_height,
            image_width,
            grids: levels.iter().map(|level| (level.rows, level.cols)).collect(),
        };
        if let Some(hit) = self.entries.get(&key) {
            return Ok(Arc::clone(hit));
        }

        let anchors: Arc<[Anchor]> = generate_anchors(levels, image_height, image_width)?.into();
        self.entries.insert(key, Arc::clone(&anchors));
        Ok(anchors)
    }

    /// Number of distinct layouts cached so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops all cached sequences, e.g. after a resolution change.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
