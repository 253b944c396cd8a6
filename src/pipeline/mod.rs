//! Per-frame orchestration of decode, filter and suppression.
//!
//! The pipeline is stateless across frames except for the anchor cache: the
//! anchor sequence for a fixed (image size, grid shapes) pair is generated
//! once and shared read-only afterwards. `run_with_anchors` is the pure
//! per-frame path and takes `&self`, so one pipeline value can process many
//! frames concurrently; only the memoizing wrappers take `&mut self`.

use crate::anchor::{Anchor, AnchorCache, BoxSpec, FeatureLevel};
use crate::boxes::{CornerBox, Detection};
use crate::candidate::filter_candidates;
use crate::decode::{decode_boxes, Variance};
use crate::suppress::{suppress, NmsBackend};
use crate::trace::{trace_event, trace_span};
use crate::util::{DetPostError, DetPostResult};

/// Borrowed view of one frame's raw network outputs.
///
/// `loc` holds one delta quadruple per anchor; `conf` is the row-major
/// (num_anchors, num_classes) confidence buffer.
#[derive(Clone, Copy, Debug)]
pub struct NetworkOutputs<'a> {
    pub loc: &'a [[f32; 4]],
    pub conf: &'a [f32],
}

/// Post-processing configuration, validated once at pipeline construction.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    /// Candidates scoring at or below this are dropped before suppression.
    pub confidence_threshold: f32,
    /// Pre-suppression cap on the number of candidates.
    pub top_k: usize,
    /// IoU above which a lower-scoring overlap is suppressed.
    pub nms_threshold: f32,
    /// Post-suppression cap on the number of detections.
    pub keep_top_k: usize,
    /// Delta scaling constants shared with the model.
    pub variance: Variance,
    /// Anchor layout, one entry per feature-map scale.
    pub feature_levels: Vec<FeatureLevel>,
    /// Network input size as (height, width) pixels.
    pub image_size: (u32, u32),
    /// Resize factor applied to frames before inference; inverted during
    /// decoding so detections land in original-frame coordinates.
    pub resize_scale: f32,
    /// Width of one row of the confidence buffer.
    pub num_classes: usize,
    /// Which class channel this pipeline consumes.
    pub class_index: usize,
    /// Suppression implementation to run.
    pub backend: NmsBackend,
}

impl Default for PipelineConfig {
    /// The reference single-class deployment: a three-level dense anchor
    /// layout for a 1024x1024 input, thresholds 0.2/0.2, caps 5000/750,
    /// variance (0.1, 0.2), two-channel confidence with channel 1 consumed.
    fn default() -> Self {
        Self {
            confidence_threshold: 0.2,
            top_k: 5000,
            nms_threshold: 0.2,
            keep_top_k: 750,
            variance: Variance::default(),
            feature_levels: vec![
                FeatureLevel::new(
                    32,
                    32,
                    32.0,
                    vec![
                        BoxSpec::dense(32.0, 4),
                        BoxSpec::dense(64.0, 2),
                        BoxSpec::new(128.0),
                    ],
                ),
                FeatureLevel::new(16, 16, 64.0, vec![BoxSpec::new(256.0)]),
                FeatureLevel::new(8, 8, 128.0, vec![BoxSpec::new(512.0)]),
            ],
            image_size: (1024, 1024),
            resize_scale: 1.0,
            num_classes: 2,
            class_index: 1,
            backend: NmsBackend::default(),
        }
    }
}

impl PipelineConfig {
    /// Rejects invalid settings; nothing is silently defaulted.
    pub fn validate(&self) -> DetPostResult<()> {
        if !(self.confidence_threshold > 0.0) {
            return Err(DetPostError::InvalidConfig {
                reason: "confidence threshold must be positive",
            });
        }
        if !(self.nms_threshold > 0.0) {
            return Err(DetPostError::InvalidConfig {
                reason: "nms threshold must be positive",
            });
        }
        if !(self.variance.center > 0.0) || !(self.variance.size > 0.0) {
            return Err(DetPostError::InvalidConfig {
                reason: "variance components must be positive",
            });
        }
        if !(self.resize_scale > 0.0) {
            return Err(DetPostError::InvalidConfig {
                reason: "resize scale must be positive",
            });
        }
        if self.image_size.0 == 0 || self.image_size.1 == 0 {
            return Err(DetPostError::InvalidConfig {
                reason: "image dimensions must be non-zero",
            });
        }
        if self.feature_levels.is_empty() {
            return Err(DetPostError::InvalidConfig {
                reason: "feature level list is empty",
            });
        }
        for level in &self.feature_levels {
            level.validate()?;
        }
        if self.num_classes == 0 {
            return Err(DetPostError::InvalidConfig {
                reason: "class count must be at least 1",
            });
        }
        if self.class_index >= self.num_classes {
            return Err(DetPostError::InvalidConfig {
                reason: "class index is out of range",
            });
        }
        Ok(())
    }
}

/// Extracts one class's scores from the row-major confidence buffer.
pub fn class_channel(
    conf: &[f32],
    num_classes: usize,
    class_index: usize,
) -> DetPostResult<Vec<f32>> {
    if num_classes == 0 {
        return Err(DetPostError::InvalidConfig {
            reason: "class count must be at least 1",
        });
    }
    if class_index >= num_classes {
        return Err(DetPostError::InvalidConfig {
            reason: "class index is out of range",
        });
    }
    if conf.len() % num_classes != 0 {
        return Err(DetPostError::ShapeMismatch {
            expected: conf.len() / num_classes * num_classes,
            got: conf.len(),
            context: "confidence buffer",
        });
    }
    Ok(conf
        .chunks_exact(num_classes)
        .map(|row| row[class_index])
        .collect())
}

/// Runs decode, confidence filtering and suppression for each frame.
pub struct DetectionPipeline {
    config: PipelineConfig,
    cache: AnchorCache,
}

impl DetectionPipeline {
    pub fn new(config: PipelineConfig) -> DetPostResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cache: AnchorCache::new(),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Processes one frame using the configured feature-level grids,
    /// generating and caching anchors on first use.
    pub fn detect(&mut self, outputs: NetworkOutputs<'_>) -> DetPostResult<Vec<Detection>> {
        let (image_height, image_width) = self.config.image_size;
        let anchors =
            self.cache
                .anchors_for(&self.config.feature_levels, image_height, image_width)?;
        self.run_with_anchors(outputs, &anchors)
    }

    /// Processes one frame with per-level grid dimensions reported by the
    /// network, overriding the configured grids.
    pub fn detect_with_shapes(
        &mut self,
        outputs: NetworkOutputs<'_>,
        grids: &[(usize, usize)],
    ) -> DetPostResult<Vec<Detection>> {
        if grids.len() != self.config.feature_levels.len() {
            return Err(DetPostError::ShapeMismatch {
                expected: self.config.feature_levels.len(),
                got: grids.len(),
                context: "feature map shape descriptors",
            });
        }
        let levels: Vec<FeatureLevel> = self
            .config
            .feature_levels
            .iter()
            .zip(grids)
            .map(|(level, &(rows, cols))| {
                FeatureLevel::new(rows, cols, level.step, level.sizes.clone())
            })
            .collect();
        let (image_height, image_width) = self.config.image_size;
        let anchors = self.cache.anchors_for(&levels, image_height, image_width)?;
        self.run_with_anchors(outputs, &anchors)
    }

    /// The pure per-frame path: caller supplies the anchor sequence.
    ///
    /// Takes `&self` and touches no shared mutable state, so frames of the
    /// same size may be processed concurrently against one shared anchor
    /// sequence. Empty outputs with empty anchors yield an empty result.
    pub fn run_with_anchors(
        &self,
        outputs: NetworkOutputs<'_>,
        anchors: &[Anchor],
    ) -> DetPostResult<Vec<Detection>> {
        let cfg = &self.config;
        let _span = trace_span!("detect_frame", anchors = anchors.len()).entered();

        let expected = anchors.len() * cfg.num_classes;
        if outputs.conf.len() != expected {
            return Err(DetPostError::ShapeMismatch {
                expected,
                got: outputs.conf.len(),
                context: "confidence scores",
            });
        }
        let scores = class_channel(outputs.conf, cfg.num_classes, cfg.class_index)?;
        let boxes = decode_boxes(
            outputs.loc,
            anchors,
            cfg.variance,
            cfg.image_size.0,
            cfg.image_size.1,
            cfg.resize_scale,
        )?;

        let candidates = filter_candidates(&boxes, &scores, cfg.confidence_threshold, cfg.top_k)?;
        trace_event!("candidates", count = candidates.len());

        let ranked_boxes: Vec<CornerBox> = candidates.iter().map(|c| c.bbox).collect();
        let ranked_scores: Vec<f32> = candidates.iter().map(|c| c.score).collect();
        let kept = suppress(
            cfg.backend,
            &ranked_boxes,
            &ranked_scores,
            cfg.nms_threshold,
            cfg.keep_top_k,
        );
        trace_event!("detections", count = kept.len());

        Ok(kept
            .into_iter()
            .map(|i| Detection {
                bbox: ranked_boxes[i],
                score: ranked_scores[i],
            })
            .collect())
    }

    /// Processes a batch of same-size frames sequentially. Anchors are
    /// generated once and shared across the whole batch.
    pub fn detect_batch(
        &mut self,
        frames: &[NetworkOutputs<'_>],
    ) -> DetPostResult<Vec<Vec<Detection>>> {
        let (image_height, image_width) = self.config.image_size;
        let anchors =
            self.cache
                .anchors_for(&self.config.feature_levels, image_height, image_width)?;
        frames
            .iter()
            .map(|frame| self.run_with_anchors(*frame, &anchors))
            .collect()
    }

    /// Parallel batch processing over frames. Frames are independent, so
    /// the result is exactly [`detect_batch`]'s, in the same order.
    ///
    /// [`detect_batch`]: DetectionPipeline::detect_batch
    #[cfg(feature = "rayon")]
    pub fn detect_batch_par(
        &mut self,
        frames: &[NetworkOutputs<'_>],
    ) -> DetPostResult<Vec<Vec<Detection>>> {
        use rayon::prelude::*;

        let (image_height, image_width) = self.config.image_size;
        let anchors =
            self.cache
                .anchors_for(&self.config.feature_levels, image_height, image_width)?;
        let this = &*self;
        frames
            .par_iter()
            .map(|frame| this.run_with_anchors(*frame, &anchors))
            .collect()
    }
}
