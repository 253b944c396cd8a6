//! Detpost is a post-processing library for anchor-based object detectors.
//!
//! Given a detector's raw per-anchor outputs (location deltas and class
//! confidences), this crate generates the matching prior-box sequence,
//! decodes the regression deltas into pixel-space boxes, filters and ranks
//! candidates by confidence, and removes duplicates with greedy non-maximum
//! suppression. The scalar NMS path is the reference implementation; a SIMD
//! path is available via the `simd` feature and batch parallelism via the
//! `rayon` feature.

pub mod anchor;
mod boxes;
mod candidate;
pub mod decode;
pub mod pipeline;
pub mod suppress;
pub mod util;

mod trace;

pub use anchor::{generate_anchors, Anchor, AnchorCache, BoxSpec, FeatureLevel};
pub use boxes::{CornerBox, Detection};
pub use candidate::{filter_candidates, Candidate};
pub use decode::{decode_boxes, Variance};
pub use pipeline::{class_channel, DetectionPipeline, NetworkOutputs, PipelineConfig};
pub use suppress::{suppress, NmsBackend, Suppressor};
pub use util::{DetPostError, DetPostResult};
