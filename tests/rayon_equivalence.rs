#![cfg(feature = "rayon")]

use detpost::{
    BoxSpec, DetectionPipeline, FeatureLevel, NetworkOutputs, PipelineConfig,
};

fn make_frame(num_anchors: usize, seed: u32) -> (Vec<[f32; 4]>, Vec<f32>) {
    let mut loc = Vec::with_capacity(num_anchors);
    let mut conf = Vec::with_capacity(num_anchors * 2);
    for i in 0..num_anchors {
        let t = (i as u32)
            .wrapping_mul(2654435761)
            .wrapping_add(seed.wrapping_mul(40503))
            >> 16;
        let a = (t & 0xFF) as f32 / 255.0;
        let b = ((t >> 8) & 0xFF) as f32 / 255.0;
        loc.push([a - 0.5, b - 0.5, (a - 0.5) * 0.5, (b - 0.5) * 0.5]);
        conf.push(1.0 - a);
        conf.push(a.max(b));
    }
    (loc, conf)
}

fn small_config() -> PipelineConfig {
    PipelineConfig {
        confidence_threshold: 0.4,
        nms_threshold: 0.3,
        feature_levels: vec![FeatureLevel::new(
            4,
            4,
            16.0,
            vec![BoxSpec::dense(16.0, 2), BoxSpec::new(32.0)],
        )],
        image_size: (64, 64),
        ..PipelineConfig::default()
    }
}

#[test]
fn parallel_batch_matches_sequential_batch() {
    let num_anchors = 4 * 4 * 5;
    let frames_data: Vec<(Vec<[f32; 4]>, Vec<f32>)> =
        (0..6).map(|seed| make_frame(num_anchors, seed)).collect();
    let frames: Vec<NetworkOutputs<'_>> = frames_data
        .iter()
        .map(|(loc, conf)| NetworkOutputs { loc, conf })
        .collect();

    let mut sequential = DetectionPipeline::new(small_config()).unwrap();
    let mut parallel = DetectionPipeline::new(small_config()).unwrap();

    let seq = sequential.detect_batch(&frames).unwrap();
    let par = parallel.detect_batch_par(&frames).unwrap();

    assert_eq!(seq, par);
    assert!(seq.iter().any(|frame| !frame.is_empty()));
}
