#![allow(dead_code)]

use std::f64::consts::PI;
use std::path::{Path, PathBuf};

use sicnn_infer::test_util::write_identity_model;
use sicnn_melbands::NUMBER_BANDS;
use sicnn_predict::PredictorConfig;

/// Writes an identity graph (`y = x`).
pub fn identity_graph(dir: &Path) -> PathBuf {
    write_identity_model(dir, "identity.onnx", &[])
}

/// Identity graph with an extra `is_training` boolean input.
pub fn flagged_identity_graph(dir: &Path) -> PathBuf {
    write_identity_model(dir, "flagged.onnx", &["is_training"])
}

/// Config pointing at an identity graph written by [`identity_graph`].
pub fn identity_config(path: &Path) -> PredictorConfig {
    PredictorConfig {
        graph_filename: path.to_string_lossy().into_owned(),
        input: "x".into(),
        output: "y".into(),
        ..Default::default()
    }
}

/// Frame `i` holds the value `i` in every band.
pub fn ramp(frames: usize) -> Vec<Vec<f32>> {
    (0..frames).map(|i| vec![i as f32; NUMBER_BANDS]).collect()
}

pub fn sine(freq: f64, len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| (0.5 * (2.0 * PI * freq * i as f64 / 22050.0).sin()) as f32)
        .collect()
}
