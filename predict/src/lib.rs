//! SiCNN audio tagging on top of a frozen graph.
//!
//! The [`Predictor`] cuts a stream of log mel-band vectors into patches of
//! [`PATCH_SIZE`] frames, packs them into `[batch, frames, bands, 1]`
//! tensors and runs them through an ONNX graph, returning one prediction
//! vector per patch. [`mean_over_patches`] collapses those into a single
//! clip-level vector.
//!
//! # Usage
//!
//! ```no_run
//! use sicnn_predict::{mean_over_patches, Predictor, PredictorConfig};
//!
//! let predictor = Predictor::new().unwrap();
//! predictor
//!     .configure(&PredictorConfig {
//!         graph_filename: "VGG91_a125bis.onnx".into(),
//!         patch_hop_size: 0,
//!         ..Default::default()
//!     })
//!     .unwrap();
//!
//! let samples = vec![0.0f32; 22050];
//! let predictions = predictor.predict_signal(&samples).unwrap();
//! let clip = mean_over_patches(&predictions).unwrap();
//! ```
//!
//! With both `graph_filename` and `saved_model` empty the predictor is
//! disabled and every prediction is empty.

mod aggregate;
mod config;
mod error;
pub mod patch;
mod predictor;

pub use aggregate::mean_over_patches;
pub use config::{
    Batching, LastPatchMode, ModelPlan, PredictorConfig, RunOptions, Windowing, PATCH_SIZE,
};
pub use error::PredictError;
pub use predictor::{Predictor, Status};
