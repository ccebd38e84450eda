use std::path::PathBuf;

use sicnn_infer::{InferError, TensorKind};
use sicnn_melbands::MelBandsError;
use thiserror::Error;

/// Errors returned by predictor configuration and inference.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("predict: empty input")]
    InvalidInput,

    #[error("predict: input has size {got}, expected {expected}")]
    InvalidInputSize { expected: usize, got: usize },

    #[error("predict: cannot load model {}: {reason}", path.display())]
    ModelLoad { path: PathBuf, reason: String },

    #[error("predict: {kind} tensor {name:?} not found in graph (available: {available:?})")]
    TensorBinding {
        kind: TensorKind,
        name: String,
        available: Vec<String>,
    },

    #[error("predict: configuration: {0}")]
    Configuration(String),

    #[error("predict: inference: {0}")]
    Inference(String),
}

impl From<InferError> for PredictError {
    fn from(e: InferError) -> Self {
        match e {
            InferError::Load { path, reason } => Self::ModelLoad { path, reason },
            InferError::MissingTensor {
                kind,
                name,
                available,
            } => Self::TensorBinding {
                kind,
                name,
                available,
            },
            other => Self::Inference(other.to_string()),
        }
    }
}

impl From<MelBandsError> for PredictError {
    fn from(e: MelBandsError) -> Self {
        match e {
            MelBandsError::InvalidInput => Self::InvalidInput,
            MelBandsError::InvalidInputSize { expected, got } => Self::InvalidInputSize { expected, got },
            MelBandsError::Config(msg) => Self::Configuration(msg),
            MelBandsError::Fft(msg) => Self::Inference(msg),
        }
    }
}
