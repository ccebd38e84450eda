use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which side of the graph a tensor name was looked up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorKind {
    Input,
    Output,
}

impl fmt::Display for TensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// Errors returned by graph loading and execution.
#[derive(Debug, Error)]
pub enum InferError {
    #[error("infer: load {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },

    #[error("infer: {kind} tensor {name:?} not found in graph (available: {available:?})")]
    MissingTensor {
        kind: TensorKind,
        name: String,
        available: Vec<String>,
    },

    #[error("infer: shape {shape:?} needs {expected} values, got {got}")]
    Shape {
        shape: Vec<usize>,
        expected: usize,
        got: usize,
    },

    #[error("infer: empty data")]
    EmptyData,

    #[error("infer: {0}")]
    Runtime(String),
}

impl From<ort::Error> for InferError {
    fn from(e: ort::Error) -> Self {
        Self::Runtime(e.to_string())
    }
}
