//! Saved-model directories and their signature metadata.
//!
//! A saved model is a directory holding the graph as `model.onnx` and,
//! optionally, a `signature.json` that publishes stable aliases for the
//! graph's tensors:
//!
//! ```json
//! { "inputs": { "model/Placeholder": "melspectrogram" },
//!   "outputs": { "model/Sigmoid": "activations" } }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::InferError;

/// Graph file name inside a saved-model directory.
pub const SAVED_MODEL_GRAPH: &str = "model.onnx";

/// Signature file name inside a saved-model directory.
pub const SAVED_MODEL_SIGNATURE: &str = "signature.json";

/// Where a graph is loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// A single serialized graph file.
    GraphFile(PathBuf),
    /// A directory bundling the graph with its signature.
    SavedModel(PathBuf),
}

impl ModelSource {
    pub fn path(&self) -> &Path {
        match self {
            Self::GraphFile(p) | Self::SavedModel(p) => p,
        }
    }
}

/// Tensor aliases published by a saved model.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Signature {
    #[serde(default)]
    pub inputs: HashMap<String, String>,
    #[serde(default)]
    pub outputs: HashMap<String, String>,
}

impl Signature {
    /// Parses a signature from JSON bytes.
    pub fn from_json(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }

    /// Maps an input alias to its graph tensor name; unknown names pass through.
    pub fn input<'a>(&'a self, name: &'a str) -> &'a str {
        self.inputs.get(name).map_or(name, String::as_str)
    }

    /// Maps an output alias to its graph tensor name; unknown names pass through.
    pub fn output<'a>(&'a self, name: &'a str) -> &'a str {
        self.outputs.get(name).map_or(name, String::as_str)
    }
}

/// Resolved on-disk layout of a saved-model directory.
pub(crate) struct SavedModelLayout {
    pub graph: PathBuf,
    pub signature: Signature,
}

pub(crate) fn read_saved_model(dir: &Path) -> Result<SavedModelLayout, InferError> {
    let load_err = |reason: String| InferError::Load {
        path: dir.to_path_buf(),
        reason,
    };

    if !dir.is_dir() {
        return Err(load_err("not a saved-model directory".into()));
    }
    let graph = dir.join(SAVED_MODEL_GRAPH);
    if !graph.is_file() {
        return Err(load_err(format!("missing {SAVED_MODEL_GRAPH}")));
    }

    let sig_path = dir.join(SAVED_MODEL_SIGNATURE);
    let signature = if sig_path.is_file() {
        let data = fs::read(&sig_path).map_err(|e| load_err(format!("read {SAVED_MODEL_SIGNATURE}: {e}")))?;
        Signature::from_json(&data).map_err(|e| load_err(format!("parse {SAVED_MODEL_SIGNATURE}: {e}")))?
    } else {
        Signature::default()
    };

    Ok(SavedModelLayout { graph, signature })
}
