//! Loaded inference graphs and their tensor bindings.

use std::path::{Path, PathBuf};

use ndarray::{ArrayD, IxDyn};
use ort::session::{Session, SessionInputValue};
use ort::value::Tensor;
use parking_lot::Mutex;

use crate::error::{InferError, TensorKind};
use crate::signature::{read_saved_model, ModelSource, Signature};
use crate::tensor::{Feed, TensorData};

/// A loaded computation graph that can be executed.
///
/// Implementations must be safe for concurrent use; [`Graph::run`] may be
/// called from several threads at once.
pub trait Graph: Send + Sync {
    /// Path the graph was loaded from.
    fn source(&self) -> &Path;

    /// Names of the graph's input tensors.
    fn inputs(&self) -> &[String];

    /// Names of the graph's output tensors.
    fn outputs(&self) -> &[String];

    /// Alias table published with the graph, if any.
    fn signature(&self) -> Option<&Signature> {
        None
    }

    /// Runs the graph with the given feeds and fetches one output tensor.
    fn run(&self, feeds: Vec<Feed>, output: &str) -> Result<TensorData, InferError>;
}

/// Graph tensor names resolved and validated against one graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bindings {
    /// Graph tensor that receives the features.
    pub input: String,
    /// Graph tensor the predictions are read from.
    pub output: String,
    /// Graph tensor that receives the training-phase flag, if any.
    pub training: Option<String>,
}

/// Resolves `input`, `output` and the optional training flag through the
/// graph's signature and checks that every tensor exists.
pub fn bind(
    graph: &dyn Graph,
    input: &str,
    output: &str,
    training: Option<&str>,
) -> Result<Bindings, InferError> {
    let resolve = |kind: TensorKind, name: &str| -> Result<String, InferError> {
        let (resolved, available) = match kind {
            TensorKind::Input => (
                graph.signature().map_or(name, |s| s.input(name)),
                graph.inputs(),
            ),
            TensorKind::Output => (
                graph.signature().map_or(name, |s| s.output(name)),
                graph.outputs(),
            ),
        };
        if available.iter().any(|n| n == resolved) {
            Ok(resolved.to_string())
        } else {
            Err(InferError::MissingTensor {
                kind,
                name: name.to_string(),
                available: available.to_vec(),
            })
        }
    };

    Ok(Bindings {
        input: resolve(TensorKind::Input, input)?,
        output: resolve(TensorKind::Output, output)?,
        training: training
            .map(|name| resolve(TensorKind::Input, name))
            .transpose()?,
    })
}

/// Graph loaded into an ONNX Runtime session.
///
/// The handle is immutable once loaded. ONNX Runtime needs exclusive access
/// to the session while it runs, so concurrent [`Graph::run`] calls on one
/// handle are serialized by an internal mutex.
pub struct GraphHandle {
    path: PathBuf,
    inputs: Vec<String>,
    outputs: Vec<String>,
    signature: Option<Signature>,
    session: Mutex<Session>,
}

impl GraphHandle {
    /// Loads a graph from a model source.
    pub fn load(source: &ModelSource) -> Result<Self, InferError> {
        match source {
            ModelSource::GraphFile(path) => Self::load_file(path),
            ModelSource::SavedModel(dir) => Self::load_saved_model(dir),
        }
    }

    /// Loads a single serialized graph file.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, InferError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(InferError::Load {
                path: path.to_path_buf(),
                reason: "no such graph file".into(),
            });
        }
        let session = open_session(path)?;
        Ok(Self::from_session(path.to_path_buf(), session, None))
    }

    /// Loads a saved-model directory (`model.onnx` plus optional `signature.json`).
    pub fn load_saved_model(dir: impl AsRef<Path>) -> Result<Self, InferError> {
        let dir = dir.as_ref();
        let layout = read_saved_model(dir)?;
        let session = open_session(&layout.graph)?;
        Ok(Self::from_session(dir.to_path_buf(), session, Some(layout.signature)))
    }

    fn from_session(path: PathBuf, session: Session, signature: Option<Signature>) -> Self {
        let inputs: Vec<String> = session.inputs.iter().map(|i| i.name.clone()).collect();
        let outputs: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        tracing::info!(
            path = %path.display(),
            ?inputs,
            ?outputs,
            "infer: graph loaded"
        );
        Self {
            path,
            inputs,
            outputs,
            signature,
            session: Mutex::new(session),
        }
    }
}

fn open_session(path: &Path) -> Result<Session, InferError> {
    Session::builder()
        .and_then(|b| b.with_intra_threads(1))
        .and_then(|b| b.commit_from_file(path))
        .map_err(|e| InferError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn to_session_value(feed: Feed) -> Result<(String, SessionInputValue<'static>), InferError> {
    match feed {
        Feed::Float { name, tensor } => {
            let shape = tensor.shape().to_vec();
            let array = ArrayD::from_shape_vec(IxDyn(&shape), tensor.into_data())
                .map_err(|e| InferError::Runtime(format!("input {name:?}: {e}")))?;
            let value = Tensor::from_array(array)?;
            Ok((name, value.into()))
        }
        Feed::Flag { name, value } => {
            let value = Tensor::from_array(ndarray::arr0(value).into_dyn())?;
            Ok((name, value.into()))
        }
    }
}

impl Graph for GraphHandle {
    fn source(&self) -> &Path {
        &self.path
    }

    fn inputs(&self) -> &[String] {
        &self.inputs
    }

    fn outputs(&self) -> &[String] {
        &self.outputs
    }

    fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    fn run(&self, feeds: Vec<Feed>, output: &str) -> Result<TensorData, InferError> {
        let inputs = feeds
            .into_iter()
            .map(to_session_value)
            .collect::<Result<Vec<_>, _>>()?;

        let mut session = self.session.lock();
        let outputs = session.run(inputs)?;
        let value = outputs.get(output).ok_or_else(|| InferError::MissingTensor {
            kind: TensorKind::Output,
            name: output.to_string(),
            available: self.outputs.clone(),
        })?;

        let (shape, data) = value.try_extract_tensor::<f32>()?;
        let shape: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();
        tracing::debug!(output, ?shape, "infer: run complete");
        TensorData::new(shape, data.to_vec())
    }
}
