use std::num::NonZeroUsize;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sicnn_infer::ModelSource;

use crate::error::PredictError;

/// Frames per patch fed to the network.
pub const PATCH_SIZE: usize = 101;

/// What to do with a trailing patch shorter than [`PATCH_SIZE`] frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LastPatchMode {
    /// Drop it.
    #[default]
    Discard,
    /// Complete it by cycling the frames it has.
    Repeat,
}

/// How the feature stream is cut into patches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Windowing {
    /// One patch spanning every frame.
    WholeSequence,
    /// [`PATCH_SIZE`]-frame patches starting every `n` frames.
    FixedHop(NonZeroUsize),
}

impl Windowing {
    /// Maps a raw hop size; `0` selects the whole sequence.
    pub fn from_hop(hop: usize) -> Self {
        NonZeroUsize::new(hop).map_or(Self::WholeSequence, Self::FixedHop)
    }
}

/// How patches are grouped into inference runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Batching {
    /// At most `n` patches per run.
    Fixed(NonZeroUsize),
    /// Every patch in a single run.
    WholeStream,
}

impl Batching {
    /// Maps a raw batch size; `-1` selects the whole stream.
    pub fn from_size(size: i64) -> Result<Self, PredictError> {
        if size == -1 {
            return Ok(Self::WholeStream);
        }
        usize::try_from(size)
            .ok()
            .and_then(NonZeroUsize::new)
            .map(Self::Fixed)
            .ok_or_else(|| PredictError::Configuration(format!("batchSize must be -1 or positive, got {size}")))
    }
}

/// Predictor options, as read from JSON or key/value pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct PredictorConfig {
    /// Serialized graph file. Empty if unused.
    pub graph_filename: String,
    /// Saved-model directory. Empty if unused.
    pub saved_model: String,
    /// Input tensor (or signature alias) receiving the mel patches.
    pub input: String,
    /// Output tensor (or signature alias) holding the predictions.
    pub output: String,
    /// Boolean input fed `false` on every run. Empty if the graph has none.
    pub is_training_name: String,
    /// Frames between patch starts; `0` runs the whole sequence as one patch.
    pub patch_hop_size: usize,
    /// Patches per run; `-1` runs the whole stream at once.
    pub batch_size: i64,
    pub last_patch_mode: LastPatchMode,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            graph_filename: String::new(),
            saved_model: String::new(),
            input: "model/Placeholder".into(),
            output: "model/Sigmoid".into(),
            is_training_name: String::new(),
            patch_hop_size: 50,
            batch_size: 64,
            last_patch_mode: LastPatchMode::Discard,
        }
    }
}

/// Validated tensor names and patching options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub input: String,
    pub output: String,
    pub training: Option<String>,
    pub windowing: Windowing,
    pub batching: Batching,
    pub last_patch_mode: LastPatchMode,
}

/// Validated configuration for a predictor with a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPlan {
    pub source: ModelSource,
    pub options: RunOptions,
}

impl PredictorConfig {
    /// Parses options from a JSON object. Unknown keys are rejected.
    pub fn from_json(data: &[u8]) -> Result<Self, PredictError> {
        serde_json::from_slice(data).map_err(|e| PredictError::Configuration(e.to_string()))
    }

    /// Builds options from key/value pairs; keys missing from `options`
    /// keep their defaults.
    ///
    /// ```
    /// use serde_json::json;
    /// use sicnn_predict::PredictorConfig;
    ///
    /// let cfg = PredictorConfig::from_options([("patchHopSize", json!(0)), ("batchSize", json!(-1))]).unwrap();
    /// assert_eq!(cfg.patch_hop_size, 0);
    /// ```
    pub fn from_options<I, K>(options: I) -> Result<Self, PredictError>
    where
        I: IntoIterator<Item = (K, serde_json::Value)>,
        K: Into<String>,
    {
        let map: serde_json::Map<String, serde_json::Value> =
            options.into_iter().map(|(k, v)| (k.into(), v)).collect();
        serde_json::from_value(serde_json::Value::Object(map)).map_err(|e| PredictError::Configuration(e.to_string()))
    }

    /// Validates the options.
    ///
    /// Returns `None` when neither model path is set: the predictor is
    /// disabled and nothing else is checked.
    pub fn plan(&self) -> Result<Option<ModelPlan>, PredictError> {
        let source = match (self.graph_filename.is_empty(), self.saved_model.is_empty()) {
            (true, true) => return Ok(None),
            (false, true) => ModelSource::GraphFile(PathBuf::from(&self.graph_filename)),
            (true, false) => ModelSource::SavedModel(PathBuf::from(&self.saved_model)),
            (false, false) => {
                return Err(PredictError::Configuration(
                    "graphFilename and savedModel are mutually exclusive".into(),
                ));
            }
        };

        Ok(Some(ModelPlan {
            source,
            options: self.run_options()?,
        }))
    }

    /// Validates everything except the model paths.
    pub fn run_options(&self) -> Result<RunOptions, PredictError> {
        if self.input.is_empty() || self.output.is_empty() {
            return Err(PredictError::Configuration("input and output tensor names must be set".into()));
        }
        Ok(RunOptions {
            input: self.input.clone(),
            output: self.output.clone(),
            training: (!self.is_training_name.is_empty()).then(|| self.is_training_name.clone()),
            windowing: Windowing::from_hop(self.patch_hop_size),
            batching: Batching::from_size(self.batch_size)?,
            last_patch_mode: self.last_patch_mode,
        })
    }
}
