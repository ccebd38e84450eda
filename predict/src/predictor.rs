use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use sicnn_infer::{bind, Bindings, Feed, Graph, GraphHandle};
use sicnn_melbands::{MelBandExtractor, MelBandsConfig, HOP_SIZE};

use crate::config::{PredictorConfig, RunOptions};
use crate::error::PredictError;
use crate::patch::{assemble, batches, patch_indices};

/// Frozen-graph predictor over log mel-band patches.
///
/// # Lifecycle
///
/// A new predictor is unconfigured. [`configure`](Self::configure) moves it
/// to either disabled (no model path set, predictions are empty) or loaded.
/// A failed `configure` leaves the previous state untouched.
///
/// # Thread Safety
///
/// `Predictor` is `Send + Sync`. Each prediction takes a snapshot of the
/// current model, so reconfiguring never disturbs calls already running.
pub struct Predictor {
    frontend: MelBandExtractor,
    state: RwLock<State>,
}

enum State {
    Unconfigured,
    Disabled,
    Loaded(Arc<Loaded>),
}

struct Loaded {
    graph: Arc<dyn Graph>,
    bindings: Bindings,
    options: RunOptions,
}

/// Observable predictor state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Unconfigured,
    Disabled,
    Loaded { source: PathBuf },
}

impl fmt::Debug for Predictor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predictor")
            .field("frontend", &self.frontend)
            .field("status", &self.status())
            .finish()
    }
}

impl Predictor {
    /// Creates an unconfigured predictor with the SiCNN mel front-end.
    pub fn new() -> Result<Self, PredictError> {
        Self::with_frontend(MelBandsConfig::default())
    }

    /// Creates an unconfigured predictor with a custom mel front-end.
    pub fn with_frontend(cfg: MelBandsConfig) -> Result<Self, PredictError> {
        Ok(Self {
            frontend: MelBandExtractor::new(cfg)?,
            state: RwLock::new(State::Unconfigured),
        })
    }

    pub fn frontend(&self) -> &MelBandExtractor {
        &self.frontend
    }

    pub fn status(&self) -> Status {
        match &*self.state.read() {
            State::Unconfigured => Status::Unconfigured,
            State::Disabled => Status::Disabled,
            State::Loaded(loaded) => Status::Loaded {
                source: loaded.graph.source().to_path_buf(),
            },
        }
    }

    /// Loads the configured model and binds its tensors.
    ///
    /// With both model paths empty the predictor becomes disabled and no
    /// other option is checked.
    pub fn configure(&self, cfg: &PredictorConfig) -> Result<(), PredictError> {
        let Some(plan) = cfg.plan()? else {
            tracing::info!("predict: no model configured, predictions disabled");
            *self.state.write() = State::Disabled;
            return Ok(());
        };

        let graph = GraphHandle::load(&plan.source)?;
        self.install(Arc::new(graph), plan.options)
    }

    /// Binds an already loaded graph. Model paths in `cfg` are ignored.
    pub fn configure_with_graph(&self, cfg: &PredictorConfig, graph: Arc<dyn Graph>) -> Result<(), PredictError> {
        let options = cfg.run_options()?;
        self.install(graph, options)
    }

    fn install(&self, graph: Arc<dyn Graph>, options: RunOptions) -> Result<(), PredictError> {
        let bindings = bind(
            graph.as_ref(),
            &options.input,
            &options.output,
            options.training.as_deref(),
        )?;
        tracing::info!(
            source = %graph.source().display(),
            input = %bindings.input,
            output = %bindings.output,
            windowing = ?options.windowing,
            batching = ?options.batching,
            "predict: model loaded"
        );
        *self.state.write() = State::Loaded(Arc::new(Loaded {
            graph,
            bindings,
            options,
        }));
        Ok(())
    }

    /// Runs the model over a feature matrix and returns one prediction per
    /// patch, in stream order.
    ///
    /// Returns an empty result when the predictor is disabled.
    pub fn predict(&self, features: &[Vec<f32>]) -> Result<Vec<Vec<f32>>, PredictError> {
        match self.snapshot()? {
            Some(loaded) => self.run(&loaded, features),
            None => Ok(Vec::new()),
        }
    }

    /// Frames a mono 22050 Hz signal, extracts mel bands and runs
    /// [`predict`](Self::predict) on them.
    pub fn predict_signal(&self, samples: &[f32]) -> Result<Vec<Vec<f32>>, PredictError> {
        if samples.is_empty() {
            return Err(PredictError::InvalidInput);
        }
        let Some(loaded) = self.snapshot()? else {
            return Ok(Vec::new());
        };
        let features = self.frontend.melspectrogram(samples, HOP_SIZE)?;
        self.run(&loaded, &features)
    }

    fn snapshot(&self) -> Result<Option<Arc<Loaded>>, PredictError> {
        match &*self.state.read() {
            State::Unconfigured => Err(PredictError::Configuration("predictor is not configured".into())),
            State::Disabled => Ok(None),
            State::Loaded(loaded) => Ok(Some(Arc::clone(loaded))),
        }
    }

    fn run(&self, loaded: &Loaded, features: &[Vec<f32>]) -> Result<Vec<Vec<f32>>, PredictError> {
        if features.is_empty() {
            return Err(PredictError::InvalidInput);
        }
        let bands = self.frontend.number_bands();
        if let Some(bad) = features.iter().find(|f| f.len() != bands) {
            return Err(PredictError::InvalidInputSize {
                expected: bands,
                got: bad.len(),
            });
        }

        let opts = &loaded.options;
        let patches = patch_indices(features.len(), opts.windowing, opts.last_patch_mode);
        if patches.is_empty() {
            tracing::debug!(frames = features.len(), "predict: stream shorter than one patch");
            return Ok(Vec::new());
        }

        let mut predictions = Vec::with_capacity(patches.len());
        for batch in batches(&patches, opts.batching) {
            let mut feeds = vec![Feed::Float {
                name: loaded.bindings.input.clone(),
                tensor: assemble(features, batch, bands)?,
            }];
            if let Some(name) = &loaded.bindings.training {
                feeds.push(Feed::Flag {
                    name: name.clone(),
                    value: false,
                });
            }

            let out = loaded.graph.run(feeds, &loaded.bindings.output)?;
            let items = out.split_batch(batch.len()).ok_or_else(|| {
                tracing::warn!(
                    shape = ?out.shape(),
                    batch = batch.len(),
                    "predict: output does not split by batch"
                );
                PredictError::Inference(format!(
                    "output shape {:?} does not split into {} patches",
                    out.shape(),
                    batch.len()
                ))
            })?;
            predictions.extend(items);
        }

        tracing::debug!(
            frames = features.len(),
            patches = predictions.len(),
            "predict: done"
        );
        Ok(predictions)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::mpsc;

    use parking_lot::Mutex;
    use sicnn_infer::{InferError, TensorData, TensorKind};
    use sicnn_melbands::NUMBER_BANDS;

    use super::*;

    /// Averages every patch over time: `[b, t, bands, 1] -> [b, bands]`.
    struct MeanGraph {
        inputs: Vec<String>,
        outputs: Vec<String>,
        runs: Mutex<Vec<(Vec<usize>, Option<bool>)>>,
    }

    impl MeanGraph {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                inputs: vec!["x".into(), "is_training".into()],
                outputs: vec!["y".into()],
                runs: Mutex::new(Vec::new()),
            })
        }
    }

    fn mean_patches(feeds: &[Feed]) -> TensorData {
        let tensor = feeds
            .iter()
            .find_map(|f| match f {
                Feed::Float { tensor, .. } => Some(tensor),
                Feed::Flag { .. } => None,
            })
            .unwrap();
        let (b, t, bands) = (tensor.shape()[0], tensor.shape()[1], tensor.shape()[2]);
        let mut out = vec![0.0f32; b * bands];
        for (item, chunk) in tensor.data().chunks(t * bands).enumerate() {
            for frame in chunk.chunks(bands) {
                for (k, v) in frame.iter().enumerate() {
                    out[item * bands + k] += v / t as f32;
                }
            }
        }
        TensorData::new(vec![b, bands], out).unwrap()
    }

    impl Graph for MeanGraph {
        fn source(&self) -> &Path {
            Path::new("mean.onnx")
        }

        fn inputs(&self) -> &[String] {
            &self.inputs
        }

        fn outputs(&self) -> &[String] {
            &self.outputs
        }

        fn run(&self, feeds: Vec<Feed>, _output: &str) -> Result<TensorData, InferError> {
            let flag = feeds.iter().find_map(|f| match f {
                Feed::Flag { value, .. } => Some(*value),
                Feed::Float { .. } => None,
            });
            let out = mean_patches(&feeds);
            self.runs.lock().push((out.shape().to_vec(), flag));
            Ok(out)
        }
    }

    /// Blocks inside `run` until released.
    struct GatedGraph {
        inputs: Vec<String>,
        started: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl Graph for GatedGraph {
        fn source(&self) -> &Path {
            Path::new("gated.onnx")
        }

        fn inputs(&self) -> &[String] {
            &self.inputs
        }

        fn outputs(&self) -> &[String] {
            &self.inputs
        }

        fn run(&self, feeds: Vec<Feed>, _output: &str) -> Result<TensorData, InferError> {
            self.started.lock().send(()).unwrap();
            self.release.lock().recv().unwrap();
            Ok(mean_patches(&feeds))
        }
    }

    /// Returns an output that cannot be split per patch.
    struct OddGraph(Vec<String>);

    impl Graph for OddGraph {
        fn source(&self) -> &Path {
            Path::new("odd.onnx")
        }

        fn inputs(&self) -> &[String] {
            &self.0
        }

        fn outputs(&self) -> &[String] {
            &self.0
        }

        fn run(&self, _feeds: Vec<Feed>, _output: &str) -> Result<TensorData, InferError> {
            TensorData::new(vec![3], vec![0.0; 3])
        }
    }

    fn graph_config() -> PredictorConfig {
        PredictorConfig {
            input: "x".into(),
            output: "y".into(),
            ..Default::default()
        }
    }

    /// Frame `i` holds the value `i` in every band.
    fn ramp(frames: usize) -> Vec<Vec<f32>> {
        (0..frames).map(|i| vec![i as f32; NUMBER_BANDS]).collect()
    }

    fn loaded(cfg: &PredictorConfig) -> (Predictor, Arc<MeanGraph>) {
        let graph = MeanGraph::new();
        let predictor = Predictor::new().unwrap();
        predictor.configure_with_graph(cfg, graph.clone()).unwrap();
        (predictor, graph)
    }

    #[test]
    fn test_unconfigured_predict_fails() {
        let predictor = Predictor::new().unwrap();
        assert_eq!(predictor.status(), Status::Unconfigured);
        assert!(matches!(predictor.predict(&ramp(200)), Err(PredictError::Configuration(_))));
        assert!(matches!(
            predictor.predict_signal(&[0.0; 1000]),
            Err(PredictError::Configuration(_))
        ));
    }

    #[test]
    fn test_disabled_returns_empty() {
        let predictor = Predictor::new().unwrap();
        predictor
            .configure(&PredictorConfig {
                input: "anything".into(),
                output: String::new(),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(predictor.status(), Status::Disabled);
        assert!(predictor.predict(&ramp(300)).unwrap().is_empty());
        assert!(predictor.predict_signal(&[0.1; 22050]).unwrap().is_empty());
        assert!(matches!(predictor.predict_signal(&[]), Err(PredictError::InvalidInput)));
    }

    #[test]
    fn test_fixed_hop_predictions_in_order() {
        let (predictor, graph) = loaded(&graph_config());
        assert_eq!(
            predictor.status(),
            Status::Loaded {
                source: PathBuf::from("mean.onnx")
            }
        );

        let predictions = predictor.predict(&ramp(250)).unwrap();
        assert_eq!(predictions.len(), 3);
        for (p, start) in predictions.iter().zip([0.0f32, 50.0, 100.0]) {
            assert_eq!(p.len(), NUMBER_BANDS);
            assert!((p[0] - (start + 50.0)).abs() < 1e-3, "{} vs {}", p[0], start + 50.0);
        }

        let runs = graph.runs.lock();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0], (vec![3, NUMBER_BANDS], None));
    }

    #[test]
    fn test_batches_split_runs() {
        let (predictor, graph) = loaded(&PredictorConfig {
            batch_size: 2,
            ..graph_config()
        });
        assert_eq!(predictor.predict(&ramp(250)).unwrap().len(), 3);

        let shapes: Vec<Vec<usize>> = graph.runs.lock().iter().map(|r| r.0.clone()).collect();
        assert_eq!(shapes, vec![vec![2, NUMBER_BANDS], vec![1, NUMBER_BANDS]]);
    }

    #[test]
    fn test_whole_sequence() {
        let (predictor, _) = loaded(&PredictorConfig {
            patch_hop_size: 0,
            ..graph_config()
        });
        let predictions = predictor.predict(&ramp(7)).unwrap();
        assert_eq!(predictions.len(), 1);
        assert!((predictions[0][0] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_short_stream_discard_and_repeat() {
        let (predictor, _) = loaded(&graph_config());
        assert!(predictor.predict(&ramp(20)).unwrap().is_empty());

        let (predictor, _) = loaded(&PredictorConfig {
            last_patch_mode: crate::LastPatchMode::Repeat,
            ..graph_config()
        });
        assert_eq!(predictor.predict(&ramp(20)).unwrap().len(), 1);
    }

    #[test]
    fn test_training_flag_fed_false() {
        let (predictor, graph) = loaded(&PredictorConfig {
            is_training_name: "is_training".into(),
            ..graph_config()
        });
        predictor.predict(&ramp(101)).unwrap();
        assert_eq!(graph.runs.lock()[0].1, Some(false));
    }

    #[test]
    fn test_feature_validation() {
        let (predictor, _) = loaded(&graph_config());
        assert!(matches!(predictor.predict(&[]), Err(PredictError::InvalidInput)));

        let mut features = ramp(120);
        features[60].pop();
        assert!(matches!(
            predictor.predict(&features),
            Err(PredictError::InvalidInputSize {
                expected: NUMBER_BANDS,
                got
            }) if got == NUMBER_BANDS - 1
        ));
    }

    #[test]
    fn test_binding_failure_keeps_previous_state() {
        let (predictor, _) = loaded(&graph_config());
        let err = predictor
            .configure_with_graph(
                &PredictorConfig {
                    input: "missing".into(),
                    ..graph_config()
                },
                MeanGraph::new(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            PredictError::TensorBinding { kind: TensorKind::Input, ref name, .. } if name == "missing"
        ));
        assert!(matches!(predictor.status(), Status::Loaded { .. }));
        assert_eq!(predictor.predict(&ramp(101)).unwrap().len(), 1);
    }

    #[test]
    fn test_load_failure_keeps_previous_state() {
        let predictor = Predictor::new().unwrap();
        predictor.configure(&PredictorConfig::default()).unwrap();

        let err = predictor
            .configure(&PredictorConfig {
                graph_filename: "/nonexistent/model.onnx".into(),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, PredictError::ModelLoad { .. }), "{err}");
        assert_eq!(predictor.status(), Status::Disabled);

        let err = predictor
            .configure(&PredictorConfig {
                graph_filename: "a.onnx".into(),
                saved_model: "b".into(),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, PredictError::Configuration(_)));
        assert_eq!(predictor.status(), Status::Disabled);
    }

    #[test]
    fn test_unsplittable_output_is_inference_error() {
        let predictor = Predictor::new().unwrap();
        predictor
            .configure_with_graph(
                &PredictorConfig {
                    batch_size: 2,
                    ..graph_config()
                },
                Arc::new(OddGraph(vec!["x".into(), "y".into()])),
            )
            .unwrap();
        assert!(matches!(
            predictor.predict(&ramp(250)),
            Err(PredictError::Inference(_))
        ));
    }

    #[test]
    fn test_reconfigure_does_not_disturb_running_predict() {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let graph = Arc::new(GatedGraph {
            inputs: vec!["x".into(), "y".into()],
            started: Mutex::new(started_tx),
            release: Mutex::new(release_rx),
        });

        let predictor = Arc::new(Predictor::new().unwrap());
        predictor.configure_with_graph(&graph_config(), graph).unwrap();

        let worker = {
            let predictor = Arc::clone(&predictor);
            std::thread::spawn(move || predictor.predict(&ramp(101)))
        };

        started_rx.recv().unwrap();
        predictor.configure(&PredictorConfig::default()).unwrap();
        assert_eq!(predictor.status(), Status::Disabled);
        release_tx.send(()).unwrap();

        let predictions = worker.join().unwrap().unwrap();
        assert_eq!(predictions.len(), 1);
        assert!(predictor.predict(&ramp(101)).unwrap().is_empty());
    }

    #[test]
    fn test_predict_signal_matches_feature_path() {
        let (predictor, _) = loaded(&PredictorConfig {
            patch_hop_size: 0,
            ..graph_config()
        });
        let signal: Vec<f32> = (0..11025).map(|i| ((i as f32) * 0.05).sin() * 0.3).collect();
        let features = predictor.frontend().melspectrogram(&signal, HOP_SIZE).unwrap();
        assert_eq!(
            predictor.predict_signal(&signal).unwrap(),
            predictor.predict(&features).unwrap()
        );
    }
}
