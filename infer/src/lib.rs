//! Frozen-graph loading, tensor binding and execution.
//!
//! Graphs run on ONNX Runtime through the [`ort`] crate. A graph comes either
//! from a single serialized file or from a saved-model directory that bundles
//! the graph (`model.onnx`) with a `signature.json` alias table.
//!
//! # Usage
//!
//! ```no_run
//! use sicnn_infer::{bind, Feed, Graph, GraphHandle, TensorData};
//!
//! let graph = GraphHandle::load_file("VGG91_a125bis.onnx").unwrap();
//! let bindings = bind(&graph, "model/Placeholder", "model/Sigmoid", None).unwrap();
//!
//! let patch = TensorData::new(vec![1, 101, 96, 1], vec![0.0; 101 * 96]).unwrap();
//! let feeds = vec![Feed::Float { name: bindings.input.clone(), tensor: patch }];
//! let predictions = graph.run(feeds, &bindings.output).unwrap();
//! ```
//!
//! # Thread Safety
//!
//! [`GraphHandle`] is `Send + Sync` and can be shared behind an `Arc`.
//! Runs on one handle are serialized; load several handles to run in parallel.

mod error;
mod graph;
mod signature;
mod tensor;

#[cfg(any(test, feature = "test-util"))]
pub mod test_util;

pub use error::{InferError, TensorKind};
pub use graph::{bind, Bindings, Graph, GraphHandle};
pub use signature::{ModelSource, Signature, SAVED_MODEL_GRAPH, SAVED_MODEL_SIGNATURE};
pub use tensor::{Feed, TensorData};
