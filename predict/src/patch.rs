//! Cutting a feature stream into patches and patches into batches.

use std::slice::Chunks;

use sicnn_infer::TensorData;

use crate::config::{Batching, LastPatchMode, Windowing, PATCH_SIZE};
use crate::error::PredictError;

/// Frame indices of every patch over a stream of `frames` frames, in
/// stream order.
///
/// Under a fixed hop, full patches start at `0, hop, 2*hop, ...`. Frames
/// left over after the last full patch form a trailing patch that `mode`
/// either drops or completes by cycling its own frames.
pub fn patch_indices(frames: usize, windowing: Windowing, mode: LastPatchMode) -> Vec<Vec<usize>> {
    if frames == 0 {
        return Vec::new();
    }
    let hop = match windowing {
        Windowing::WholeSequence => return vec![(0..frames).collect()],
        Windowing::FixedHop(hop) => hop.get(),
    };

    let mut patches = Vec::new();
    let mut start = 0;
    while start + PATCH_SIZE <= frames {
        patches.push((start..start + PATCH_SIZE).collect());
        start += hop;
    }

    if start < frames && mode == LastPatchMode::Repeat {
        let tail = frames - start;
        patches.push((0..PATCH_SIZE).map(|i| start + i % tail).collect());
    }
    patches
}

/// Groups patches into inference runs.
pub fn batches(patches: &[Vec<usize>], batching: Batching) -> Chunks<'_, Vec<usize>> {
    let size = match batching {
        Batching::Fixed(n) => n.get(),
        Batching::WholeStream => patches.len().max(1),
    };
    patches.chunks(size)
}

/// Packs one batch of patches into a `[batch, frames, bands, 1]` tensor.
///
/// Every patch in `batch` must have the same length.
pub fn assemble(features: &[Vec<f32>], batch: &[Vec<usize>], bands: usize) -> Result<TensorData, PredictError> {
    let frames = batch.first().map_or(0, Vec::len);
    let mut data = Vec::with_capacity(batch.len() * frames * bands);
    for patch in batch {
        if patch.len() != frames {
            return Err(PredictError::InvalidInputSize {
                expected: frames,
                got: patch.len(),
            });
        }
        for &i in patch {
            data.extend_from_slice(&features[i]);
        }
    }
    Ok(TensorData::new(vec![batch.len(), frames, bands, 1], data)?)
}
