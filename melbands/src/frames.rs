//! Slices a mono signal into fixed-size overlapping frames.

use crate::error::MelBandsError;

/// Lazy iterator of fixed-size frames over a signal.
///
/// Frame `k` is centered on sample `k * hop_size`. Samples that fall outside
/// the signal are zero, so the first frame is half padding. Frames are emitted
/// while their center lies inside the signal; an empty signal yields nothing.
pub struct FrameCutter<'a> {
    samples: &'a [f32],
    frame_size: usize,
    hop_size: usize,
    index: usize,
}

impl<'a> FrameCutter<'a> {
    /// Creates a frame cutter. `frame_size` and `hop_size` must be positive.
    pub fn new(samples: &'a [f32], frame_size: usize, hop_size: usize) -> Result<Self, MelBandsError> {
        if frame_size == 0 || hop_size == 0 {
            return Err(MelBandsError::Config(format!(
                "frame cutter needs positive sizes, got frame={frame_size} hop={hop_size}"
            )));
        }
        Ok(Self {
            samples,
            frame_size,
            hop_size,
            index: 0,
        })
    }

    /// Total number of frames this cutter yields for its signal.
    pub fn frame_count(&self) -> usize {
        self.samples.len().div_ceil(self.hop_size)
    }
}

impl Iterator for FrameCutter<'_> {
    type Item = Vec<f32>;

    fn next(&mut self) -> Option<Vec<f32>> {
        let center = self.index.checked_mul(self.hop_size)?;
        if center >= self.samples.len() {
            return None;
        }
        self.index += 1;

        let mut frame = vec![0.0f32; self.frame_size];
        let start = center as isize - (self.frame_size / 2) as isize;
        for (i, slot) in frame.iter_mut().enumerate() {
            let pos = start + i as isize;
            if pos >= 0 {
                if let Some(&s) = self.samples.get(pos as usize) {
                    *slot = s;
                }
            }
        }
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.frame_count().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}
