use std::fmt;
use std::sync::Arc;

use realfft::{RealFftPlanner, RealToComplex};

use crate::config::{MelBandsConfig, SpectrumType};
use crate::error::MelBandsError;
use crate::frames::FrameCutter;
use crate::mel::{self, Filter};

/// Log-compressed mel-band extractor for one fixed frame size.
///
/// Holds only immutable tables (window, filterbank, FFT plan), so a single
/// instance can be shared across threads and called concurrently.
pub struct MelBandExtractor {
    cfg: MelBandsConfig,
    window: Vec<f64>,
    bank: Vec<Filter>,
    fft: Arc<dyn RealToComplex<f64>>,
}

impl fmt::Debug for MelBandExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MelBandExtractor")
            .field("cfg", &self.cfg)
            .finish_non_exhaustive()
    }
}

impl MelBandExtractor {
    /// Creates an extractor, validating the configuration.
    pub fn new(cfg: MelBandsConfig) -> Result<Self, MelBandsError> {
        cfg.validate()?;
        let window = mel::window(cfg.window, cfg.frame_size);
        let bank = mel::mel_filter_bank(&cfg);
        let fft = RealFftPlanner::<f64>::new().plan_fft_forward(cfg.fft_size);
        tracing::debug!(
            frame_size = cfg.frame_size,
            fft_size = cfg.fft_size,
            bands = cfg.number_bands,
            "melbands: extractor ready"
        );
        Ok(Self {
            cfg,
            window,
            bank,
            fft,
        })
    }

    /// Creates an extractor with the SiCNN defaults.
    pub fn sicnn() -> Result<Self, MelBandsError> {
        Self::new(MelBandsConfig::default())
    }

    pub fn config(&self) -> &MelBandsConfig {
        &self.cfg
    }

    pub fn frame_size(&self) -> usize {
        self.cfg.frame_size
    }

    pub fn number_bands(&self) -> usize {
        self.cfg.number_bands
    }

    /// Computes `log10(max(energy, eps))` for every mel band of one frame.
    ///
    /// The frame must hold exactly `frame_size` samples.
    pub fn compute(&self, frame: &[f32]) -> Result<Vec<f32>, MelBandsError> {
        if frame.is_empty() {
            return Err(MelBandsError::InvalidInput);
        }
        if frame.len() != self.cfg.frame_size {
            return Err(MelBandsError::InvalidInputSize {
                expected: self.cfg.frame_size,
                got: frame.len(),
            });
        }

        // Window and zero-pad.
        let mut buf = self.fft.make_input_vec();
        for (slot, (&s, &w)) in buf.iter_mut().zip(frame.iter().zip(&self.window)) {
            *slot = s as f64 * w;
        }

        let mut bins = self.fft.make_output_vec();
        self.fft
            .process(&mut buf, &mut bins)
            .map_err(|e| MelBandsError::Fft(e.to_string()))?;

        let spectrum: Vec<f64> = match self.cfg.spectrum {
            SpectrumType::Power => bins.iter().map(|c| c.norm_sqr()).collect(),
            SpectrumType::Magnitude => bins.iter().map(|c| c.norm()).collect(),
        };

        let eps = self.cfg.eps;
        Ok(self
            .bank
            .iter()
            .map(|filter| filter.apply(&spectrum).max(eps).log10() as f32)
            .collect())
    }

    /// Cuts `samples` into `frame_size` frames every `hop_size` samples and
    /// extracts one band vector per frame, in temporal order.
    pub fn melspectrogram(&self, samples: &[f32], hop_size: usize) -> Result<Vec<Vec<f32>>, MelBandsError> {
        let cutter = FrameCutter::new(samples, self.cfg.frame_size, hop_size)?;
        let mut frames = Vec::with_capacity(cutter.frame_count());
        for frame in cutter {
            frames.push(self.compute(&frame)?);
        }
        Ok(frames)
    }
}
