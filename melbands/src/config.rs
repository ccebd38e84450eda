use serde::{Deserialize, Serialize};

use crate::error::MelBandsError;

/// Frame length in samples expected by SiCNN models (30ms @ 22050 Hz).
pub const FRAME_SIZE: usize = 660;

/// Frame hop used when cutting a signal for SiCNN models (10ms @ 22050 Hz).
pub const HOP_SIZE: usize = 220;

/// Number of mel bands fed to SiCNN models.
pub const NUMBER_BANDS: usize = 96;

/// Floor applied to band energies before log compression.
pub const EPS: f64 = 1.1e-8;

/// Mel scale used to place the filter edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Warping {
    /// Slaney's auditory toolbox scale: linear below 1 kHz, logarithmic above.
    Slaney,
    /// HTK scale: `2595 * log10(1 + f / 700)`.
    Htk,
}

/// Triangle normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalize {
    /// Every triangle has unit area.
    UnitTri,
    /// Every triangle peaks at 1.
    UnitMax,
}

/// Spectrum fed to the filterbank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpectrumType {
    Magnitude,
    Power,
}

/// Analysis window applied before the FFT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowType {
    Hann,
    Hamming,
}

/// Configures mel-band extraction.
///
/// The default matches the input distribution SiCNN models were trained on:
/// 660-sample Hann frames zero-padded to a 1024-point FFT, 96 Slaney mel
/// bands over 0-11025 Hz with unit-area triangles, power spectrum, and a
/// `log10` compression floored at `1.1e-8`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct MelBandsConfig {
    /// Input frame length in samples (default: 660).
    pub frame_size: usize,
    /// FFT length; frames are zero-padded up to it (default: 1024).
    pub fft_size: usize,
    /// Sample rate in Hz (default: 22050).
    pub sample_rate: f64,
    /// Number of output bands (default: 96).
    pub number_bands: usize,
    /// Lower edge of the first triangle in Hz (default: 0).
    pub low_frequency_bound: f64,
    /// Upper edge of the last triangle in Hz (default: 11025).
    pub high_frequency_bound: f64,
    /// Energy floor before `log10` (default: 1.1e-8).
    pub eps: f64,
    pub warping: Warping,
    pub normalize: Normalize,
    pub spectrum: SpectrumType,
    pub window: WindowType,
}

impl Default for MelBandsConfig {
    fn default() -> Self {
        Self {
            frame_size: FRAME_SIZE,
            fft_size: 1024,
            sample_rate: 22050.0,
            number_bands: NUMBER_BANDS,
            low_frequency_bound: 0.0,
            high_frequency_bound: 11025.0,
            eps: EPS,
            warping: Warping::Slaney,
            normalize: Normalize::UnitTri,
            spectrum: SpectrumType::Power,
            window: WindowType::Hann,
        }
    }
}

impl MelBandsConfig {
    /// Parses a JSON object with camelCase keys. Missing keys take their defaults.
    pub fn from_json(data: &[u8]) -> Result<Self, MelBandsError> {
        serde_json::from_slice(data).map_err(|e| MelBandsError::Config(e.to_string()))
    }

    /// Number of spectrum bins produced by the FFT.
    pub fn spectrum_size(&self) -> usize {
        self.fft_size / 2 + 1
    }

    pub(crate) fn validate(&self) -> Result<(), MelBandsError> {
        if self.frame_size == 0 {
            return Err(MelBandsError::Config("frameSize must be positive".into()));
        }
        if self.fft_size < self.frame_size {
            return Err(MelBandsError::Config(format!(
                "fftSize ({}) must be at least frameSize ({})",
                self.fft_size, self.frame_size
            )));
        }
        if self.number_bands == 0 {
            return Err(MelBandsError::Config("numberBands must be positive".into()));
        }
        if !(self.sample_rate > 0.0) {
            return Err(MelBandsError::Config("sampleRate must be positive".into()));
        }
        let nyquist = self.sample_rate / 2.0;
        if self.low_frequency_bound < 0.0
            || self.low_frequency_bound >= self.high_frequency_bound
            || self.high_frequency_bound > nyquist
        {
            return Err(MelBandsError::Config(format!(
                "frequency bounds must satisfy 0 <= low < high <= {nyquist}, got {}..{}",
                self.low_frequency_bound, self.high_frequency_bound
            )));
        }
        if !(self.eps > 0.0 && self.eps.is_finite()) {
            return Err(MelBandsError::Config(format!("eps must be positive, got {}", self.eps)));
        }
        Ok(())
    }
}
