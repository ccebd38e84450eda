//! Mel-scale utilities, analysis windows and filterbank generation.

use std::f64::consts::PI;

use crate::config::{MelBandsConfig, Normalize, Warping, WindowType};

/// Generates a symmetric Hann window of the given length.
pub fn hann_window(n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![1.0; n];
    }
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
        .collect()
}

/// Generates a symmetric Hamming window of the given length.
pub fn hamming_window(n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![1.0; n];
    }
    (0..n)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
        .collect()
}

pub(crate) fn window(kind: WindowType, n: usize) -> Vec<f64> {
    match kind {
        WindowType::Hann => hann_window(n),
        WindowType::Hamming => hamming_window(n),
    }
}

const SLANEY_F_SP: f64 = 200.0 / 3.0;
const SLANEY_MIN_LOG_HZ: f64 = 1000.0;
const SLANEY_MIN_LOG_MEL: f64 = SLANEY_MIN_LOG_HZ / SLANEY_F_SP;

fn slaney_log_step() -> f64 {
    6.4f64.ln() / 27.0
}

/// Converts frequency in Hz to the given mel scale.
pub fn hz_to_mel(hz: f64, warping: Warping) -> f64 {
    match warping {
        Warping::Htk => 2595.0 * (1.0 + hz / 700.0).log10(),
        Warping::Slaney => {
            if hz < SLANEY_MIN_LOG_HZ {
                hz / SLANEY_F_SP
            } else {
                SLANEY_MIN_LOG_MEL + (hz / SLANEY_MIN_LOG_HZ).ln() / slaney_log_step()
            }
        }
    }
}

/// Converts a mel value on the given scale back to Hz.
pub fn mel_to_hz(mel: f64, warping: Warping) -> f64 {
    match warping {
        Warping::Htk => 700.0 * (10.0_f64.powf(mel / 2595.0) - 1.0),
        Warping::Slaney => {
            if mel < SLANEY_MIN_LOG_MEL {
                mel * SLANEY_F_SP
            } else {
                SLANEY_MIN_LOG_HZ * (slaney_log_step() * (mel - SLANEY_MIN_LOG_MEL)).exp()
            }
        }
    }
}

/// One triangular filter, stored as the run of non-zero weights starting at `start`.
#[derive(Debug, Clone)]
pub struct Filter {
    pub start: usize,
    pub weights: Vec<f64>,
}

impl Filter {
    /// Weighted sum of `spectrum` under this triangle.
    pub fn apply(&self, spectrum: &[f64]) -> f64 {
        self.weights
            .iter()
            .zip(&spectrum[self.start..])
            .map(|(w, s)| w * s)
            .sum()
    }
}

/// Creates the mel filterbank for the given configuration.
///
/// Filter edges are `number_bands + 2` points equally spaced on the mel scale
/// between the frequency bounds. Triangles are evaluated at each bin's
/// frequency in Hz, so the weighting is linear in frequency.
pub fn mel_filter_bank(cfg: &MelBandsConfig) -> Vec<Filter> {
    let n_bins = cfg.spectrum_size();
    let bin_hz = cfg.sample_rate / cfg.fft_size as f64;

    let low_mel = hz_to_mel(cfg.low_frequency_bound, cfg.warping);
    let high_mel = hz_to_mel(cfg.high_frequency_bound, cfg.warping);
    let step = (high_mel - low_mel) / (cfg.number_bands + 1) as f64;
    let edges: Vec<f64> = (0..cfg.number_bands + 2)
        .map(|i| mel_to_hz(low_mel + i as f64 * step, cfg.warping))
        .collect();

    let mut bank = Vec::with_capacity(cfg.number_bands);
    for m in 0..cfg.number_bands {
        let (left, center, right) = (edges[m], edges[m + 1], edges[m + 2]);
        let scale = match cfg.normalize {
            Normalize::UnitTri => 2.0 / (right - left),
            Normalize::UnitMax => 1.0,
        };

        let mut start = None;
        let mut weights = Vec::new();
        for k in 0..n_bins {
            let f = k as f64 * bin_hz;
            let w = if f > left && f <= center {
                (f - left) / (center - left)
            } else if f > center && f < right {
                (right - f) / (right - center)
            } else {
                0.0
            };
            if w > 0.0 {
                start.get_or_insert(k);
                weights.push(w * scale);
            } else if start.is_some() {
                break;
            }
        }

        // Bands narrower than one bin get no weights and stay at the floor.
        bank.push(Filter {
            start: start.unwrap_or(0),
            weights,
        });
    }
    bank
}
