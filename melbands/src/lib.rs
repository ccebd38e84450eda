//! Log-compressed mel-band front-end for SiCNN audio tagging models.
//!
//! One fixed-size frame in, one vector of `log10` mel-band energies out:
//!
//! 1. Hann window, zero-padded to the FFT size
//! 2. Real FFT ([`realfft`]), power spectrum
//! 3. Slaney mel filterbank with unit-area triangles
//! 4. `log10(max(energy, eps))`
//!
//! # Usage
//!
//! ```
//! use sicnn_melbands::{MelBandExtractor, FRAME_SIZE, NUMBER_BANDS};
//!
//! let extractor = MelBandExtractor::sicnn().unwrap();
//! let bands = extractor.compute(&[0.0; FRAME_SIZE]).unwrap();
//! assert_eq!(bands.len(), NUMBER_BANDS);
//! ```
//!
//! [`FrameCutter`] slices a longer signal into the centered, zero-padded
//! frames the extractor expects.

mod config;
mod error;
mod extractor;
mod frames;
pub mod mel;

pub use config::{
    MelBandsConfig, Normalize, SpectrumType, Warping, WindowType, EPS, FRAME_SIZE, HOP_SIZE,
    NUMBER_BANDS,
};
pub use error::MelBandsError;
pub use extractor::MelBandExtractor;
pub use frames::FrameCutter;
