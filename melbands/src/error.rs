use thiserror::Error;

/// Errors returned by mel-band extraction.
#[derive(Debug, Error)]
pub enum MelBandsError {
    #[error("melbands: empty input frame")]
    InvalidInput,

    #[error("melbands: input frame has {got} samples, expected {expected}")]
    InvalidInputSize { expected: usize, got: usize },

    #[error("melbands: invalid config: {0}")]
    Config(String),

    #[error("melbands: fft: {0}")]
    Fft(String),
}
