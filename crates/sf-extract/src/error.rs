//! Error types for feature extraction

use thiserror::Error;

use sf_core::SfError;

/// Extraction errors: the DSP taxonomy plus the I/O boundary
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("DSP error: {0}")]
    Core(#[from] SfError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Resampling failed: {0}")]
    Resample(String),

    #[error("Unsupported audio: {0}")]
    UnsupportedAudio(String),
}

/// Result type for extraction operations
pub type ExtractResult<T> = Result<T, ExtractError>;
