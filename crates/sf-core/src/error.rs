//! Error types for SpeechForge

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum SfError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Insufficient data: need at least {needed} samples, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    #[error("Degenerate model: {0}")]
    DegenerateModel(String),
}

/// Result type alias
pub type SfResult<T> = Result<T, SfError>;

impl SfError {
    /// Shorthand for `InvalidParameter` with a formatted message
    pub fn invalid(what: impl Into<String>) -> Self {
        Self::InvalidParameter(what.into())
    }
}
