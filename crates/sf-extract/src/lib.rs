//! sf-extract: Feature-extraction orchestration for SpeechForge
//!
//! Ties the DSP core and the energy VAD into one configurable pipeline:
//! WAV decoding, optional resampling, pre-emphasis, and selective
//! computation of frame-aligned feature streams, plus a rayon batch
//! front end for many files.

pub mod batch;
pub mod config;
mod error;
pub mod pipeline;
pub mod resample;
pub mod wav;

pub use batch::extract_files;
pub use config::{ExtractorConfig, FeatureSelection, ResampleQuality};
pub use error::{ExtractError, ExtractResult};
pub use pipeline::{FeatureExtractor, FeatureSet};
pub use resample::resample;
pub use wav::{read_wav, write_wav};
