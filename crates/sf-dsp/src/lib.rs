//! sf-dsp: Spectral feature DSP core for SpeechForge
//!
//! Deterministic signal processing from raw waveform to frame-aligned
//! feature matrices:
//! - Analysis windows and the process-wide filter/window cache
//! - Overlapping frame segmentation with configurable edge policies
//! - STFT/ISTFT with windowed overlap-add reconstruction
//! - Mel filterbank, DCT basis, dB scaling, MFCC
//! - Per-frame pitch tracking
//! - Regression-based delta features
//!
//! All matrices use the internal `[feature_dim, num_frames]` layout, one
//! column per frame.

pub mod cache;
pub mod delta;
pub mod frame;
pub mod mel;
pub mod pitch;
pub mod spectrum;
pub mod stft;
pub mod window;

pub use cache::FilterCache;
pub use delta::delta;
pub use frame::{frame_iter, segment, EdgePolicy, Orientation};
pub use mel::{dct_basis, hz_to_mel, mel_to_hz, MelFilterbank};
pub use pitch::pitch_track;
pub use spectrum::{db_scale, mfcc, power_spectrogram};
pub use stft::{istft, log_frame_energy, pre_emphasis, stft, Stft, StftOptions, StftPlan};
pub use window::{WindowKind, WindowSpec};
