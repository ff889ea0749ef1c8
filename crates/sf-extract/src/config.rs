//! Extraction Configuration

use serde::{Deserialize, Serialize};

use sf_core::{Sample, SfError};
use sf_dsp::WindowKind;
use sf_vad::VadConfig;

use crate::ExtractResult;

/// Sample rate conversion quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ResampleQuality {
    /// Coarse sub-chunking, fast
    #[default]
    Fast,
    /// Fine sub-chunking, slower
    Best,
}

/// Which feature streams to compute. Unselected streams are `None` in the
/// output and their work is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSelection {
    /// Log-power spectrogram
    pub spec: bool,
    /// Log-mel spectrogram
    pub mspec: bool,
    /// Mel-frequency cepstral coefficients
    pub mfcc: bool,
    /// Per-frame dominant frequency
    pub pitch: bool,
    /// Per-frame log-energy
    pub energy: bool,
    /// Voice-activity labels
    pub vad: bool,
}

impl FeatureSelection {
    pub fn all() -> Self {
        Self {
            spec: true,
            mspec: true,
            mfcc: true,
            pitch: true,
            energy: true,
            vad: true,
        }
    }

    pub fn none() -> Self {
        Self {
            spec: false,
            mspec: false,
            mfcc: false,
            pitch: false,
            energy: false,
            vad: false,
        }
    }

    pub fn any(&self) -> bool {
        self.spec || self.mspec || self.mfcc || self.pitch || self.energy || self.vad
    }

    /// Frame energy is a prerequisite of the VAD as well
    pub(crate) fn needs_energy(&self) -> bool {
        self.energy || self.vad
    }

    /// The STFT runs only when some spectral stream wants it
    pub(crate) fn needs_stft(&self) -> bool {
        self.spec || self.mspec || self.mfcc || self.pitch
    }
}

impl Default for FeatureSelection {
    fn default() -> Self {
        Self::all()
    }
}

/// All tunables of the extraction pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Analysis window length in milliseconds
    pub window_ms: f64,
    /// Hop between windows in milliseconds
    pub shift_ms: f64,
    /// Mel filterbank channels
    pub n_mels: usize,
    /// Cepstral coefficients (DC excluded unless `keep_mfcc_dc`)
    pub n_ceps: usize,
    /// Lower frequency bound in Hz for mel and pitch analysis
    pub fmin: Sample,
    /// Upper bound in Hz; `None` means Nyquist
    pub fmax: Option<Sample>,
    /// Pre-emphasis coefficient; `None` disables the filter
    pub preemphasis: Option<Sample>,
    /// Relative magnitude gate for pitch peak picking
    pub pitch_threshold: Sample,
    /// Delta orders appended to every requested stream; 0 disables
    pub delta_order: usize,
    /// Resample the input to this rate before analysis
    pub resample_to: Option<u32>,
    pub resample_quality: ResampleQuality,
    /// Analysis window shape
    pub window: WindowKind,
    /// Center frames on their hop positions via reflect padding
    pub center: bool,
    /// Use the HTK mel formula instead of the Slaney form
    pub htk_mel: bool,
    /// Keep the 0th (DC) cepstral coefficient
    pub keep_mfcc_dc: bool,
    pub vad: VadConfig,
    pub selection: FeatureSelection,
    /// Worker threads for batch extraction; 0 = all cores
    pub threads: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            window_ms: 25.0,
            shift_ms: 10.0,
            n_mels: 40,
            n_ceps: 13,
            fmin: 64.0,
            fmax: None,
            preemphasis: Some(0.97),
            pitch_threshold: 0.8,
            delta_order: 0,
            resample_to: None,
            resample_quality: ResampleQuality::Fast,
            window: WindowKind::Hann,
            center: false,
            htk_mel: false,
            keep_mfcc_dc: false,
            vad: VadConfig::default(),
            selection: FeatureSelection::all(),
            threads: 0,
        }
    }
}

impl ExtractorConfig {
    pub fn validate(&self) -> ExtractResult<()> {
        if !(self.window_ms > 0.0) || !(self.shift_ms > 0.0) {
            return Err(SfError::invalid(format!(
                "window/shift must be positive, got {} ms / {} ms",
                self.window_ms, self.shift_ms
            ))
            .into());
        }
        if self.shift_ms > self.window_ms {
            return Err(SfError::invalid(format!(
                "shift ({} ms) must not exceed window ({} ms)",
                self.shift_ms, self.window_ms
            ))
            .into());
        }
        if self.n_mels == 0 {
            return Err(SfError::invalid("n_mels must be positive").into());
        }
        if self.n_ceps == 0 || self.n_ceps + 1 > self.n_mels {
            return Err(SfError::invalid(format!(
                "n_ceps must be in 1..{}, got {}",
                self.n_mels, self.n_ceps
            ))
            .into());
        }
        if !(0.0..=1.0).contains(&self.pitch_threshold) {
            return Err(SfError::invalid(format!(
                "pitch_threshold must be in [0, 1], got {}",
                self.pitch_threshold
            ))
            .into());
        }
        if let Some(coeff) = self.preemphasis {
            if !(coeff > 0.0 && coeff < 1.0) {
                return Err(SfError::invalid(format!(
                    "pre-emphasis coefficient must be in (0, 1), got {coeff}"
                ))
                .into());
            }
        }
        if self.fmin < 0.0 {
            return Err(SfError::invalid(format!("fmin must be non-negative, got {}", self.fmin)).into());
        }
        if let Some(rate) = self.resample_to {
            if rate == 0 {
                return Err(SfError::invalid("resample_to must be positive").into());
            }
        }
        self.vad.validate()?;
        Ok(())
    }

    /// Frame length and hop in samples at the given rate. An odd frame
    /// length is bumped to the next even value so the real FFT stays
    /// well-formed.
    pub(crate) fn frame_params(&self, sample_rate: u32) -> (usize, usize) {
        let mut n_fft = (self.window_ms / 1000.0 * sample_rate as f64).round() as usize;
        if n_fft % 2 == 1 {
            log::debug!("window of {n_fft} samples rounded up to {}", n_fft + 1);
            n_fft += 1;
        }
        let hop = (self.shift_ms / 1000.0 * sample_rate as f64).round() as usize;
        (n_fft.max(2), hop.clamp(1, n_fft.max(2)))
    }

    pub fn with_selection(mut self, selection: FeatureSelection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_delta_order(mut self, order: usize) -> Self {
        self.delta_order = order;
        self
    }

    pub fn with_resample(mut self, rate: u32, quality: ResampleQuality) -> Self {
        self.resample_to = Some(rate);
        self.resample_quality = quality;
        self
    }

    pub fn with_vad(mut self, vad: VadConfig) -> Self {
        self.vad = vad;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }
}
