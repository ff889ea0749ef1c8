//! sf-vad: Energy-based voice activity detection for SpeechForge
//!
//! Fits a small Gaussian mixture to normalized per-frame log-energy and
//! thresholds against the highest-energy component. Degenerate fits retry
//! with fewer components; below two components the detector falls back to
//! an all-non-speech labeling instead of failing the caller's pipeline.

mod gmm;

use serde::{Deserialize, Serialize};

use sf_core::{Sample, SfError, SfResult};

use gmm::GaussianMixture;

// ============ Sensitivity ============

/// Detection sensitivity: the `alpha` multiplier on the dominant
/// component's standard deviation. Higher alpha lowers the threshold and
/// admits more frames as speech.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum VadMode {
    /// alpha = 1.2
    Strict,
    /// alpha = 2.0
    Standard,
    /// alpha = 2.4
    Sensitive,
    /// Explicit alpha, clamped into `[1.0, 2.4]`
    Custom(Sample),
}

impl VadMode {
    pub fn alpha(self) -> Sample {
        match self {
            Self::Strict => 1.2,
            Self::Standard => 2.0,
            Self::Sensitive => 2.4,
            Self::Custom(a) => a.clamp(1.0, 2.4),
        }
    }
}

impl Default for VadMode {
    fn default() -> Self {
        Self::Standard
    }
}

// ============ Configuration ============

/// Parameters of the energy VAD
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VadConfig {
    /// Initial mixture order; degenerate fits step down to 2
    pub components: usize,
    /// EM sweeps per fit, no early stop
    pub iterations: usize,
    /// Variance floor
    pub flooring: Sample,
    /// Variance ceiling
    pub ceiling: Sample,
    /// Sensitivity mode
    pub mode: VadMode,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            components: 3,
            iterations: 8,
            flooring: 1e-4,
            ceiling: 1.0,
            mode: VadMode::Standard,
        }
    }
}

impl VadConfig {
    pub fn validate(&self) -> SfResult<()> {
        if self.components < 2 {
            return Err(SfError::invalid(format!(
                "VAD needs at least 2 mixture components, got {}",
                self.components
            )));
        }
        if self.iterations == 0 {
            return Err(SfError::invalid("VAD needs at least 1 EM iteration"));
        }
        if self.flooring <= 0.0 || self.ceiling < self.flooring {
            return Err(SfError::invalid(format!(
                "variance bounds must satisfy 0 < flooring <= ceiling, got [{}, {}]",
                self.flooring, self.ceiling
            )));
        }
        Ok(())
    }

    pub fn with_mode(mut self, mode: VadMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_components(mut self, components: usize) -> Self {
        self.components = components;
        self
    }
}

// ============ Decision ============

/// Per-frame labels plus the threshold that produced them.
///
/// The threshold lives on the normalized (zero-mean, unit-variance)
/// log-energy scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VadDecision {
    /// 1 = speech, 0 = non-speech, index-aligned with the input frames
    pub labels: Vec<u8>,
    pub threshold: Sample,
}

impl VadDecision {
    pub fn speech_frames(&self) -> usize {
        self.labels.iter().filter(|&&l| l != 0).count()
    }

    pub fn speech_ratio(&self) -> f64 {
        if self.labels.is_empty() {
            return 0.0;
        }
        self.speech_frames() as f64 / self.labels.len() as f64
    }

    fn all_non_speech(frames: usize) -> Self {
        Self {
            labels: vec![0; frames],
            threshold: 0.0,
        }
    }
}

// ============ Detection ============

/// Label each frame of `log_energy` as speech or non-speech.
///
/// Infallible by contract: numerical degeneracy steps the mixture order
/// down and ultimately degrades to an all-non-speech decision.
pub fn vad_energy(log_energy: &[Sample], config: &VadConfig) -> VadDecision {
    let n = log_energy.len();
    if n == 0 {
        return VadDecision::all_non_speech(0);
    }

    let mean = log_energy.iter().sum::<Sample>() / n as Sample;
    let variance = log_energy
        .iter()
        .map(|&e| (e - mean) * (e - mean))
        .sum::<Sample>()
        / n as Sample;
    let std = variance.sqrt();
    if !(std > 0.0 && std.is_finite() && mean.is_finite()) {
        log::warn!("log-energy has no usable spread (mean {mean}, std {std}), labeling all non-speech");
        return VadDecision::all_non_speech(n);
    }
    let normalized: Vec<Sample> = log_energy.iter().map(|&e| (e - mean) / std).collect();

    let alpha = config.mode.alpha();
    let mut components = config.components.max(2);
    loop {
        match GaussianMixture::fit(
            &normalized,
            components,
            config.iterations,
            config.flooring,
            config.ceiling,
        ) {
            Ok(gmm) => {
                let (dominant_mean, dominant_var) = gmm.dominant();
                let threshold = dominant_mean - alpha * dominant_var.sqrt();
                let labels = normalized
                    .iter()
                    .map(|&e| u8::from(e > threshold))
                    .collect();
                return VadDecision { labels, threshold };
            }
            Err(err) => {
                if components == 2 {
                    log::warn!("energy VAD gave up after 2-component fit failed: {err}");
                    return VadDecision::all_non_speech(n);
                }
                log::warn!(
                    "energy VAD fit with {components} components degenerate ({err}), retrying with {}",
                    components - 1
                );
                components -= 1;
            }
        }
    }
}
