//! Single-Utterance Extraction Pipeline
//!
//! Composes the DSP core into one pass over a waveform: optional
//! resampling, pre-emphasis, frame energy and VAD, STFT, and the
//! requested spectral streams with optional delta coefficients. Every
//! returned per-frame stream shares the same frame count and
//! frame-to-time alignment.

use std::path::Path;

use ndarray::{concatenate, Array1, Array2, Axis};

use sf_core::{Sample, SfError, SfResult, Waveform};
use sf_dsp::{
    cache, db_scale, delta, log_frame_energy, mfcc, pitch_track, power_spectrogram,
    pre_emphasis, spectrum, StftOptions, StftPlan, WindowSpec,
};
use sf_vad::{vad_energy, VadDecision};

use crate::config::ExtractorConfig;
use crate::{resample, wav, ExtractResult};

/// Regression window for delta features
const DELTA_WIDTH: usize = 9;

// ============ Output ============

/// The extracted feature streams, all `[num_frames, feature_dim]` and
/// index-aligned. Streams absent from the selection are `None`.
#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    /// Log-power spectrogram
    pub spec: Option<Array2<Sample>>,
    /// Log-mel spectrogram
    pub mspec: Option<Array2<Sample>>,
    /// Cepstral coefficients
    pub mfcc: Option<Array2<Sample>>,
    /// Per-frame dominant frequency in Hz
    pub pitch: Option<Array2<Sample>>,
    /// Per-frame log-energy
    pub energy: Option<Array2<Sample>>,
    /// Voice-activity labels with their decision threshold
    pub vad: Option<VadDecision>,
    /// Rate the features were computed at (after any resampling)
    pub sample_rate: u32,
    /// Hop between frames in samples
    pub hop_length: usize,
}

impl FeatureSet {
    /// Frame count shared by every present stream
    pub fn num_frames(&self) -> usize {
        for stream in [&self.spec, &self.mspec, &self.mfcc, &self.pitch, &self.energy] {
            if let Some(m) = stream {
                return m.nrows();
            }
        }
        self.vad.as_ref().map_or(0, |v| v.labels.len())
    }

    /// Seconds between consecutive frames
    pub fn frame_shift_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.hop_length as f64 / self.sample_rate as f64
    }
}

// ============ Extractor ============

/// Config-owning pipeline; one instance serves many waveforms
pub struct FeatureExtractor {
    config: ExtractorConfig,
}

impl FeatureExtractor {
    pub fn new(config: ExtractorConfig) -> ExtractResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Read a WAV file and extract its features
    pub fn extract_file(&self, path: impl AsRef<Path>) -> ExtractResult<FeatureSet> {
        let waveform = wav::read_wav(path, true)?;
        self.extract(&waveform)
    }

    /// Extract all selected feature streams from one waveform
    pub fn extract(&self, waveform: &Waveform) -> ExtractResult<FeatureSet> {
        let selection = self.config.selection;
        if !selection.any() {
            return Ok(FeatureSet {
                sample_rate: waveform.sample_rate,
                ..Default::default()
            });
        }
        if waveform.sample_rate == 0 {
            return Err(SfError::invalid("waveform sample rate must be positive").into());
        }
        if waveform.is_empty() {
            return Err(SfError::InsufficientData { needed: 1, got: 0 }.into());
        }

        let resampled;
        let wave = match self.config.resample_to {
            Some(target) if target != waveform.sample_rate => {
                resampled = resample::resample(waveform, target, self.config.resample_quality)?;
                &resampled
            }
            _ => waveform,
        };
        let sample_rate = wave.sample_rate;

        let nyquist = sample_rate as Sample / 2.0;
        let fmax = self.config.fmax.unwrap_or(nyquist).min(nyquist);
        let mut fmin = self.config.fmin;
        if fmin >= fmax {
            log::debug!("fmin {fmin} not below fmax {fmax}, dropping to 0");
            fmin = 0.0;
        }

        let (n_fft, hop_length) = self.config.frame_params(sample_rate);
        log::debug!(
            "extracting features: sr={sample_rate}, n_fft={n_fft}, hop={hop_length}, band=[{fmin}, {fmax}]"
        );

        // Pre-emphasis once on the whole signal; every downstream stage
        // sees the emphasized samples
        let signal: Vec<Sample> = match self.config.preemphasis {
            Some(coeff) => pre_emphasis(&wave.samples, coeff)?,
            None => wave.samples.clone(),
        };

        // Energy and VAD come from unwindowed frames of the same layout
        // the STFT uses, keeping all streams index-aligned
        let mut energy = None;
        let mut vad = None;
        if selection.needs_energy() {
            let log_e = log_frame_energy(&signal, n_fft, hop_length, self.config.center)?;
            if selection.vad {
                vad = Some(vad_energy(&log_e, &self.config.vad));
            }
            if selection.energy {
                energy = Some(Array1::from(log_e).insert_axis(Axis(0)));
            }
        }

        let mut spec = None;
        let mut mspec = None;
        let mut ceps = None;
        let mut pitch = None;
        if selection.needs_stft() {
            let plan = StftPlan::new(n_fft, hop_length, &WindowSpec::Named(self.config.window))?;
            let opts = StftOptions {
                center: self.config.center,
                ..Default::default()
            };
            let transform = plan.forward(&signal, &opts)?;
            let magnitude = power_spectrogram(&transform.matrix, 1.0);

            if selection.pitch {
                let track = pitch_track(
                    &magnitude,
                    sample_rate,
                    n_fft,
                    fmin,
                    fmax,
                    self.config.pitch_threshold,
                )?;
                pitch = Some(track.insert_axis(Axis(0)));
            }

            let power = magnitude.mapv(|m| m * m);
            if selection.spec {
                spec = Some(db_scale(
                    &power,
                    1.0,
                    spectrum::DEFAULT_AMIN,
                    Some(spectrum::DEFAULT_TOP_DB),
                )?);
            }
            if selection.mspec || selection.mfcc {
                let bank = cache::global().mel_filterbank(
                    sample_rate,
                    n_fft,
                    self.config.n_mels,
                    fmin,
                    fmax,
                    self.config.htk_mel,
                )?;
                let mel_power = bank.apply(&power)?;
                let log_mel = db_scale(
                    &mel_power,
                    1.0,
                    spectrum::DEFAULT_AMIN,
                    Some(spectrum::DEFAULT_TOP_DB),
                )?;
                if selection.mfcc {
                    ceps = Some(mfcc(&log_mel, self.config.n_ceps, self.config.keep_mfcc_dc)?);
                }
                if selection.mspec {
                    mspec = Some(log_mel);
                }
            }
        }

        if self.config.delta_order > 0 {
            for stream in [&mut spec, &mut mspec, &mut ceps, &mut pitch, &mut energy] {
                if let Some(base) = stream.take() {
                    *stream = Some(append_deltas(base, self.config.delta_order)?);
                }
            }
        }

        Ok(FeatureSet {
            spec: spec.map(to_output),
            mspec: mspec.map(to_output),
            mfcc: ceps.map(to_output),
            pitch: pitch.map(to_output),
            energy: energy.map(to_output),
            vad,
            sample_rate,
            hop_length,
        })
    }
}

/// Concatenate a stream with its delta orders along the feature axis
fn append_deltas(base: Array2<Sample>, order: usize) -> SfResult<Array2<Sample>> {
    let deltas = delta(&base, DELTA_WIDTH, order, true)?;
    let mut parts = vec![base.view()];
    parts.extend(deltas.iter().map(|d| d.view()));
    concatenate(Axis(0), &parts)
        .map_err(|e| SfError::invalid(format!("delta concatenation failed: {e}")))
}

/// Internal `[feature_dim, num_frames]` to public `[num_frames, feature_dim]`
fn to_output(matrix: Array2<Sample>) -> Array2<Sample> {
    matrix.t().to_owned()
}
