//! Mel-Scale Filterbank and DCT Basis
//!
//! Triangular mel filters over real-FFT bins plus the orthonormal DCT
//! basis used for cepstral analysis. The default mel mapping is the
//! Slaney form (linear below 1 kHz, logarithmic above); the HTK form is
//! available behind a flag.

use ndarray::Array2;

use sf_core::{Sample, SfError, SfResult};

// ============ Scale Conversion ============

// Slaney mel: linear region slope and the 1 kHz log-region break point
const F_SP: Sample = 200.0 / 3.0;
const MIN_LOG_HZ: Sample = 1000.0;
const MIN_LOG_MEL: Sample = MIN_LOG_HZ / F_SP;

fn log_step() -> Sample {
    6.4_f64.ln() / 27.0
}

/// Convert Hz to mel
pub fn hz_to_mel(hz: Sample, htk: bool) -> Sample {
    if htk {
        return 2595.0 * (1.0 + hz / 700.0).log10();
    }
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

/// Convert mel to Hz
pub fn mel_to_hz(mel: Sample, htk: bool) -> Sample {
    if htk {
        return 700.0 * (10.0_f64.powf(mel / 2595.0) - 1.0);
    }
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        mel * F_SP
    }
}

/// `n` center frequencies evenly spaced on the mel scale over `[fmin, fmax]`
pub fn mel_frequencies(n: usize, fmin: Sample, fmax: Sample, htk: bool) -> Vec<Sample> {
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![mel_to_hz(hz_to_mel(fmin, htk), htk)];
    }
    let min_mel = hz_to_mel(fmin, htk);
    let max_mel = hz_to_mel(fmax, htk);
    let step = (max_mel - min_mel) / (n - 1) as Sample;
    (0..n)
        .map(|i| mel_to_hz(min_mel + step * i as Sample, htk))
        .collect()
}

// ============ Mel Filterbank ============

/// Triangular mel filterbank over real-FFT bins
///
/// `weights` has shape `[n_mels, 1 + n_fft/2]`; applying it to a power
/// spectrogram is a single matrix product.
pub struct MelFilterbank {
    pub weights: Array2<Sample>,
    /// Filters whose passband covers no FFT bin (under-resolved FFT)
    pub empty_filters: usize,
    sample_rate: u32,
    n_fft: usize,
}

impl MelFilterbank {
    pub fn new(
        sample_rate: u32,
        n_fft: usize,
        n_mels: usize,
        fmin: Sample,
        fmax: Sample,
        htk: bool,
    ) -> SfResult<Self> {
        if sample_rate == 0 {
            return Err(SfError::invalid("sample_rate must be positive"));
        }
        if n_fft == 0 || n_fft % 2 != 0 {
            return Err(SfError::invalid(format!("n_fft must be positive and even, got {n_fft}")));
        }
        if n_mels == 0 {
            return Err(SfError::invalid("n_mels must be positive"));
        }
        let nyquist = sample_rate as Sample / 2.0;
        if fmin < 0.0 || fmax <= fmin || fmax > nyquist {
            return Err(SfError::invalid(format!(
                "mel band [{fmin}, {fmax}] must satisfy 0 <= fmin < fmax <= {nyquist}"
            )));
        }

        let n_bins = 1 + n_fft / 2;
        let bin_hz = sample_rate as Sample / n_fft as Sample;
        // n_mels + 2 band edges; filter i spans edges [i, i+2]
        let edges = mel_frequencies(n_mels + 2, fmin, fmax, htk);

        let mut weights = Array2::zeros((n_mels, n_bins));
        for i in 0..n_mels {
            let (lo, center, hi) = (edges[i], edges[i + 1], edges[i + 2]);
            // Constant energy response per filter
            let enorm = 2.0 / (hi - lo);
            for k in 0..n_bins {
                let freq = k as Sample * bin_hz;
                let lower = (freq - lo) / (center - lo);
                let upper = (hi - freq) / (hi - center);
                weights[[i, k]] = lower.min(upper).max(0.0) * enorm;
            }
        }

        // A filter anchored at 0 Hz may legitimately have an empty first
        // triangle; anything else signals an under-resolved FFT.
        let empty_filters = (0..n_mels)
            .filter(|&i| {
                edges[i] != 0.0 && weights.row(i).iter().all(|&w| w <= 0.0)
            })
            .count();
        if empty_filters > 0 {
            log::warn!(
                "{empty_filters} empty mel filter(s) for n_fft={n_fft}, n_mels={n_mels}: \
                 increase n_fft or reduce n_mels"
            );
        }

        Ok(Self {
            weights,
            empty_filters,
            sample_rate,
            n_fft,
        })
    }

    /// Apply the filterbank: `[n_mels, bins] x [bins, frames]`
    pub fn apply(&self, power: &Array2<Sample>) -> SfResult<Array2<Sample>> {
        if power.nrows() != self.n_bins() {
            return Err(SfError::invalid(format!(
                "spectrogram has {} bins, filterbank expects {}",
                power.nrows(),
                self.n_bins()
            )));
        }
        Ok(self.weights.dot(power))
    }

    #[inline]
    pub fn n_mels(&self) -> usize {
        self.weights.nrows()
    }

    #[inline]
    pub fn n_bins(&self) -> usize {
        self.weights.ncols()
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[inline]
    pub fn n_fft(&self) -> usize {
        self.n_fft
    }
}

// ============ DCT Basis ============

/// Orthonormal DCT basis, shape `[n_filters, n_input]`
///
/// Row 0 is the constant `1/sqrt(n_input)`; row `i` samples
/// `cos(i * (2k+1)π / (2 n_input)) * sqrt(2/n_input)`.
pub fn dct_basis(n_filters: usize, n_input: usize) -> SfResult<Array2<Sample>> {
    if n_filters == 0 || n_input == 0 {
        return Err(SfError::invalid(
            "dct basis requires positive filter and input counts",
        ));
    }
    let mut basis = Array2::zeros((n_filters, n_input));
    let dc = 1.0 / (n_input as Sample).sqrt();
    for k in 0..n_input {
        basis[[0, k]] = dc;
    }
    let scale = (2.0 / n_input as Sample).sqrt();
    for i in 1..n_filters {
        for k in 0..n_input {
            let angle = i as Sample * (2 * k + 1) as Sample * std::f64::consts::PI
                / (2.0 * n_input as Sample);
            basis[[i, k]] = angle.cos() * scale;
        }
    }
    Ok(basis)
}
