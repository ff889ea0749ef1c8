//! Pitch Tracking
//!
//! Per-frame dominant-frequency estimate from a magnitude spectrogram:
//! band-limited spectral peak picking with parabolic bin refinement.

use ndarray::{Array1, Array2};

use sf_core::{Sample, SfError, SfResult};

/// Per-frame dominant frequency in Hz, restricted to `[fmin, fmax]`.
///
/// A bin qualifies when it is a local maximum and its magnitude exceeds
/// `threshold` times the frame's peak magnitude; the strongest qualifying
/// bin is refined by parabolic interpolation. Frames with no qualifying
/// bin yield 0.0.
pub fn pitch_track(
    magnitude: &Array2<Sample>,
    sample_rate: u32,
    n_fft: usize,
    fmin: Sample,
    fmax: Sample,
    threshold: Sample,
) -> SfResult<Array1<Sample>> {
    if sample_rate == 0 {
        return Err(SfError::invalid("sample_rate must be positive"));
    }
    if n_fft == 0 || n_fft % 2 != 0 {
        return Err(SfError::invalid(format!(
            "n_fft must be positive and even, got {n_fft}"
        )));
    }
    if !(0.0..=1.0).contains(&threshold) {
        return Err(SfError::invalid(format!(
            "pitch threshold must be in [0, 1], got {threshold}"
        )));
    }
    let nyquist = sample_rate as Sample / 2.0;
    if fmin < 0.0 || fmax <= fmin || fmax > nyquist {
        return Err(SfError::invalid(format!(
            "pitch band [{fmin}, {fmax}] must satisfy 0 <= fmin < fmax <= {nyquist}"
        )));
    }
    let n_bins = 1 + n_fft / 2;
    if magnitude.nrows() != n_bins {
        return Err(SfError::invalid(format!(
            "magnitude has {} bins, expected {n_bins} for n_fft={n_fft}",
            magnitude.nrows()
        )));
    }

    let bin_hz = sample_rate as Sample / n_fft as Sample;
    // Local-maximum tests need both neighbors, so DC and Nyquist are out
    let lo = ((fmin / bin_hz).ceil() as usize).max(1);
    let hi = ((fmax / bin_hz).floor() as usize).min(n_bins - 2);

    let mut track = Array1::zeros(magnitude.ncols());
    for (j, col) in magnitude.columns().into_iter().enumerate() {
        let frame_max = col.iter().fold(0.0 as Sample, |acc, &m| acc.max(m));
        if frame_max <= 0.0 || lo > hi {
            continue;
        }
        let gate = threshold * frame_max;
        let mut best: Option<(usize, Sample)> = None;
        for k in lo..=hi {
            let m = col[k];
            if m > col[k - 1] && m >= col[k + 1] && m > gate {
                if best.is_none_or(|(_, bm)| m > bm) {
                    best = Some((k, m));
                }
            }
        }
        if let Some((k, _)) = best {
            let (a, b, c) = (col[k - 1], col[k], col[k + 1]);
            let denom = a - 2.0 * b + c;
            let shift = if denom.abs() > Sample::EPSILON {
                (0.5 * (a - c) / denom).clamp(-0.5, 0.5)
            } else {
                0.0
            };
            track[j] = (k as Sample + shift) * bin_hz;
        }
    }
    Ok(track)
}
