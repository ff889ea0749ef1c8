//! Short-Time Fourier Transform
//!
//! Forward transform producing a complex time-frequency matrix, inverse
//! transform reconstructing a waveform by windowed overlap-add. The forward
//! output is conjugated and the inverse undoes it; the pair is internally
//! consistent but promises nothing about any other library's sign
//! convention.

use std::borrow::Cow;
use std::sync::Arc;

use ndarray::Array2;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex;

use sf_core::{Sample, SfError, SfResult};

use crate::cache;
use crate::frame::{self, EdgePolicy};
use crate::window::WindowSpec;

// ============ Constants ============

/// Upper bound on one block of complex output in the forward pass (256 KiB)
const MAX_MEM_BLOCK: usize = (1 << 8) * (1 << 10);

/// Positions whose accumulated squared window stays at or below this floor
/// are not normalized during overlap-add
const WINDOW_SUM_FLOOR: Sample = f32::MIN_POSITIVE as Sample;

/// Replacement for exactly-zero frame energy, so silence stays finite
/// after the log
const ENERGY_FLOOR: Sample = f32::EPSILON as Sample;

// ============ Pre-emphasis ============

/// First-order emphasis filter: `y[0] = x[0]`, `y[t] = x[t] - coeff*x[t-1]`
///
/// `coeff` must lie strictly inside `(0, 1)`.
pub fn pre_emphasis(signal: &[Sample], coeff: Sample) -> SfResult<Vec<Sample>> {
    if !(coeff > 0.0 && coeff < 1.0) {
        return Err(SfError::invalid(format!(
            "pre-emphasis coefficient must be in (0, 1), got {coeff}"
        )));
    }
    let mut out = Vec::with_capacity(signal.len());
    if let Some(&first) = signal.first() {
        out.push(first);
        out.extend(
            signal
                .windows(2)
                .map(|pair| pair[1] - coeff * pair[0]),
        );
    }
    Ok(out)
}

/// Reflect-pad by `pad` samples on both ends, without repeating the edges
fn reflect_pad(signal: &[Sample], pad: usize) -> SfResult<Vec<Sample>> {
    let len = signal.len();
    if len < pad + 1 {
        return Err(SfError::InsufficientData {
            needed: pad + 1,
            got: len,
        });
    }
    let mut out = Vec::with_capacity(len + 2 * pad);
    for i in (1..=pad).rev() {
        out.push(signal[i]);
    }
    out.extend_from_slice(signal);
    for i in 1..=pad {
        out.push(signal[len - 1 - i]);
    }
    Ok(out)
}

// ============ Frame Energy ============

/// Per-frame log-energy of unwindowed frames.
///
/// Sums squared samples per frame, replaces exact zeros with a small floor,
/// and takes the natural log. Frame layout matches the forward transform
/// for the same `n_fft`, `hop_length`, and `center`, so the result is
/// index-aligned with the spectral matrix.
pub fn log_frame_energy(
    signal: &[Sample],
    n_fft: usize,
    hop_length: usize,
    center: bool,
) -> SfResult<Vec<Sample>> {
    let padded;
    let signal = if center {
        padded = reflect_pad(signal, n_fft / 2)?;
        padded.as_slice()
    } else {
        signal
    };
    let energies = frame::frame_iter(signal, n_fft, hop_length)?
        .map(|frame| {
            let e: Sample = frame.iter().map(|&x| x * x).sum();
            if e == 0.0 { ENERGY_FLOOR.ln() } else { e.ln() }
        })
        .collect();
    Ok(energies)
}

// ============ Forward Transform ============

/// Per-call options for the forward transform
#[derive(Debug, Clone, Copy, Default)]
pub struct StftOptions {
    /// Center frame `t` on sample `t*hop_length` by reflect-padding
    pub center: bool,
    /// Pre-emphasis coefficient applied before framing
    pub preemphasis: Option<Sample>,
    /// Also compute per-frame log-energy of the unwindowed frames
    pub energy: bool,
}

/// Forward transform output
pub struct Stft {
    /// Complex spectra, shape `[1 + n_fft/2, num_frames]`
    pub matrix: Array2<Complex<Sample>>,
    /// Per-frame log-energy, present when requested
    pub log_energy: Option<Vec<Sample>>,
}

impl Stft {
    #[inline]
    pub fn n_bins(&self) -> usize {
        self.matrix.nrows()
    }

    #[inline]
    pub fn num_frames(&self) -> usize {
        self.matrix.ncols()
    }
}

/// Reusable transform plan: FFT plans plus the resolved analysis window
pub struct StftPlan {
    n_fft: usize,
    hop_length: usize,
    window: Vec<Sample>,
    forward: Arc<dyn RealToComplex<Sample>>,
    inverse: Arc<dyn ComplexToReal<Sample>>,
}

impl StftPlan {
    pub fn new(n_fft: usize, hop_length: usize, window: &WindowSpec) -> SfResult<Self> {
        if n_fft == 0 || n_fft % 2 != 0 {
            return Err(SfError::invalid(format!(
                "n_fft must be positive and even, got {n_fft}"
            )));
        }
        if hop_length == 0 || hop_length > n_fft {
            return Err(SfError::invalid(format!(
                "hop_length must be in 1..={n_fft}, got {hop_length}"
            )));
        }
        let window = match window {
            WindowSpec::Named(kind) => cache::global().window(*kind, n_fft, true).as_ref().clone(),
            other => other.resolve(n_fft)?,
        };
        let mut planner = RealFftPlanner::<Sample>::new();
        Ok(Self {
            n_fft,
            hop_length,
            window,
            forward: planner.plan_fft_forward(n_fft),
            inverse: planner.plan_fft_inverse(n_fft),
        })
    }

    #[inline]
    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    #[inline]
    pub fn hop_length(&self) -> usize {
        self.hop_length
    }

    #[inline]
    pub fn n_bins(&self) -> usize {
        1 + self.n_fft / 2
    }

    /// Forward transform of a whole signal
    pub fn forward(&self, signal: &[Sample], opts: &StftOptions) -> SfResult<Stft> {
        let signal: Cow<'_, [Sample]> = match opts.preemphasis {
            Some(coeff) => Cow::Owned(pre_emphasis(signal, coeff)?),
            None => Cow::Borrowed(signal),
        };
        let signal: Cow<'_, [Sample]> = if opts.center {
            Cow::Owned(reflect_pad(&signal, self.n_fft / 2)?)
        } else {
            signal
        };

        let frames = frame::segment(&signal, self.n_fft, self.hop_length, EdgePolicy::Cut, 0.0)?;
        let n_frames = frames.ncols();

        let log_energy = if opts.energy {
            let energies = frames
                .columns()
                .into_iter()
                .map(|col| {
                    let e: Sample = col.iter().map(|&x| x * x).sum();
                    if e == 0.0 { ENERGY_FLOOR.ln() } else { e.ln() }
                })
                .collect();
            Some(energies)
        } else {
            None
        };

        let n_bins = self.n_bins();
        let mut matrix = Array2::zeros((n_bins, n_frames));
        let bytes_per_column = n_bins * std::mem::size_of::<Complex<Sample>>();
        let block_columns = (MAX_MEM_BLOCK / bytes_per_column).max(1);

        let mut windowed = vec![0.0; self.n_fft];
        let mut spectrum = vec![Complex::default(); n_bins];
        for block_start in (0..n_frames).step_by(block_columns) {
            let block_end = (block_start + block_columns).min(n_frames);
            for j in block_start..block_end {
                for (dst, (&x, &w)) in windowed
                    .iter_mut()
                    .zip(frames.column(j).iter().zip(&self.window))
                {
                    *dst = x * w;
                }
                // Lengths are fixed by the plan
                self.forward.process(&mut windowed, &mut spectrum).ok();
                for (dst, &c) in matrix.column_mut(j).iter_mut().zip(&spectrum) {
                    *dst = c.conj();
                }
            }
        }

        Ok(Stft { matrix, log_energy })
    }

    /// Inverse transform by windowed overlap-add.
    ///
    /// Output length is `n_fft + hop_length*(num_frames - 1)`; with
    /// `center` the reflect padding is trimmed back off, shortening it by
    /// `n_fft`.
    pub fn inverse(
        &self,
        matrix: &Array2<Complex<Sample>>,
        center: bool,
    ) -> SfResult<Vec<Sample>> {
        if matrix.nrows() != self.n_bins() {
            return Err(SfError::invalid(format!(
                "spectral matrix has {} bins, plan expects {}",
                matrix.nrows(),
                self.n_bins()
            )));
        }
        let n_frames = matrix.ncols();
        if n_frames == 0 {
            return Err(SfError::invalid("spectral matrix has no frames"));
        }

        let expected_len = self.n_fft + self.hop_length * (n_frames - 1);
        let mut output = vec![0.0; expected_len];
        let mut window_sum = vec![0.0; expected_len];
        let window_square: Vec<Sample> = self.window.iter().map(|&w| w * w).collect();
        let scale = 1.0 / self.n_fft as Sample;

        let mut spectrum = vec![Complex::default(); self.n_bins()];
        let mut frame_buf = vec![0.0; self.n_fft];
        for j in 0..n_frames {
            for (dst, &c) in spectrum.iter_mut().zip(matrix.column(j).iter()) {
                *dst = c.conj();
            }
            // The c2r transform requires purely real DC and Nyquist bins
            spectrum[0].im = 0.0;
            if let Some(last) = spectrum.last_mut() {
                last.im = 0.0;
            }
            self.inverse.process(&mut spectrum, &mut frame_buf).ok();

            let offset = j * self.hop_length;
            for (i, (&y, (&w, &ws))) in frame_buf
                .iter()
                .zip(self.window.iter().zip(&window_square))
                .enumerate()
            {
                output[offset + i] += y * scale * w;
                window_sum[offset + i] += ws;
            }
        }

        for (y, &ws) in output.iter_mut().zip(&window_sum) {
            if ws > WINDOW_SUM_FLOOR {
                *y /= ws;
            }
        }

        if center {
            let half = self.n_fft / 2;
            if expected_len <= 2 * half {
                return Ok(Vec::new());
            }
            Ok(output[half..expected_len - half].to_vec())
        } else {
            Ok(output)
        }
    }
}

// ============ Free Functions ============

/// One-shot forward transform
pub fn stft(
    signal: &[Sample],
    n_fft: usize,
    hop_length: usize,
    window: &WindowSpec,
    opts: &StftOptions,
) -> SfResult<Stft> {
    StftPlan::new(n_fft, hop_length, window)?.forward(signal, opts)
}

/// One-shot inverse transform; `n_fft` is derived from the bin count
pub fn istft(
    matrix: &Array2<Complex<Sample>>,
    hop_length: usize,
    window: &WindowSpec,
    center: bool,
) -> SfResult<Vec<Sample>> {
    if matrix.nrows() < 2 {
        return Err(SfError::invalid(format!(
            "spectral matrix needs at least 2 bins, got {}",
            matrix.nrows()
        )));
    }
    let n_fft = 2 * (matrix.nrows() - 1);
    StftPlan::new(n_fft, hop_length, window)?.inverse(matrix, center)
}
