//! Spectral Feature Derivation
//!
//! Magnitude/power spectrograms, dB conversion with dynamic-range
//! clipping, and cepstral analysis on top of the log-mel matrix.

use ndarray::{s, Array2};
use rustfft::num_complex::Complex;

use sf_core::{Sample, SfError, SfResult};

use crate::cache;

/// Default magnitude floor before the log
pub const DEFAULT_AMIN: Sample = 1e-10;

/// Default dynamic-range clip in dB
pub const DEFAULT_TOP_DB: Sample = 80.0;

/// `|S|^power` of a complex spectral matrix.
///
/// `power` 1.0 gives the magnitude spectrogram, 2.0 the power spectrogram.
pub fn power_spectrogram(spectral: &Array2<Complex<Sample>>, power: Sample) -> Array2<Sample> {
    if power == 2.0 {
        spectral.mapv(|c| c.norm_sqr())
    } else if power == 1.0 {
        spectral.mapv(|c| c.norm())
    } else {
        spectral.mapv(|c| c.norm().powf(power))
    }
}

/// Convert a magnitude or power matrix to decibels.
///
/// `10*log10(max(amin, x)) - 10*log10(max(amin, |ref|))`, then clipped to
/// `[max - top_db, max]` when `top_db` is given.
pub fn db_scale(
    matrix: &Array2<Sample>,
    ref_value: Sample,
    amin: Sample,
    top_db: Option<Sample>,
) -> SfResult<Array2<Sample>> {
    if amin <= 0.0 {
        return Err(SfError::invalid(format!("amin must be positive, got {amin}")));
    }
    if let Some(td) = top_db {
        if td < 0.0 {
            return Err(SfError::invalid(format!(
                "top_db must be non-negative, got {td}"
            )));
        }
    }
    let ref_db = 10.0 * ref_value.abs().max(amin).log10();
    let mut out = matrix.mapv(|x| 10.0 * x.max(amin).log10() - ref_db);
    if let Some(td) = top_db {
        let max = out.fold(Sample::NEG_INFINITY, |acc, &x| acc.max(x));
        let floor = max - td;
        out.mapv_inplace(|x| x.max(floor));
    }
    Ok(out)
}

/// Cepstral coefficients from a log-mel matrix.
///
/// Applies a `(n_ceps + 1) x n_mels` DCT basis and drops the DC row unless
/// `keep_dc`, yielding `n_ceps` (or `n_ceps + 1`) rows.
pub fn mfcc(log_mel: &Array2<Sample>, n_ceps: usize, keep_dc: bool) -> SfResult<Array2<Sample>> {
    let n_mels = log_mel.nrows();
    if n_ceps == 0 {
        return Err(SfError::invalid("n_ceps must be positive"));
    }
    if n_ceps + 1 > n_mels {
        return Err(SfError::invalid(format!(
            "n_ceps + 1 = {} exceeds the {n_mels} mel channels",
            n_ceps + 1
        )));
    }
    let basis = cache::global().dct_basis(n_ceps + 1, n_mels)?;
    let full = basis.dot(log_mel);
    if keep_dc {
        Ok(full)
    } else {
        Ok(full.slice(s![1.., ..]).to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn test_matrix() -> Array2<Sample> {
        let mut m = Array2::zeros((4, 3));
        for ((i, j), v) in m.indexed_iter_mut() {
            *v = ((i + 1) * (j + 1)) as Sample * 1e-3;
        }
        m[[0, 0]] = 2.0;
        m
    }

    #[test]
    fn test_power_vs_magnitude() {
        let mut s = Array2::zeros((3, 2));
        s[[1, 0]] = Complex::new(3.0, 4.0);
        let mag = power_spectrogram(&s, 1.0);
        let pow = power_spectrogram(&s, 2.0);
        assert_relative_eq!(mag[[1, 0]], 5.0, epsilon = 1e-12);
        assert_relative_eq!(pow[[1, 0]], 25.0, epsilon = 1e-12);
        let cubed = power_spectrogram(&s, 3.0);
        assert_relative_eq!(cubed[[1, 0]], 125.0, epsilon = 1e-9);
    }

    #[test]
    fn test_db_max_formula() {
        let m = test_matrix();
        let out = db_scale(&m, 1.0, 1e-10, None).unwrap();
        let max_in = m.fold(Sample::NEG_INFINITY, |a, &x| a.max(x));
        let max_out = out.fold(Sample::NEG_INFINITY, |a, &x| a.max(x));
        assert_relative_eq!(max_out, 10.0 * max_in.log10(), epsilon = 1e-12);
    }

    #[test]
    fn test_db_clipping_bounds_range() {
        let m = test_matrix();
        let out = db_scale(&m, 1.0, 1e-10, Some(80.0)).unwrap();
        let max = out.fold(Sample::NEG_INFINITY, |a, &x| a.max(x));
        let min = out.fold(Sample::INFINITY, |a, &x| a.min(x));
        assert!(max - min <= 80.0 + 1e-9);
        // Unclipped, the zero-free matrix spans far more than 80 dB from
        // the amin floor
        let wide = db_scale(&Array2::from_elem((1, 2), 0.0), 1.0, 1e-10, None).unwrap();
        assert_relative_eq!(wide[[0, 0]], -100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_db_rejects_bad_parameters() {
        let m = test_matrix();
        assert!(matches!(
            db_scale(&m, 1.0, 0.0, None),
            Err(SfError::InvalidParameter(_))
        ));
        assert!(matches!(
            db_scale(&m, 1.0, -1.0, None),
            Err(SfError::InvalidParameter(_))
        ));
        assert!(matches!(
            db_scale(&m, 1.0, 1e-10, Some(-5.0)),
            Err(SfError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_mfcc_shape_and_dc() {
        let log_mel = Array2::from_elem((40, 7), 3.5);
        let ceps = mfcc(&log_mel, 13, false).unwrap();
        assert_eq!(ceps.shape(), &[13, 7]);
        // A constant log-mel vector has all its energy in the DC term
        for &c in ceps.iter() {
            assert_relative_eq!(c, 0.0, epsilon = 1e-9);
        }
        let with_dc = mfcc(&log_mel, 13, true).unwrap();
        assert_eq!(with_dc.shape(), &[14, 7]);
        assert!(with_dc[[0, 0]].abs() > 1.0);
    }

    #[test]
    fn test_mfcc_rejects_too_many_ceps() {
        let log_mel = Array2::zeros((10, 4));
        assert!(mfcc(&log_mel, 10, false).is_err());
        assert!(mfcc(&log_mel, 0, false).is_err());
        assert!(mfcc(&log_mel, 9, false).is_ok());
    }
}
