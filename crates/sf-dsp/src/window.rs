//! Analysis Windows
//!
//! Periodic (DFT-even) and symmetric window generation, plus the tagged
//! window argument accepted by the spectral transforms.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use sf_core::{Sample, SfError, SfResult};

// ============ Window Kinds ============

/// Named analysis windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowKind {
    Hann,
    Hamming,
    Blackman,
    Rectangular,
}

impl WindowKind {
    /// Parse a window name as it appears in configuration files
    pub fn from_name(name: &str) -> SfResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "hann" | "hanning" => Ok(Self::Hann),
            "hamming" => Ok(Self::Hamming),
            "blackman" => Ok(Self::Blackman),
            "rectangular" | "boxcar" | "ones" => Ok(Self::Rectangular),
            other => Err(SfError::UnsupportedConfiguration(format!(
                "unknown window '{other}'"
            ))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Hann => "hann",
            Self::Hamming => "hamming",
            Self::Blackman => "blackman",
            Self::Rectangular => "rectangular",
        }
    }

    /// Generate the window.
    ///
    /// `periodic` produces the DFT-even form used for spectral analysis
    /// (denominator `len`); the symmetric form (denominator `len - 1`) is
    /// what filter design expects.
    pub fn generate(self, len: usize, periodic: bool) -> Vec<Sample> {
        if len == 0 {
            return Vec::new();
        }
        if len == 1 {
            return vec![1.0];
        }
        let denom = if periodic { len } else { len - 1 } as Sample;
        (0..len)
            .map(|i| {
                let phase = 2.0 * PI * i as Sample / denom;
                match self {
                    Self::Hann => 0.5 - 0.5 * phase.cos(),
                    Self::Hamming => 0.54 - 0.46 * phase.cos(),
                    Self::Blackman => 0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos(),
                    Self::Rectangular => 1.0,
                }
            })
            .collect()
    }
}

impl Default for WindowKind {
    fn default() -> Self {
        Self::Hann
    }
}

// ============ Window Argument ============

/// Window argument accepted by the spectral transforms.
///
/// Resolved once into a concrete vector at the start of a call, so the
/// downstream code never inspects the variant again.
#[derive(Debug, Clone)]
pub enum WindowSpec {
    /// A named window, generated in periodic form
    Named(WindowKind),
    /// A generator function returning a window of the requested length
    Callable(fn(usize) -> Vec<Sample>),
    /// An explicit window vector; its length must match the FFT size
    Explicit(Vec<Sample>),
}

impl WindowSpec {
    /// Resolve into a concrete window of length `len`
    pub fn resolve(&self, len: usize) -> SfResult<Vec<Sample>> {
        match self {
            Self::Named(kind) => Ok(kind.generate(len, true)),
            Self::Callable(f) => {
                let win = f(len);
                if win.len() != len {
                    return Err(SfError::invalid(format!(
                        "window callable returned {} samples, expected {len}",
                        win.len()
                    )));
                }
                Ok(win)
            }
            Self::Explicit(win) => {
                if win.len() != len {
                    return Err(SfError::invalid(format!(
                        "explicit window has {} samples, expected {len}",
                        win.len()
                    )));
                }
                Ok(win.clone())
            }
        }
    }
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self::Named(WindowKind::Hann)
    }
}

impl From<WindowKind> for WindowSpec {
    fn from(kind: WindowKind) -> Self {
        Self::Named(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_hann_periodic_endpoints() {
        let w = WindowKind::Hann.generate(8, true);
        assert_eq!(w.len(), 8);
        // Periodic form starts at zero but does not end at zero
        assert_relative_eq!(w[0], 0.0, epsilon = 1e-12);
        assert!(w[7] > 0.0);
    }

    #[test]
    fn test_hann_symmetric_endpoints() {
        let w = WindowKind::Hann.generate(9, false);
        assert_relative_eq!(w[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(w[8], 0.0, epsilon = 1e-12);
        assert_relative_eq!(w[4], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_hamming_endpoint() {
        let w = WindowKind::Hamming.generate(16, false);
        assert_relative_eq!(w[0], 0.08, epsilon = 1e-12);
        assert_relative_eq!(w[15], 0.08, epsilon = 1e-12);
    }

    #[test]
    fn test_rectangular_is_flat() {
        let w = WindowKind::Rectangular.generate(5, true);
        assert!(w.iter().all(|&x| x == 1.0));
    }

    #[test]
    fn test_degenerate_lengths() {
        assert!(WindowKind::Hann.generate(0, true).is_empty());
        assert_eq!(WindowKind::Blackman.generate(1, false), vec![1.0]);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(WindowKind::from_name("Hanning").unwrap(), WindowKind::Hann);
        assert_eq!(WindowKind::from_name("boxcar").unwrap(), WindowKind::Rectangular);
        assert!(matches!(
            WindowKind::from_name("kaiser"),
            Err(SfError::UnsupportedConfiguration(_))
        ));
    }

    #[test]
    fn test_explicit_length_mismatch() {
        let spec = WindowSpec::Explicit(vec![1.0; 4]);
        assert!(matches!(spec.resolve(8), Err(SfError::InvalidParameter(_))));
        assert_eq!(spec.resolve(4).unwrap(), vec![1.0; 4]);
    }

    #[test]
    fn test_callable_resolution() {
        let spec = WindowSpec::Callable(|n| vec![0.5; n]);
        assert_eq!(spec.resolve(3).unwrap(), vec![0.5; 3]);
    }
}
