//! 1-D Diagonal Gaussian Mixture
//!
//! Fixed-iteration EM over scalar observations. Every numerical failure
//! mode surfaces as `DegenerateModel` so the caller can retry with a
//! smaller mixture order.

use sf_core::{Sample, SfError, SfResult};

/// Per-frame density totals below this are a degenerate fit
const DENSITY_FLOOR: Sample = f64::MIN_POSITIVE;

/// A component whose total responsibility drops below this has collapsed
const RESPONSIBILITY_FLOOR: Sample = 1e-10;

/// Scalar Gaussian mixture: parallel means, variances, and weights
#[derive(Debug, Clone)]
pub(crate) struct GaussianMixture {
    pub means: Vec<Sample>,
    pub variances: Vec<Sample>,
    pub weights: Vec<Sample>,
}

impl GaussianMixture {
    /// Means evenly spaced in `[-2, 2]`, unit variances, equal weights
    fn init(components: usize) -> Self {
        let k = components.max(2);
        let means = (0..k)
            .map(|i| -2.0 + 4.0 * i as Sample / (k - 1) as Sample)
            .collect();
        Self {
            means,
            variances: vec![1.0; k],
            weights: vec![1.0 / k as Sample; k],
        }
    }

    #[inline]
    fn density(x: Sample, mean: Sample, variance: Sample) -> Sample {
        let diff = x - mean;
        (-0.5 * diff * diff / variance).exp()
            / (2.0 * std::f64::consts::PI * variance).sqrt()
    }

    /// Fit `components` Gaussians to `data` with a fixed number of EM
    /// sweeps; no convergence-based early stop.
    pub fn fit(
        data: &[Sample],
        components: usize,
        iterations: usize,
        flooring: Sample,
        ceiling: Sample,
    ) -> SfResult<Self> {
        let n = data.len();
        let k = components.max(2);
        if n < k {
            return Err(SfError::DegenerateModel(format!(
                "{n} frames cannot support {k} components"
            )));
        }
        let mut gmm = Self::init(k);

        let mut densities = vec![0.0; k];
        for _ in 0..iterations {
            let mut totals = vec![0.0; k];
            let mut weighted_sum = vec![0.0; k];
            let mut weighted_sq = vec![0.0; k];

            // E-step: accumulate responsibility-weighted moments
            for &x in data {
                let mut frame_total = 0.0;
                for j in 0..k {
                    let d = gmm.weights[j] * Self::density(x, gmm.means[j], gmm.variances[j]);
                    densities[j] = d;
                    frame_total += d;
                }
                if frame_total < DENSITY_FLOOR {
                    return Err(SfError::DegenerateModel(format!(
                        "zero total density at observation {x}"
                    )));
                }
                for j in 0..k {
                    let resp = densities[j] / frame_total;
                    totals[j] += resp;
                    weighted_sum[j] += resp * x;
                    weighted_sq[j] += resp * x * x;
                }
            }

            // M-step: re-estimate weight, mean, clamped variance
            for j in 0..k {
                if totals[j] < RESPONSIBILITY_FLOOR {
                    return Err(SfError::DegenerateModel(format!(
                        "component {j} collapsed to zero responsibility"
                    )));
                }
                let weight = totals[j] / n as Sample;
                let mean = weighted_sum[j] / totals[j];
                let variance =
                    (weighted_sq[j] / totals[j] - mean * mean).clamp(flooring, ceiling);
                if !(weight.is_finite() && mean.is_finite() && variance.is_finite()) {
                    return Err(SfError::DegenerateModel(format!(
                        "non-finite parameters for component {j}"
                    )));
                }
                gmm.weights[j] = weight;
                gmm.means[j] = mean;
                gmm.variances[j] = variance;
            }
        }
        Ok(gmm)
    }

    /// Mean and variance of the highest-mean component
    pub fn dominant(&self) -> (Sample, Sample) {
        let mut best = 0;
        for j in 1..self.means.len() {
            if self.means[j] > self.means[best] {
                best = j;
            }
        }
        (self.means[best], self.variances[best])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn bimodal(n: usize) -> Vec<Sample> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};
        (0..n)
            .map(|i| {
                let mut hasher = DefaultHasher::new();
                i.hash(&mut hasher);
                let jitter = (hasher.finish() as Sample / u64::MAX as Sample) * 0.2 - 0.1;
                if i % 2 == 0 { -1.5 + jitter } else { 1.5 + jitter }
            })
            .collect()
    }

    #[test]
    fn test_fit_separates_modes() {
        let data = bimodal(400);
        let gmm = GaussianMixture::fit(&data, 2, 8, 1e-4, 1.0).unwrap();
        let (high_mean, high_var) = gmm.dominant();
        assert_abs_diff_eq!(high_mean, 1.5, epsilon = 0.2);
        assert!(high_var < 0.1);
        let low = gmm.means.iter().cloned().fold(Sample::INFINITY, Sample::min);
        assert_abs_diff_eq!(low, -1.5, epsilon = 0.2);
    }

    #[test]
    fn test_weights_sum_to_one() {
        let data = bimodal(200);
        let gmm = GaussianMixture::fit(&data, 3, 8, 1e-4, 1.0).unwrap();
        let total: Sample = gmm.weights.iter().sum();
        assert_abs_diff_eq!(total, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_variance_respects_floor_and_ceiling() {
        let data = bimodal(200);
        let gmm = GaussianMixture::fit(&data, 2, 16, 1e-4, 1.0).unwrap();
        for &v in &gmm.variances {
            assert!((1e-4..=1.0).contains(&v));
        }
    }

    #[test]
    fn test_too_few_frames_is_degenerate() {
        assert!(matches!(
            GaussianMixture::fit(&[0.1, 0.2], 3, 8, 1e-4, 1.0),
            Err(SfError::DegenerateModel(_))
        ));
    }

    #[test]
    fn test_far_outlier_data_is_degenerate() {
        // All mass far outside the initialization range underflows every
        // component's density
        let data = vec![1e6; 50];
        assert!(GaussianMixture::fit(&data, 2, 8, 1e-4, 1.0).is_err());
    }
}
