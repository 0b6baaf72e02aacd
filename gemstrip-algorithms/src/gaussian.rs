//! Gaussian strip-profile fit for sub-strip cluster positions.
#![allow(clippy::cast_precision_loss)]

use crate::levmar::{self, Params, ShapeModel};
use gemstrip_core::{charge_weighted_centroid, FitConfig, PeakFitter};

/// Lower bound on the starting width, in strips.
const MIN_START_SIGMA: f64 = 0.4;

/// `A * exp(-0.5 * ((x - mu) / sigma)^2)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GaussianShape;

impl ShapeModel for GaussianShape {
    fn value(&self, x: f64, p: &Params) -> f64 {
        let z = (x - p[1]) / p[2];
        p[0] * (-0.5 * z * z).exp()
    }

    fn gradient(&self, x: f64, p: &Params) -> Params {
        let [amplitude, mu, sigma] = *p;
        let d = x - mu;
        let e = (-0.5 * d * d / (sigma * sigma)).exp();
        [
            e,
            amplitude * e * d / (sigma * sigma),
            amplitude * e * d * d / (sigma * sigma * sigma),
        ]
    }

    fn is_valid(&self, p: &Params) -> bool {
        p.iter().all(|v| v.is_finite()) && p[0] > 0.0 && p[2].abs() > 1e-6
    }
}

/// Fits a Gaussian to `(strip, amplitude)` samples and returns its mean.
#[derive(Debug, Clone, Default)]
pub struct GaussianFitter {
    config: FitConfig,
}

impl GaussianFitter {
    /// Creates a fitter with the given solver settings.
    #[must_use]
    pub fn new(config: FitConfig) -> Self {
        Self { config }
    }

    /// Solver settings.
    #[must_use]
    pub fn config(&self) -> &FitConfig {
        &self.config
    }

    fn initial_guess(samples: &[(f64, f64)]) -> Option<Params> {
        let amplitude = samples.iter().map(|&(_, y)| y).fold(f64::MIN, f64::max);
        if amplitude <= 0.0 {
            return None;
        }
        let mean = charge_weighted_centroid(samples)?;

        let mut var = 0.0;
        let mut weight = 0.0;
        for &(x, y) in samples {
            let w = y.max(0.0);
            var += w * (x - mean) * (x - mean);
            weight += w;
        }
        let sigma = if weight > 0.0 {
            (var / weight).sqrt().max(MIN_START_SIGMA)
        } else {
            MIN_START_SIGMA
        };

        Some([amplitude, mean, sigma])
    }
}

impl PeakFitter for GaussianFitter {
    fn name(&self) -> &'static str {
        "gaussian"
    }

    fn fit_peak(&self, samples: &[(f64, f64)]) -> Option<f64> {
        if samples.len() < self.config.min_samples {
            return None;
        }
        let initial = Self::initial_guess(samples)?;
        let result = levmar::fit(&GaussianShape, samples, initial, &self.config)?;
        result.params[1].is_finite().then_some(result.params[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sampled(
        amplitude: f64,
        mu: f64,
        sigma: f64,
        strips: std::ops::Range<i32>,
    ) -> Vec<(f64, f64)> {
        strips
            .map(|s| {
                let x = f64::from(s);
                (x, GaussianShape.value(x, &[amplitude, mu, sigma]))
            })
            .collect()
    }

    #[test]
    fn test_recovers_exact_mean() {
        let samples = sampled(200.0, 12.3, 0.9, 10..16);
        let mean = GaussianFitter::default().fit_peak(&samples).unwrap();
        assert_abs_diff_eq!(mean, 12.3, epsilon = 1e-4);
    }

    #[test]
    fn test_symmetric_triplet() {
        let samples = [(4.0, 50.0), (5.0, 120.0), (6.0, 50.0)];
        let mean = GaussianFitter::default().fit_peak(&samples).unwrap();
        assert_abs_diff_eq!(mean, 5.0, epsilon = 1e-6);
    }

    #[test]
    fn test_below_min_samples() {
        let samples = [(4.0, 50.0), (5.0, 120.0)];
        assert!(GaussianFitter::default().fit_peak(&samples).is_none());
    }

    #[test]
    fn test_non_positive_amplitudes() {
        let samples = [(1.0, 0.0), (2.0, -3.0), (3.0, 0.0)];
        assert!(GaussianFitter::default().fit_peak(&samples).is_none());
    }

    #[test]
    fn test_gradient_matches_finite_difference() {
        let p = [100.0, 3.2, 1.1];
        let x = 4.0;
        let grad = GaussianShape.gradient(x, &p);
        let h = 1e-6;
        for i in 0..3 {
            let mut up = p;
            let mut down = p;
            up[i] += h;
            down[i] -= h;
            let numeric = (GaussianShape.value(x, &up) - GaussianShape.value(x, &down)) / (2.0 * h);
            assert_abs_diff_eq!(grad[i], numeric, epsilon = 1e-4);
        }
    }
}
