//! Landau pulse-shape fit for waveform peak timing.
//!
//! The Landau density has no closed form, so the fit uses the Moyal
//! approximation, which shares its asymmetric shape and long right tail:
//!
//! `f(t) = A * exp(-0.5 * (l + exp(-l)))` with `l = (t - m) / w`.
//!
//! The peak of `f` sits exactly at `m`, the most probable value.
#![allow(clippy::cast_precision_loss)]

use crate::levmar::{self, Params, ShapeModel};
use gemstrip_core::{FitConfig, PeakFitter};

/// Below this the `exp(-l)` term overflows and the shape is zero anyway.
const LAMBDA_FLOOR: f64 = -50.0;

/// Moyal approximation of the Landau shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoyalShape;

impl ShapeModel for MoyalShape {
    fn value(&self, t: f64, p: &Params) -> f64 {
        let l = (t - p[1]) / p[2];
        if l < LAMBDA_FLOOR {
            return 0.0;
        }
        p[0] * (-0.5 * (l + (-l).exp())).exp()
    }

    fn gradient(&self, t: f64, p: &Params) -> Params {
        let [amplitude, mpv, width] = *p;
        let l = (t - mpv) / width;
        if l < LAMBDA_FLOOR {
            return [0.0; 3];
        }
        let e = (-0.5 * (l + (-l).exp())).exp();
        let f = amplitude * e;
        let slope = 0.5 * (1.0 - (-l).exp()) / width;
        [e, f * slope, f * slope * l]
    }

    fn is_valid(&self, p: &Params) -> bool {
        p.iter().all(|v| v.is_finite()) && p[0] > 0.0 && p[2] > 1e-3
    }
}

/// Fits a Landau-like pulse to `(time bin, amplitude)` samples and returns
/// the most probable value.
///
/// Non-positive samples are ignored: the pulse baseline carries no timing
/// information and pulls the tail of the fit.
#[derive(Debug, Clone, Default)]
pub struct LandauFitter {
    config: FitConfig,
}

impl LandauFitter {
    /// Creates a fitter with the given solver settings.
    #[must_use]
    pub fn new(config: FitConfig) -> Self {
        Self { config }
    }

    /// Fits a raw waveform, one sample per time bin starting at bin 0.
    #[must_use]
    pub fn fit_waveform(&self, waveform: &[i16]) -> Option<f64> {
        let samples: Vec<(f64, f64)> = waveform
            .iter()
            .enumerate()
            .map(|(bin, &adc)| (bin as f64, f64::from(adc)))
            .collect();
        self.fit_peak(&samples)
    }
}

impl PeakFitter for LandauFitter {
    fn name(&self) -> &'static str {
        "landau"
    }

    fn fit_peak(&self, samples: &[(f64, f64)]) -> Option<f64> {
        let positive: Vec<(f64, f64)> = samples.iter().copied().filter(|&(_, y)| y > 0.0).collect();
        if positive.len() < self.config.min_samples {
            return None;
        }

        let &(peak_time, peak) = positive.iter().max_by(|a, b| a.1.total_cmp(&b.1))?;
        let initial = [peak * 0.5_f64.exp(), peak_time, 1.0];
        let result = levmar::fit(&MoyalShape, &positive, initial, &self.config)?;
        result.params[1].is_finite().then_some(result.params[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_peak_at_mpv() {
        let p = [100.0, 5.0, 1.2];
        let at_peak = MoyalShape.value(5.0, &p);
        assert!(at_peak > MoyalShape.value(4.9, &p));
        assert!(at_peak > MoyalShape.value(5.1, &p));
        assert_abs_diff_eq!(at_peak, 100.0 * (-0.5_f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn test_recovers_mpv() {
        let p = [800.0, 6.4, 1.5];
        let waveform: Vec<i16> = (0..16)
            .map(|t| MoyalShape.value(f64::from(t), &p).round() as i16)
            .collect();
        let mpv = LandauFitter::default().fit_waveform(&waveform).unwrap();
        assert_abs_diff_eq!(mpv, 6.4, epsilon = 0.05);
    }

    #[test]
    fn test_ignores_non_positive_bins() {
        let waveform = [-5, -2, 0, 40, 0, -1];
        assert!(LandauFitter::default().fit_waveform(&waveform).is_none());
    }

    #[test]
    fn test_far_left_tail_is_zero() {
        let p = [100.0, 10.0, 0.1];
        assert_abs_diff_eq!(MoyalShape.value(0.0, &p), 0.0);
        assert_eq!(MoyalShape.gradient(0.0, &p), [0.0; 3]);
    }
}
