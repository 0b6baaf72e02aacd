//! Peak-shape fitting capability and the charge-weighted fallback.
#![allow(clippy::cast_precision_loss)]

/// Capability to locate the peak of a sampled shape.
///
/// Implementations fit a model to `(coordinate, amplitude)` samples and
/// return the fitted peak coordinate, or `None` if the fit failed or did not
/// converge. Callers decide what to do on failure.
pub trait PeakFitter: Send + Sync {
    /// Fitter name, for logging.
    fn name(&self) -> &'static str;

    /// Fits the samples and returns the peak coordinate.
    fn fit_peak(&self, samples: &[(f64, f64)]) -> Option<f64>;
}

/// Amplitude-weighted mean coordinate of the samples.
///
/// Negative amplitudes carry no weight. If no sample has positive weight the
/// arithmetic mean of the coordinates is returned instead. Returns `None`
/// only for an empty slice.
#[must_use]
pub fn charge_weighted_centroid(samples: &[(f64, f64)]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }

    let mut sum = 0.0;
    let mut sum_weight = 0.0;
    for &(coordinate, amplitude) in samples {
        let weight = amplitude.max(0.0);
        sum += coordinate * weight;
        sum_weight += weight;
    }

    if sum_weight > 0.0 {
        Some(sum / sum_weight)
    } else {
        let n = samples.len() as f64;
        let total: f64 = samples.iter().map(|&(coordinate, _)| coordinate).sum();
        Some(total / n)
    }
}
