//! Strip-adjacency clustering within one readout plane.
//!
//! Hits are scanned in clustering order (strip ascending, amplitude
//! descending). A hit extends the open run only if it sits on the strip
//! directly after the previous one; any other gap, including a repeated
//! strip, closes the run. Runs of at least [`PlaneCluster::MIN_HITS`] hits
//! become clusters, the rest are discarded as noise.
//!
//! Cluster positions come from a peak-shape fit over the run's
//! `(strip, amplitude)` samples. When the fit fails or lands outside the run
//! the charge-weighted centroid is used instead.

use crate::gaussian::GaussianFitter;
use gemstrip_core::{
    charge_weighted_centroid, sort_for_clustering, FitConfig, PeakFitter, PlaneCluster, RawStripHit,
};

/// Scan state for one open run. Lives only for the duration of a scan.
struct RunAccumulator {
    samples: Vec<(f64, f64)>,
    total_charge: i64,
    first_strip: i32,
    last_strip: i32,
    peak_amplitude: i32,
    peak_source_index: usize,
}

impl RunAccumulator {
    fn seeded(hit: &RawStripHit) -> Self {
        let mut samples = Vec::with_capacity(8);
        samples.push((f64::from(hit.strip), f64::from(hit.amplitude)));
        Self {
            samples,
            total_charge: i64::from(hit.amplitude),
            first_strip: hit.strip,
            last_strip: hit.strip,
            peak_amplitude: hit.amplitude,
            peak_source_index: hit.source_index,
        }
    }

    fn push(&mut self, hit: &RawStripHit) {
        self.samples
            .push((f64::from(hit.strip), f64::from(hit.amplitude)));
        self.total_charge += i64::from(hit.amplitude);
        self.last_strip = hit.strip;
        if hit.amplitude > self.peak_amplitude {
            self.peak_amplitude = hit.amplitude;
            self.peak_source_index = hit.source_index;
        }
    }

    fn hit_count(&self) -> usize {
        self.samples.len()
    }
}

/// Groups one plane's strip hits into clusters.
///
/// The builder holds no per-event state and can be shared between threads.
#[derive(Debug, Clone)]
pub struct PlaneClusterBuilder<F: PeakFitter = GaussianFitter> {
    fitter: F,
}

impl Default for PlaneClusterBuilder<GaussianFitter> {
    fn default() -> Self {
        Self::new(&FitConfig::default())
    }
}

impl PlaneClusterBuilder<GaussianFitter> {
    /// Creates a builder that refines positions with a Gaussian fit.
    #[must_use]
    pub fn new(config: &FitConfig) -> Self {
        Self {
            fitter: GaussianFitter::new(config.clone()),
        }
    }
}

impl<F: PeakFitter> PlaneClusterBuilder<F> {
    /// Replaces the position-refinement fitter.
    #[must_use]
    pub fn with_fitter<G: PeakFitter>(self, fitter: G) -> PlaneClusterBuilder<G> {
        PlaneClusterBuilder { fitter }
    }

    /// The position-refinement fitter.
    pub fn fitter(&self) -> &F {
        &self.fitter
    }

    /// Builds clusters from hits already in clustering order.
    ///
    /// Unsorted input is not an error, but runs are then split wherever the
    /// order breaks adjacency. Empty input gives no clusters.
    #[must_use]
    pub fn build_clusters(&self, hits: &[RawStripHit]) -> Vec<PlaneCluster> {
        let mut clusters = Vec::new();
        let mut run: Option<RunAccumulator> = None;

        for hit in hits {
            match run.as_mut() {
                Some(open) if i64::from(hit.strip) - i64::from(open.last_strip) == 1 => {
                    open.push(hit);
                }
                _ => {
                    if let Some(closed) = run.take() {
                        self.finalize(closed, &mut clusters);
                    }
                    run = Some(RunAccumulator::seeded(hit));
                }
            }
        }

        // The last run never sees a terminating hit.
        if let Some(closed) = run {
            self.finalize(closed, &mut clusters);
        }

        clusters
    }

    /// Sorts `hits` into clustering order, then builds clusters.
    pub fn sort_and_build(&self, hits: &mut [RawStripHit]) -> Vec<PlaneCluster> {
        sort_for_clustering(hits);
        self.build_clusters(hits)
    }

    fn finalize(&self, run: RunAccumulator, clusters: &mut Vec<PlaneCluster>) {
        if run.hit_count() < PlaneCluster::MIN_HITS {
            return;
        }

        let low = f64::from(run.first_strip) - 0.5;
        let high = f64::from(run.last_strip) + 0.5;
        let position = match self.fitter.fit_peak(&run.samples) {
            Some(mean) if (low..=high).contains(&mean) => mean,
            fitted => {
                if run.hit_count() > 2 {
                    log::debug!(
                        "{} fit over strips {}..={} gave {:?}, using weighted centroid",
                        self.fitter.name(),
                        run.first_strip,
                        run.last_strip,
                        fitted
                    );
                }
                match charge_weighted_centroid(&run.samples) {
                    Some(centroid) => centroid,
                    None => return,
                }
            }
        };

        clusters.push(PlaneCluster::new(
            position,
            run.total_charge,
            run.hit_count(),
            run.peak_source_index,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn builder() -> PlaneClusterBuilder {
        PlaneClusterBuilder::new(&FitConfig::default())
    }

    fn hits(pairs: &[(i32, i32)]) -> Vec<RawStripHit> {
        pairs
            .iter()
            .enumerate()
            .map(|(i, &(strip, amplitude))| RawStripHit::new(strip, amplitude, i))
            .collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(builder().build_clusters(&[]).is_empty());
    }

    #[test]
    fn test_last_run_is_flushed() {
        let clusters = builder().build_clusters(&hits(&[(10, 50), (11, 80)]));
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].total_charge, 130);
        assert_eq!(clusters[0].hit_count, 2);
        assert_eq!(clusters[0].peak_source_index, 1);
        // Two strips never reach the fit: (10*50 + 11*80) / 130
        assert_abs_diff_eq!(clusters[0].position, 1380.0 / 130.0, epsilon = 1e-12);
    }

    #[test]
    fn test_isolated_hits_are_noise() {
        let input = hits(&[(3, 90), (7, 200), (20, 40)]);
        let clusters = builder().build_clusters(&input);
        assert!(clusters.is_empty());
    }

    #[test]
    fn test_gap_splits_runs() {
        let input = hits(&[(1, 10), (2, 30), (4, 20), (5, 25), (6, 5)]);
        let clusters = builder().build_clusters(&input);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].total_charge, 40);
        assert_eq!(clusters[1].total_charge, 50);
        assert_eq!(clusters[1].hit_count, 3);
    }

    #[test]
    fn test_repeated_strip_closes_run() {
        let input = hits(&[(5, 90), (5, 40), (6, 60)]);
        let clusters = builder().build_clusters(&input);
        // (5,90) alone, then (5,40),(6,60)
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].total_charge, 100);
    }

    #[test]
    fn test_peak_keeps_first_of_equal_amplitudes() {
        let input = hits(&[(1, 70), (2, 70), (3, 10)]);
        let clusters = builder().build_clusters(&input);
        assert_eq!(clusters[0].peak_source_index, 0);
    }

    #[test]
    fn test_fitted_position_in_run() {
        let input = hits(&[(5, 100), (6, 150), (7, 90)]);
        let clusters = builder().build_clusters(&input);
        assert_eq!(clusters.len(), 1);
        let position = clusters[0].position;
        assert!(position > 5.5 && position < 6.5, "position {position}");
    }

    struct Failing;

    impl PeakFitter for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn fit_peak(&self, _samples: &[(f64, f64)]) -> Option<f64> {
            None
        }
    }

    struct OutOfRange;

    impl PeakFitter for OutOfRange {
        fn name(&self) -> &'static str {
            "out-of-range"
        }

        fn fit_peak(&self, _samples: &[(f64, f64)]) -> Option<f64> {
            Some(1000.0)
        }
    }

    #[test]
    fn test_fit_failure_falls_back_to_centroid() {
        let input = hits(&[(0, 10), (1, 10), (2, 20)]);
        let failing = builder().with_fitter(Failing);
        assert_abs_diff_eq!(failing.build_clusters(&input)[0].position, 1.25);

        let wild = builder().with_fitter(OutOfRange);
        assert_abs_diff_eq!(wild.build_clusters(&input)[0].position, 1.25);
    }

    #[test]
    fn test_sort_and_build() {
        let mut input = hits(&[(42, 110), (40, 95), (41, 140)]);
        let clusters = builder().sort_and_build(&mut input);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].total_charge, 345);
        assert_eq!(clusters[0].peak_source_index, 2);
    }
}
