//! Cross-plane matching of X and Y clusters by charge consistency.
//!
//! Both planes see the same avalanche, so a true 2D hit deposits comparable
//! charge on its X and Y projections. The matcher pairs the shorter cluster
//! list, held in its given order, against ordered selections of the longer
//! one and keeps the pairing whose summed Y/X charge ratio is smallest among
//! those whose mean ratio falls inside the ratio window.
#![allow(clippy::cast_precision_loss)]

use crate::assignment;
use crate::permutation::{arrangement_count, for_each_arrangement};
use gemstrip_core::{MatchedClusterPair, MatchingConfig, MatchingStrategy, PlaneCluster};

/// Pairs X-plane clusters with Y-plane clusters for one event.
#[derive(Debug, Clone, Default)]
pub struct CrossPlaneMatcher {
    config: MatchingConfig,
}

/// Which list is held fixed during the search.
struct Orientation<'a> {
    fixed: &'a [PlaneCluster],
    free: &'a [PlaneCluster],
    fixed_is_x: bool,
}

impl Orientation<'_> {
    fn ratio(&self, fixed: usize, free: usize) -> f64 {
        let (x, y) = self.clusters(fixed, free);
        y.charge_ratio_over(x)
    }

    fn clusters(&self, fixed: usize, free: usize) -> (&PlaneCluster, &PlaneCluster) {
        if self.fixed_is_x {
            (&self.fixed[fixed], &self.free[free])
        } else {
            (&self.free[free], &self.fixed[fixed])
        }
    }

    fn ratio_sum(&self, selection: &[usize]) -> f64 {
        selection
            .iter()
            .enumerate()
            .map(|(i, &j)| self.ratio(i, j))
            .sum()
    }
}

impl CrossPlaneMatcher {
    /// Creates a matcher.
    #[must_use]
    pub fn new(config: MatchingConfig) -> Self {
        Self { config }
    }

    /// Matching settings in use.
    #[must_use]
    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Strategy that will be used for lists of these sizes.
    #[must_use]
    pub fn effective_strategy(&self, x_len: usize, y_len: usize) -> MatchingStrategy {
        match self.config.strategy {
            MatchingStrategy::Auto => {
                if x_len.max(y_len) <= self.config.max_permutation_clusters {
                    MatchingStrategy::Permutation
                } else {
                    MatchingStrategy::Assignment
                }
            }
            fixed => fixed,
        }
    }

    /// Matches the event's X and Y clusters.
    ///
    /// Returns `None` if either plane is empty or no pairing has its mean
    /// charge ratio inside the window. Otherwise one pair per cluster of the
    /// shorter list, in that list's order (X order when counts are equal).
    #[must_use]
    pub fn match_planes(
        &self,
        x: &[PlaneCluster],
        y: &[PlaneCluster],
    ) -> Option<Vec<MatchedClusterPair>> {
        if x.is_empty() || y.is_empty() {
            return None;
        }

        let orientation = if x.len() <= y.len() {
            Orientation {
                fixed: x,
                free: y,
                fixed_is_x: true,
            }
        } else {
            Orientation {
                fixed: y,
                free: x,
                fixed_is_x: false,
            }
        };

        let strategy = self.effective_strategy(x.len(), y.len());
        let selection = match strategy {
            MatchingStrategy::Assignment => self.by_assignment(&orientation),
            _ => self.by_permutation(&orientation),
        };

        let Some(selection) = selection else {
            log::trace!(
                "no {strategy:?} pairing of {} x / {} y clusters inside ratio window",
                x.len(),
                y.len()
            );
            return None;
        };

        Some(
            selection
                .iter()
                .enumerate()
                .map(|(i, &j)| {
                    let (xc, yc) = orientation.clusters(i, j);
                    MatchedClusterPair::from_clusters(xc, yc)
                })
                .collect(),
        )
    }

    fn accepts(&self, ratio_sum: f64, n: usize) -> bool {
        self.config.ratio_window.contains(ratio_sum / n as f64)
    }

    /// Exhaustive search; the smallest accepted ratio sum wins, the first
    /// visited ordering on ties.
    fn by_permutation(&self, o: &Orientation<'_>) -> Option<Vec<usize>> {
        let n = o.fixed.len();
        let mut best: Option<(f64, Vec<usize>)> = None;

        for_each_arrangement(o.free.len(), n, |selection| {
            let ratio_sum = o.ratio_sum(selection);
            if !self.accepts(ratio_sum, n) {
                return;
            }
            if best.as_ref().is_none_or(|(sum, _)| ratio_sum < *sum) {
                best = Some((ratio_sum, selection.to_vec()));
            }
        });

        best.map(|(_, selection)| selection)
    }

    /// Minimum `sum |ratio - 1|` assignment, then the same window check.
    ///
    /// A rejected optimum does not end the search: the assignments with the
    /// smallest and largest ratio sums are tried as well, and the smallest
    /// accepted sum among the three wins. If none is accepted and the ordered
    /// selections fit the permutation budget, the exhaustive search decides.
    fn by_assignment(&self, o: &Orientation<'_>) -> Option<Vec<usize>> {
        let n = o.fixed.len();
        let m = o.free.len();

        let costs: [fn(f64) -> f64; 3] = [|r: f64| (r - 1.0).abs(), |r: f64| r, |r: f64| -r];
        let mut smallest: Option<(f64, Vec<usize>)> = None;
        for cost in costs {
            let Some(selection) = assignment::solve(n, m, |i, j| cost(o.ratio(i, j))) else {
                continue;
            };
            let ratio_sum = o.ratio_sum(&selection);
            if self.accepts(ratio_sum, n)
                && smallest.as_ref().is_none_or(|(sum, _)| ratio_sum < *sum)
            {
                smallest = Some((ratio_sum, selection));
            }
        }
        if let Some((_, selection)) = smallest {
            return Some(selection);
        }

        if arrangement_count(m, n) <= self.exhaustive_budget() {
            return self.by_permutation(o);
        }
        None
    }

    /// Ordered selections the permutation search may visit.
    fn exhaustive_budget(&self) -> u64 {
        let limit = self.config.max_permutation_clusters;
        arrangement_count(limit, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gemstrip_core::RatioWindow;

    fn cluster(position: f64, charge: i64) -> PlaneCluster {
        PlaneCluster::new(position, charge, 3, 0)
    }

    #[test]
    fn test_empty_plane() {
        let matcher = CrossPlaneMatcher::default();
        assert!(matcher.match_planes(&[], &[cluster(1.0, 10)]).is_none());
        assert!(matcher.match_planes(&[cluster(1.0, 10)], &[]).is_none());
    }

    #[test]
    fn test_single_pair_window() {
        let matcher = CrossPlaneMatcher::default();
        let pairs = matcher
            .match_planes(&[cluster(6.0, 340)], &[cluster(41.0, 345)])
            .unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].total_charge, 685);

        assert!(matcher
            .match_planes(&[cluster(6.0, 100)], &[cluster(41.0, 200)])
            .is_none());
        // Open window: exactly 0.5 is rejected.
        assert!(matcher
            .match_planes(&[cluster(6.0, 100)], &[cluster(41.0, 50)])
            .is_none());
    }

    #[test]
    fn test_swapped_pairing_selected() {
        let x = [cluster(10.0, 300), cluster(80.0, 50)];
        let y = [cluster(20.0, 45), cluster(70.0, 310)];
        for strategy in [MatchingStrategy::Permutation, MatchingStrategy::Assignment] {
            let matcher = CrossPlaneMatcher::new(MatchingConfig::new().with_strategy(strategy));
            let pairs = matcher.match_planes(&x, &y).unwrap();
            assert_eq!(pairs[0].x_position, 10.0);
            assert_eq!(pairs[0].y_position, 70.0);
            assert_eq!(pairs[0].total_charge, 610);
            assert_eq!(pairs[1].x_position, 80.0);
            assert_eq!(pairs[1].y_position, 20.0);
            assert_eq!(pairs[1].total_charge, 95);
        }
    }

    #[test]
    fn test_unequal_counts_fix_shorter_plane() {
        let x = [cluster(1.0, 100), cluster(2.0, 400), cluster(3.0, 900)];
        let y = [cluster(50.0, 410)];
        let pairs = CrossPlaneMatcher::default().match_planes(&x, &y).unwrap();
        assert_eq!(pairs.len(), 1);
        // Only 410/400 lies inside the window.
        assert_eq!(pairs[0].x_position, 2.0);
        assert!((pairs[0].charge_ratio - 410.0 / 400.0).abs() < 1e-12);
    }

    #[test]
    fn test_smallest_sum_not_closest_to_one() {
        let x = [cluster(1.0, 100)];
        let y = [cluster(5.0, 70), cluster(6.0, 105)];
        let pairs = CrossPlaneMatcher::new(
            MatchingConfig::new().with_strategy(MatchingStrategy::Permutation),
        )
        .match_planes(&x, &y)
        .unwrap();
        assert_eq!(pairs[0].y_position, 5.0);
    }

    #[test]
    fn test_zero_charge_never_matches() {
        let x = [cluster(1.0, 0)];
        let y = [cluster(2.0, 10)];
        assert!(CrossPlaneMatcher::default().match_planes(&x, &y).is_none());
    }

    #[test]
    fn test_custom_window() {
        let window = RatioWindow::new(0.9, 1.1).unwrap();
        let matcher = CrossPlaneMatcher::new(MatchingConfig::new().with_ratio_window(window));
        assert!(matcher
            .match_planes(&[cluster(1.0, 100)], &[cluster(2.0, 115)])
            .is_none());
    }

    #[test]
    fn test_assignment_keeps_in_window_pairing() {
        // The |ratio - 1| optimum pairs 200-90 and 900-405 (mean 0.45) while
        // the swapped pairing has mean 1.06.
        let x = [cluster(1.0, 200), cluster(2.0, 900)];
        let y = [cluster(3.0, 90), cluster(4.0, 405)];
        let configs = [
            MatchingConfig::new().with_strategy(MatchingStrategy::Permutation),
            MatchingConfig::new().with_strategy(MatchingStrategy::Assignment),
            MatchingConfig::new()
                .with_strategy(MatchingStrategy::Auto)
                .with_max_permutation_clusters(1),
            MatchingConfig::new()
                .with_strategy(MatchingStrategy::Assignment)
                .with_max_permutation_clusters(0),
        ];
        for config in configs {
            let pairs = CrossPlaneMatcher::new(config).match_planes(&x, &y).unwrap();
            assert_eq!(pairs[0].y_position, 4.0);
            assert_eq!(pairs[1].y_position, 3.0);
            assert!((pairs[0].charge_ratio - 2.025).abs() < 1e-12);
        }
    }

    #[test]
    fn test_auto_strategy_switch() {
        let config = MatchingConfig::new().with_max_permutation_clusters(3);
        let matcher = CrossPlaneMatcher::new(config);
        assert_eq!(
            matcher.effective_strategy(3, 2),
            MatchingStrategy::Permutation
        );
        assert_eq!(
            matcher.effective_strategy(2, 4),
            MatchingStrategy::Assignment
        );
    }
}
