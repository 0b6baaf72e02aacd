//! Plane cluster and matched cluster pair types.
#![allow(clippy::cast_precision_loss)]

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A contiguous run of adjacent strip hits in one plane.
///
/// Clusters always hold at least two hits; isolated strips are noise.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlaneCluster {
    /// Sub-strip position from a peak-shape fit over the run.
    pub position: f64,
    /// Sum of the run's amplitudes.
    pub total_charge: i64,
    /// Number of hits in the run (always >= 2).
    pub hit_count: usize,
    /// `source_index` of the largest-amplitude hit in the run.
    pub peak_source_index: usize,
}

impl PlaneCluster {
    /// Minimum number of hits that makes a run a cluster.
    pub const MIN_HITS: usize = 2;

    /// Creates a new plane cluster.
    #[must_use]
    pub fn new(
        position: f64,
        total_charge: i64,
        hit_count: usize,
        peak_source_index: usize,
    ) -> Self {
        Self {
            position,
            total_charge,
            hit_count,
            peak_source_index,
        }
    }

    /// Ratio of `self` (a Y cluster) charge to an X cluster's charge.
    ///
    /// Infinite or NaN when the X charge is zero.
    #[inline]
    #[must_use]
    pub fn charge_ratio_over(&self, x: &PlaneCluster) -> f64 {
        self.total_charge as f64 / x.total_charge as f64
    }
}

/// An X cluster paired with a Y cluster by the cross-plane matcher.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatchedClusterPair {
    /// Refined X-plane position.
    pub x_position: f64,
    /// Refined Y-plane position.
    pub y_position: f64,
    /// Summed charge of both clusters.
    pub total_charge: i64,
    /// Summed hit count of both clusters.
    pub total_hit_count: usize,
    /// Y charge divided by X charge.
    pub charge_ratio: f64,
}

impl MatchedClusterPair {
    /// Combines an X cluster and a Y cluster into a matched pair.
    #[must_use]
    pub fn from_clusters(x: &PlaneCluster, y: &PlaneCluster) -> Self {
        Self {
            x_position: x.position,
            y_position: y.position,
            total_charge: x.total_charge + y.total_charge,
            total_hit_count: x.hit_count + y.hit_count,
            charge_ratio: y.charge_ratio_over(x),
        }
    }
}
