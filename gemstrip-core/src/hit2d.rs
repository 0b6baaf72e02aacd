//! Final two-dimensional hit records.

use crate::cluster::MatchedClusterPair;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A reconstructed 2D hit handed to track reconstruction.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Hit2D {
    /// X position (strip units, sub-strip precision).
    pub x: f64,
    /// Y position (strip units, sub-strip precision).
    pub y: f64,
    /// Summed charge of the X and Y clusters.
    pub charge: i64,
    /// Reference timestamp of the event.
    pub timestamp: f64,
    /// Strips in the X and Y clusters together, zero when unknown.
    pub cluster_size: usize,
    /// Y charge divided by X charge, zero when unknown.
    pub charge_ratio: f64,
}

impl Hit2D {
    /// Creates a new 2D hit without cluster shape information.
    #[must_use]
    pub fn new(x: f64, y: f64, charge: i64, timestamp: f64) -> Self {
        Self {
            x,
            y,
            charge,
            timestamp,
            cluster_size: 0,
            charge_ratio: 0.0,
        }
    }

    /// Sets the combined cluster size and the Y/X charge ratio.
    #[must_use]
    pub fn with_cluster(mut self, cluster_size: usize, charge_ratio: f64) -> Self {
        self.cluster_size = cluster_size;
        self.charge_ratio = charge_ratio;
        self
    }

    /// Builds a hit from a matched pair, stamping the event reference time.
    #[must_use]
    pub fn from_pair(pair: &MatchedClusterPair, timestamp: f64) -> Self {
        let (x, y) = (pair.x_position, pair.y_position);
        Self::new(x, y, pair.total_charge, timestamp)
            .with_cluster(pair.total_hit_count, pair.charge_ratio)
    }

    /// Position as an `(x, y)` tuple.
    #[inline]
    #[must_use]
    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    /// False when either coordinate is NaN or exactly zero.
    ///
    /// Such hits carry no physical position and are dropped downstream.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_physical(&self) -> bool {
        !(self.x.is_nan() || self.y.is_nan() || self.x == 0.0 || self.y == 0.0)
    }
}
