//! Strip hit types for two-plane strip detectors.

use std::cmp::Ordering;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Readout plane of a 2D strip detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Plane {
    /// Strips measuring the X coordinate (plane code 0).
    X,
    /// Strips measuring the Y coordinate (plane code 1).
    Y,
}

impl Plane {
    /// Both planes, X first.
    pub const ALL: [Plane; 2] = [Plane::X, Plane::Y];

    /// Decodes the readout plane code.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Plane::X),
            1 => Some(Plane::Y),
            _ => None,
        }
    }

    /// Readout plane code.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Plane::X => 0,
            Plane::Y => 1,
        }
    }

    /// Lowercase axis label used in diagnostic names.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Plane::X => "x",
            Plane::Y => "y",
        }
    }
}

/// A single strip reading within one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RawStripHit {
    /// Strip index within the plane.
    pub strip: i32,
    /// Peak amplitude (ADC counts).
    pub amplitude: i32,
    /// Opaque back-reference into the originating record.
    ///
    /// Only used to recover auxiliary data (e.g. the full waveform) after
    /// clustering. Never used for ordering or arithmetic.
    pub source_index: usize,
}

impl RawStripHit {
    /// Creates a new strip hit.
    #[inline]
    #[must_use]
    pub fn new(strip: i32, amplitude: i32, source_index: usize) -> Self {
        Self {
            strip,
            amplitude,
            source_index,
        }
    }

    /// True if `next` sits on the strip immediately after this one.
    #[inline]
    #[must_use]
    pub fn is_followed_by(&self, next: &Self) -> bool {
        i64::from(next.strip) - i64::from(self.strip) == 1
    }

    /// Clustering scan order: strip ascending, then amplitude descending.
    ///
    /// Within a tied strip the largest sample is scanned first and becomes
    /// the provisional peak.
    #[must_use]
    pub fn scan_order(&self, other: &Self) -> Ordering {
        self.strip
            .cmp(&other.strip)
            .then_with(|| other.amplitude.cmp(&self.amplitude))
    }
}

/// Sorts hits into clustering scan order (see [`RawStripHit::scan_order`]).
pub fn sort_for_clustering(hits: &mut [RawStripHit]) {
    hits.sort_by(RawStripHit::scan_order);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_codes() {
        assert_eq!(Plane::from_code(0), Some(Plane::X));
        assert_eq!(Plane::from_code(1), Some(Plane::Y));
        assert_eq!(Plane::from_code(2), None);
        for plane in Plane::ALL {
            assert_eq!(Plane::from_code(plane.code()), Some(plane));
        }
    }

    #[test]
    fn test_adjacency() {
        let hit = RawStripHit::new(10, 50, 0);
        assert!(hit.is_followed_by(&RawStripHit::new(11, 20, 1)));
        assert!(!hit.is_followed_by(&RawStripHit::new(10, 20, 1)));
        assert!(!hit.is_followed_by(&RawStripHit::new(12, 20, 1)));
        assert!(!hit.is_followed_by(&RawStripHit::new(9, 20, 1)));
    }

    #[test]
    fn test_scan_order_breaks_ties_by_amplitude() {
        let mut hits = vec![
            RawStripHit::new(7, 10, 0),
            RawStripHit::new(5, 30, 1),
            RawStripHit::new(5, 80, 2),
            RawStripHit::new(6, 40, 3),
        ];
        sort_for_clustering(&mut hits);

        let order: Vec<usize> = hits.iter().map(|h| h.source_index).collect();
        assert_eq!(order, vec![2, 1, 3, 0]);
    }
}
