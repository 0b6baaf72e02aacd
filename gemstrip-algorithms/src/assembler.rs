//! Matched pair to 2D hit conversion.

use gemstrip_core::{Hit2D, MatchedClusterPair};

/// Turns matched cluster pairs into [`Hit2D`] records.
///
/// Stateless. Positions are copied unchanged, so NaN or zero positions
/// survive here and are filtered by the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct HitAssembler;

impl HitAssembler {
    /// Builds one hit, stamped with the event's reference timestamp.
    #[must_use]
    pub fn assemble(&self, pair: &MatchedClusterPair, reference_timestamp: f64) -> Hit2D {
        Hit2D::from_pair(pair, reference_timestamp)
    }

    /// Builds one hit per pair.
    #[must_use]
    pub fn assemble_all(
        &self,
        pairs: &[MatchedClusterPair],
        reference_timestamp: f64,
    ) -> Vec<Hit2D> {
        pairs
            .iter()
            .map(|pair| self.assemble(pair, reference_timestamp))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gemstrip_core::PlaneCluster;

    #[test]
    fn test_assemble() {
        let x = PlaneCluster::new(5.94, 340, 3, 1);
        let y = PlaneCluster::new(41.1, 345, 3, 4);
        let pair = MatchedClusterPair::from_clusters(&x, &y);
        let hit = HitAssembler.assemble(&pair, 1_250.0);
        assert_eq!(hit.position(), (5.94, 41.1));
        assert_eq!(hit.charge, 685);
        assert_eq!(hit.cluster_size, 6);
        assert!((hit.charge_ratio - 345.0 / 340.0).abs() < 1e-12);
        assert_eq!(hit.timestamp, 1_250.0);
    }

    #[test]
    fn test_nan_passes_through() {
        let x = PlaneCluster::new(f64::NAN, 10, 2, 0);
        let y = PlaneCluster::new(3.0, 10, 2, 1);
        let pair = MatchedClusterPair::from_clusters(&x, &y);
        let hits = HitAssembler.assemble_all(&[pair], 7.0);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].x.is_nan());
        assert!(!hits[0].is_physical());
    }
}
