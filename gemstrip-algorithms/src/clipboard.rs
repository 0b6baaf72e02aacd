//! Per-event hit exchange keyed by detector name.

use gemstrip_core::Hit2D;
use std::collections::BTreeMap;

/// The event's reconstructed hits, one collection per detector.
///
/// A detector that was read out always has an entry, possibly empty. A
/// missing entry means the detector was not read out in this event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clipboard {
    hits: BTreeMap<String, Vec<Hit2D>>,
}

impl Clipboard {
    /// Creates an empty clipboard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a detector's hits, replacing any earlier entry.
    pub fn put(&mut self, detector: impl Into<String>, hits: Vec<Hit2D>) {
        self.hits.insert(detector.into(), hits);
    }

    /// Hits for `detector`, or `None` if it was not read out.
    #[must_use]
    pub fn get(&self, detector: &str) -> Option<&[Hit2D]> {
        self.hits.get(detector).map(Vec::as_slice)
    }

    /// Entries in detector-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Hit2D])> {
        self.hits
            .iter()
            .map(|(name, hits)| (name.as_str(), hits.as_slice()))
    }

    /// Number of detectors with an entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// True if no detector has an entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Hits across all detectors.
    #[must_use]
    pub fn total_hits(&self) -> usize {
        self.hits.values().map(Vec::len).sum()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.hits.clear();
    }
}
