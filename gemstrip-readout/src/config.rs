//! JSON run configuration.
//!
//! ```json
//! {
//!   "clustering": {
//!     "fit": { "max_iterations": 100, "tolerance": 1e-6, "min_samples": 3 },
//!     "acceptance": { "min_clusters_per_plane": 1, "max_clusters_per_plane": 4 }
//!   },
//!   "matching": {
//!     "ratio_window": { "low": 0.5, "high": 1.5 },
//!     "strategy": "auto",
//!     "max_permutation_clusters": 6
//!   },
//!   "detectors": [{ "name": "GEMXY1", "id": 0 }],
//!   "event_window": { "mode": "by_event_id" },
//!   "parallel_detectors": false,
//!   "waveform_timing": false
//! }
//! ```
//!
//! Every section is optional and falls back to its default.

use crate::{DetectorMap, EventWindow, Result};
use gemstrip_core::{ClusteringConfig, MatchingConfig};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Settings for one reconstruction run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Plane clustering and multiplicity bounds.
    pub clustering: ClusteringConfig,
    /// Cross-plane matching.
    pub matching: MatchingConfig,
    /// Detectors to reconstruct, in processing order.
    pub detectors: DetectorMap,
    /// Event grouping policy.
    pub event_window: EventWindow,
    /// Reconstruct the detectors of an event concurrently.
    pub parallel_detectors: bool,
    /// Fit each cluster's peak waveform for timing diagnostics.
    pub waveform_timing: bool,
}

impl RunConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and validates a configuration file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid JSON for
    /// this schema, or fails [`RunConfig::validate`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a configuration string.
    ///
    /// # Errors
    /// Returns an error if `json` does not parse or fails [`RunConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks every section.
    ///
    /// # Errors
    /// Returns the first validation failure.
    pub fn validate(&self) -> Result<()> {
        self.clustering.validate()?;
        self.matching.validate()?;
        self.detectors.validate()?;
        self.event_window.validate()
    }

    /// Sets the clustering settings.
    #[must_use]
    pub fn with_clustering(mut self, clustering: ClusteringConfig) -> Self {
        self.clustering = clustering;
        self
    }

    /// Sets the matching settings.
    #[must_use]
    pub fn with_matching(mut self, matching: MatchingConfig) -> Self {
        self.matching = matching;
        self
    }

    /// Sets the detector table.
    #[must_use]
    pub fn with_detectors(mut self, detectors: DetectorMap) -> Self {
        self.detectors = detectors;
        self
    }

    /// Sets the event grouping policy.
    #[must_use]
    pub fn with_event_window(mut self, window: EventWindow) -> Self {
        self.event_window = window;
        self
    }

    /// Enables per-detector parallelism within an event.
    #[must_use]
    pub fn with_parallel_detectors(mut self, parallel: bool) -> Self {
        self.parallel_detectors = parallel;
        self
    }

    /// Enables waveform timing fits.
    #[must_use]
    pub fn with_waveform_timing(mut self, enabled: bool) -> Self {
        self.waveform_timing = enabled;
        self
    }
}
