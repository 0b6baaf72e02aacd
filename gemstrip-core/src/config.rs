//! Configuration for clustering, fitting and cross-plane matching.

use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Peak-shape fit settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FitConfig {
    /// Iteration cap for the least-squares solver.
    pub max_iterations: usize,
    /// Relative chi-square change that counts as converged.
    pub tolerance: f64,
    /// Fewer samples than this skip the fit and use the weighted centroid.
    pub min_samples: usize,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-6,
            min_samples: 3,
        }
    }
}

impl FitConfig {
    /// Sets the iteration cap.
    #[must_use]
    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    /// Sets the convergence tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the minimum sample count for a fit.
    #[must_use]
    pub fn with_min_samples(mut self, samples: usize) -> Self {
        self.min_samples = samples;
        self
    }

    /// Checks the settings.
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] for a zero iteration cap, a
    /// non-positive tolerance, or fewer than three samples (a three-parameter
    /// shape is underdetermined below that).
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(Error::ConfigError("fit max_iterations must be > 0".into()));
        }
        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return Err(Error::ConfigError(format!(
                "fit tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if self.min_samples < 3 {
            return Err(Error::ConfigError(format!(
                "fit min_samples must be >= 3, got {}",
                self.min_samples
            )));
        }
        Ok(())
    }
}

/// Per-plane cluster multiplicity bounds that make an event usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AcceptanceConfig {
    /// Minimum clusters per plane (inclusive).
    pub min_clusters_per_plane: usize,
    /// Maximum clusters per plane (inclusive).
    pub max_clusters_per_plane: usize,
}

impl Default for AcceptanceConfig {
    fn default() -> Self {
        Self {
            min_clusters_per_plane: 1,
            max_clusters_per_plane: 4,
        }
    }
}

impl AcceptanceConfig {
    /// Accept only events with exactly one cluster per plane.
    #[must_use]
    pub fn single_cluster() -> Self {
        Self {
            min_clusters_per_plane: 1,
            max_clusters_per_plane: 1,
        }
    }

    /// Sets the bounds.
    #[must_use]
    pub fn with_bounds(mut self, min: usize, max: usize) -> Self {
        self.min_clusters_per_plane = min;
        self.max_clusters_per_plane = max;
        self
    }

    /// True if `count` clusters in a plane lies within the bounds.
    #[inline]
    #[must_use]
    pub fn accepts(&self, count: usize) -> bool {
        (self.min_clusters_per_plane..=self.max_clusters_per_plane).contains(&count)
    }

    /// Checks the bounds.
    ///
    /// # Errors
    /// Returns [`Error::InvalidAcceptance`] if `min` is zero or exceeds `max`.
    pub fn validate(&self) -> Result<()> {
        if self.min_clusters_per_plane == 0
            || self.min_clusters_per_plane > self.max_clusters_per_plane
        {
            return Err(Error::InvalidAcceptance {
                min: self.min_clusters_per_plane,
                max: self.max_clusters_per_plane,
            });
        }
        Ok(())
    }
}

/// Open interval on the mean Y/X charge ratio of a pairing.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RatioWindow {
    /// Exclusive lower bound.
    pub low: f64,
    /// Exclusive upper bound.
    pub high: f64,
}

impl Default for RatioWindow {
    fn default() -> Self {
        Self {
            low: 0.5,
            high: 1.5,
        }
    }
}

impl RatioWindow {
    /// Creates a validated window.
    ///
    /// # Errors
    /// Returns [`Error::InvalidRatioWindow`] if the bounds are not finite or
    /// `low >= high`.
    pub fn new(low: f64, high: f64) -> Result<Self> {
        let window = Self { low, high };
        window.validate()?;
        Ok(window)
    }

    /// True if `mean_ratio` lies strictly inside the window.
    #[inline]
    #[must_use]
    pub fn contains(&self, mean_ratio: f64) -> bool {
        mean_ratio > self.low && mean_ratio < self.high
    }

    /// Checks the bounds.
    ///
    /// # Errors
    /// Returns [`Error::InvalidRatioWindow`] if the bounds are not finite or
    /// `low >= high`.
    pub fn validate(&self) -> Result<()> {
        if !(self.low.is_finite() && self.high.is_finite() && self.low < self.high) {
            return Err(Error::InvalidRatioWindow {
                low: self.low,
                high: self.high,
            });
        }
        Ok(())
    }
}

/// How the cross-plane matcher searches pairings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MatchingStrategy {
    /// Exhaustive search over orderings, smallest ratio sum wins.
    Permutation,
    /// Minimum-cost assignment on `|ratio - 1|`.
    Assignment,
    /// Permutation for small events, assignment above the size limit.
    #[default]
    Auto,
}

/// Cross-plane matching settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MatchingConfig {
    /// Acceptance window on the mean charge ratio.
    pub ratio_window: RatioWindow,
    /// Search strategy.
    pub strategy: MatchingStrategy,
    /// Largest per-plane cluster count searched exhaustively under `Auto`.
    pub max_permutation_clusters: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            ratio_window: RatioWindow::default(),
            strategy: MatchingStrategy::Auto,
            max_permutation_clusters: 6,
        }
    }
}

impl MatchingConfig {
    /// Creates a matching configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the charge-ratio window.
    #[must_use]
    pub fn with_ratio_window(mut self, window: RatioWindow) -> Self {
        self.ratio_window = window;
        self
    }

    /// Sets the search strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: MatchingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the exhaustive-search size limit used by `Auto`.
    #[must_use]
    pub fn with_max_permutation_clusters(mut self, limit: usize) -> Self {
        self.max_permutation_clusters = limit;
        self
    }

    /// Checks the settings.
    ///
    /// # Errors
    /// Propagates [`RatioWindow::validate`].
    pub fn validate(&self) -> Result<()> {
        self.ratio_window.validate()
    }
}

/// Plane clustering settings.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClusteringConfig {
    /// Position refinement fit.
    pub fit: FitConfig,
    /// Per-plane multiplicity bounds.
    pub acceptance: AcceptanceConfig,
}

impl ClusteringConfig {
    /// Creates a clustering configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the fit settings.
    #[must_use]
    pub fn with_fit(mut self, fit: FitConfig) -> Self {
        self.fit = fit;
        self
    }

    /// Sets the multiplicity bounds.
    #[must_use]
    pub fn with_acceptance(mut self, acceptance: AcceptanceConfig) -> Self {
        self.acceptance = acceptance;
        self
    }

    /// Checks the settings.
    ///
    /// # Errors
    /// Propagates [`FitConfig::validate`] and [`AcceptanceConfig::validate`].
    pub fn validate(&self) -> Result<()> {
        self.fit.validate()?;
        self.acceptance.validate()
    }
}
