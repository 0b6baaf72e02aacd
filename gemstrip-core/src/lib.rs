//! gemstrip-core: Core types and traits for strip-detector hit reconstruction.
//!
//! This crate provides the per-event value types that flow through the
//! reconstruction pipeline (strip hits, plane clusters, matched pairs and
//! final 2D hits), the configuration types that tune it, and the narrow
//! collaborator traits for peak fitting and diagnostics.
//!

pub mod cluster;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fit;
pub mod hit;
pub mod hit2d;
pub mod waveform;

pub use cluster::{MatchedClusterPair, PlaneCluster};
pub use config::{
    AcceptanceConfig, ClusteringConfig, FitConfig, MatchingConfig, MatchingStrategy, RatioWindow,
};
pub use diagnostics::{DiagnosticSink, NullSink, ObservationBuffer, Summary, SummarySink};
pub use error::{Error, Result};
pub use fit::{charge_weighted_centroid, PeakFitter};
pub use hit::{sort_for_clustering, Plane, RawStripHit};
pub use hit2d::Hit2D;
pub use waveform::{NoWaveforms, WaveformSource};
