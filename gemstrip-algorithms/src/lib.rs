//! gemstrip-algorithms: Strip clustering and cross-plane matching.
//!
//! This crate holds the reconstruction engine:
//! - **Plane clustering** - strip-adjacency runs with fitted sub-strip positions
//! - **Peak fitting** - Levenberg-Marquardt Gaussian and Landau (Moyal) fits
//! - **Cross-plane matching** - exhaustive or Hungarian X/Y pairing by charge ratio
//! - **Assembly** - matched pairs to 2D hits, collected per detector
//!
#![warn(missing_docs)]

mod assembler;
pub mod assignment;
mod clipboard;
mod gaussian;
mod landau;
pub mod levmar;
mod matching;
pub mod permutation;
mod plane;
mod processing;

pub use assembler::HitAssembler;
pub use clipboard::Clipboard;
pub use gaussian::{GaussianFitter, GaussianShape};
pub use landau::{LandauFitter, MoyalShape};
pub use matching::CrossPlaneMatcher;
pub use plane::PlaneClusterBuilder;
pub use processing::{
    DetectorInput, DetectorOutcome, EventOutput, EventProcessor, EventStatus, ProcessingStatistics,
};

// Re-export the configuration types the engine is built from
pub use gemstrip_core::{AcceptanceConfig, ClusteringConfig, FitConfig, MatchingConfig};
