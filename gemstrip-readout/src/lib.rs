//! gemstrip-readout: Raw strip readout records and run configuration.
//!
//! This crate provides the data side of reconstruction:
//! - [`RawStripRecord`] - one strip readout with its amplitude waveform
//! - [`ClusterRecord`] - one X/Y cluster pair from a pre-clustering front end
//! - [`DetectorMap`] - detector name to numeric id table
//! - [`EventBuilder`] - groups the record stream into events
//! - [`RunConfig`] - JSON run configuration
//!

pub mod cluster;
pub mod config;
mod detector;
mod error;
pub mod event;
pub mod record;

pub use cluster::{ClusterEvent, ClusterEventBuilder, ClusterRecord, CLUSTER_RECORD_SIZE};
pub use config::RunConfig;
pub use detector::{DetectorEntry, DetectorMap};
pub use error::{Error, Result};
pub use event::{EventBuilder, EventWindow, RawEvent};
pub use record::{RawStripRecord, Waveform, MAX_TIMEBINS, RECORD_SIZE};
