//! Per-event reconstruction: clustering, acceptance, matching and assembly.
//!
//! Events are processed one at a time. Within an event the detectors are
//! independent, so their reconstruction can optionally fan out over the
//! rayon pool; diagnostics are then buffered per detector and replayed in
//! detector order so the sink sees the same sequence either way.
#![allow(clippy::cast_precision_loss)]

use crate::{Clipboard, CrossPlaneMatcher, HitAssembler, LandauFitter, PlaneClusterBuilder};
use gemstrip_core::{
    AcceptanceConfig, ClusteringConfig, DiagnosticSink, Hit2D, MatchedClusterPair, MatchingConfig,
    ObservationBuffer, Plane, PlaneCluster, RawStripHit, WaveformSource,
};
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One detector's raw hits for the current event.
pub struct DetectorInput<'a> {
    /// Detector name, used as the clipboard key.
    pub name: &'a str,
    /// X-plane hits, in any order.
    pub x_hits: Vec<RawStripHit>,
    /// Y-plane hits, in any order.
    pub y_hits: Vec<RawStripHit>,
    /// Event reference timestamp stamped on every output hit.
    pub reference_timestamp: f64,
    /// Waveforms behind the hits' `source_index`.
    pub waveforms: &'a (dyn WaveformSource + Sync),
}

/// How a detector's event ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EventStatus {
    /// At least one physical hit was produced.
    Accepted,
    /// A plane produced no clusters.
    NoClusters,
    /// A plane's cluster count was outside the acceptance bounds.
    Multiplicity {
        /// X-plane cluster count.
        x: usize,
        /// Y-plane cluster count.
        y: usize,
    },
    /// No pairing had its mean charge ratio inside the window.
    Unmatched,
    /// Every matched hit had a zero or NaN position.
    NonPhysical,
}

/// Result of reconstructing one detector in one event.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorOutcome {
    /// Outcome classification.
    pub status: EventStatus,
    /// X-plane clusters.
    pub x_clusters: Vec<PlaneCluster>,
    /// Y-plane clusters.
    pub y_clusters: Vec<PlaneCluster>,
    /// Matched pairs, empty unless the planes matched.
    pub pairs: Vec<MatchedClusterPair>,
    /// Physical hits; empty unless `status` is `Accepted`.
    pub hits: Vec<Hit2D>,
}

impl DetectorOutcome {
    fn rejected(
        status: EventStatus,
        x_clusters: Vec<PlaneCluster>,
        y_clusters: Vec<PlaneCluster>,
    ) -> Self {
        Self {
            status,
            x_clusters,
            y_clusters,
            pairs: Vec::new(),
            hits: Vec::new(),
        }
    }
}

/// Counters over processed events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProcessingStatistics {
    /// Events processed.
    pub events: u64,
    /// Detector readouts processed.
    pub detector_readouts: u64,
    /// Readouts that produced hits.
    pub accepted: u64,
    /// Readouts with a plane lacking clusters.
    pub no_clusters: u64,
    /// Readouts rejected by the multiplicity bounds.
    pub multiplicity_rejected: u64,
    /// Readouts with no pairing inside the ratio window.
    pub unmatched: u64,
    /// Readouts whose matched hits were all non-physical.
    pub non_physical: u64,
    /// X-plane clusters built.
    pub x_clusters: u64,
    /// Y-plane clusters built.
    pub y_clusters: u64,
    /// Hits written to the clipboard.
    pub hits: u64,
}

impl ProcessingStatistics {
    /// Counts one detector outcome.
    pub fn record(&mut self, outcome: &DetectorOutcome) {
        self.detector_readouts += 1;
        self.x_clusters += outcome.x_clusters.len() as u64;
        self.y_clusters += outcome.y_clusters.len() as u64;
        self.hits += outcome.hits.len() as u64;
        match outcome.status {
            EventStatus::Accepted => self.accepted += 1,
            EventStatus::NoClusters => self.no_clusters += 1,
            EventStatus::Multiplicity { .. } => self.multiplicity_rejected += 1,
            EventStatus::Unmatched => self.unmatched += 1,
            EventStatus::NonPhysical => self.non_physical += 1,
        }
    }

    /// Adds another set of counters to this one.
    pub fn merge(&mut self, other: &ProcessingStatistics) {
        self.events += other.events;
        self.detector_readouts += other.detector_readouts;
        self.accepted += other.accepted;
        self.no_clusters += other.no_clusters;
        self.multiplicity_rejected += other.multiplicity_rejected;
        self.unmatched += other.unmatched;
        self.non_physical += other.non_physical;
        self.x_clusters += other.x_clusters;
        self.y_clusters += other.y_clusters;
        self.hits += other.hits;
    }

    /// Fraction of detector readouts that produced hits.
    #[must_use]
    pub fn acceptance_rate(&self) -> f64 {
        if self.detector_readouts == 0 {
            0.0
        } else {
            self.accepted as f64 / self.detector_readouts as f64
        }
    }
}

/// Output of one event.
#[derive(Debug, Clone, Default)]
pub struct EventOutput {
    /// Hits per detector. Every input detector has an entry.
    pub clipboard: Clipboard,
    /// Counters for this event alone.
    pub statistics: ProcessingStatistics,
}

/// Runs the reconstruction chain for each detector of an event.
#[derive(Debug, Clone)]
pub struct EventProcessor {
    builder: PlaneClusterBuilder,
    timing: Option<LandauFitter>,
    matcher: CrossPlaneMatcher,
    assembler: HitAssembler,
    acceptance: AcceptanceConfig,
}

impl Default for EventProcessor {
    fn default() -> Self {
        Self::new(&ClusteringConfig::default(), MatchingConfig::default())
    }
}

impl EventProcessor {
    /// Creates a processor.
    #[must_use]
    pub fn new(clustering: &ClusteringConfig, matching: MatchingConfig) -> Self {
        Self {
            builder: PlaneClusterBuilder::new(&clustering.fit),
            timing: None,
            matcher: CrossPlaneMatcher::new(matching),
            assembler: HitAssembler,
            acceptance: clustering.acceptance,
        }
    }

    /// Enables a Landau fit of each cluster's peak waveform, recorded as
    /// `waveform_peak_time`.
    #[must_use]
    pub fn with_waveform_timing(mut self, enabled: bool) -> Self {
        self.timing = enabled.then(|| LandauFitter::new(self.builder.fitter().config().clone()));
        self
    }

    /// Reconstructs one detector.
    pub fn process_detector(
        &self,
        input: DetectorInput<'_>,
        sink: &mut dyn DiagnosticSink,
    ) -> DetectorOutcome {
        let DetectorInput {
            name,
            mut x_hits,
            mut y_hits,
            reference_timestamp,
            waveforms,
        } = input;

        let x_clusters = self.builder.sort_and_build(&mut x_hits);
        let y_clusters = self.builder.sort_and_build(&mut y_hits);
        self.record_clusters(Plane::X, &x_clusters, waveforms, sink);
        self.record_clusters(Plane::Y, &y_clusters, waveforms, sink);

        if x_clusters.is_empty() || y_clusters.is_empty() {
            log::trace!(
                "{name}: no clusters ({} x / {} y)",
                x_clusters.len(),
                y_clusters.len()
            );
            return DetectorOutcome::rejected(EventStatus::NoClusters, x_clusters, y_clusters);
        }

        let (x, y) = (x_clusters.len(), y_clusters.len());
        if !(self.acceptance.accepts(x) && self.acceptance.accepts(y)) {
            log::debug!(
                "{name}: cluster multiplicity {x} x / {y} y outside {}..={}",
                self.acceptance.min_clusters_per_plane,
                self.acceptance.max_clusters_per_plane
            );
            let status = EventStatus::Multiplicity { x, y };
            return DetectorOutcome::rejected(status, x_clusters, y_clusters);
        }

        let Some(pairs) = self.matcher.match_planes(&x_clusters, &y_clusters) else {
            log::debug!("{name}: no cross-plane match inside the ratio window");
            return DetectorOutcome::rejected(EventStatus::Unmatched, x_clusters, y_clusters);
        };

        for pair in &pairs {
            sink.record("charge_ratio", pair.charge_ratio);
        }

        let mut hits = self.assembler.assemble_all(&pairs, reference_timestamp);
        let assembled = hits.len();
        hits.retain(Hit2D::is_physical);
        if hits.len() < assembled {
            log::debug!(
                "{name}: dropped {} hit(s) with zero or NaN position",
                assembled - hits.len()
            );
        }

        let status = if hits.is_empty() {
            EventStatus::NonPhysical
        } else {
            EventStatus::Accepted
        };

        DetectorOutcome {
            status,
            x_clusters,
            y_clusters,
            pairs,
            hits,
        }
    }

    /// Reconstructs every detector of one event.
    ///
    /// Each input gets a clipboard entry, empty when nothing survived.
    pub fn process_event(
        &self,
        inputs: Vec<DetectorInput<'_>>,
        parallel: bool,
        sink: &mut dyn DiagnosticSink,
    ) -> EventOutput {
        let mut output = EventOutput::default();
        output.statistics.events = 1;

        if parallel && inputs.len() > 1 {
            let results: Vec<(String, DetectorOutcome, ObservationBuffer)> = inputs
                .into_par_iter()
                .map(|input| {
                    let name = input.name.to_owned();
                    let mut buffer = ObservationBuffer::default();
                    let outcome = self.process_detector(input, &mut buffer);
                    (name, outcome, buffer)
                })
                .collect();

            for (name, outcome, buffer) in results {
                buffer.replay_into(sink);
                output.statistics.record(&outcome);
                output.clipboard.put(name, outcome.hits);
            }
        } else {
            for input in inputs {
                let name = input.name.to_owned();
                let outcome = self.process_detector(input, sink);
                output.statistics.record(&outcome);
                output.clipboard.put(name, outcome.hits);
            }
        }

        output
    }

    fn record_clusters(
        &self,
        plane: Plane,
        clusters: &[PlaneCluster],
        waveforms: &(dyn WaveformSource + Sync),
        sink: &mut dyn DiagnosticSink,
    ) {
        let (charge, size, position) = match plane {
            Plane::X => ("cluster_charge_x", "cluster_size_x", "cluster_position_x"),
            Plane::Y => ("cluster_charge_y", "cluster_size_y", "cluster_position_y"),
        };

        for cluster in clusters {
            sink.record(charge, cluster.total_charge as f64);
            sink.record(size, cluster.hit_count as f64);
            sink.record(position, cluster.position);

            let Some(waveform) = waveforms.waveform(cluster.peak_source_index) else {
                continue;
            };
            for &adc in waveform {
                sink.record("waveform_amplitude", f64::from(adc));
            }
            if let Some(fitter) = &self.timing {
                match fitter.fit_waveform(waveform) {
                    Some(peak_time) => sink.record("waveform_peak_time", peak_time),
                    None => log::trace!("landau fit failed on {} waveform", plane.label()),
                }
            }
        }
    }
}
