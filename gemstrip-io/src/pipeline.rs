//! File-level reconstruction runs.
//!
//! Streams a record file event by event through the reconstruction engine
//! and writes each detector's hits as soon as the event is done. Event
//! numbers in the output start at the caller's `first_event`, so several
//! files written into one output keep distinct numbers.

use crate::reader::{ClusterFileReader, RawFileReader};
use crate::writer::HitFileWriter;
use crate::Result;
use gemstrip_algorithms::{DetectorInput, EventOutput, EventProcessor, ProcessingStatistics};
use gemstrip_core::{DiagnosticSink, Plane};
use gemstrip_readout::{ClusterEvent, EventWindow, RawEvent, RunConfig};
use std::path::Path;

/// Totals for one processed file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Records read.
    pub records: u64,
    /// Records whose detector id is not in the detector table.
    pub unmapped_records: u64,
    /// Per-event reconstruction counters.
    pub statistics: ProcessingStatistics,
    /// Hits written to the output.
    pub hits_written: u64,
}

impl RunSummary {
    /// Adds another summary to this one.
    pub fn merge(&mut self, other: &RunSummary) {
        self.records += other.records;
        self.unmapped_records += other.unmapped_records;
        self.statistics.merge(&other.statistics);
        self.hits_written += other.hits_written;
    }
}

/// Runs configured reconstruction over record files.
pub struct RunProcessor {
    config: RunConfig,
    processor: EventProcessor,
}

impl RunProcessor {
    /// Creates a processor for a validated configuration.
    ///
    /// # Errors
    /// Returns the configuration's validation error.
    pub fn new(config: RunConfig) -> Result<Self> {
        config.validate()?;
        let processor = EventProcessor::new(&config.clustering, config.matching.clone())
            .with_waveform_timing(config.waveform_timing);
        Ok(Self { config, processor })
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Reconstructs one event.
    ///
    /// Only detectors with at least one record in the event are read out and
    /// get a clipboard entry.
    pub fn process_event(&self, event: &RawEvent, sink: &mut dyn DiagnosticSink) -> EventOutput {
        let inputs: Vec<DetectorInput<'_>> = self
            .config
            .detectors
            .entries()
            .iter()
            .filter(|entry| event.has_detector(entry.id))
            .map(|entry| DetectorInput {
                name: &entry.name,
                x_hits: event.plane_hits(entry.id, Plane::X),
                y_hits: event.plane_hits(entry.id, Plane::Y),
                reference_timestamp: event.reference_timestamp,
                waveforms: event,
            })
            .collect();

        self.processor
            .process_event(inputs, self.config.parallel_detectors, sink)
    }

    /// Reconstructs every event of `reader` and writes the hits, numbering
    /// events from `first_event`.
    ///
    /// # Errors
    /// Returns an error if the file holds a malformed record or a write fails.
    pub fn process_file(
        &self,
        reader: &RawFileReader,
        writer: &mut HitFileWriter,
        first_event: u64,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for event in reader.events(self.config.event_window)? {
            summary.records += event.len() as u64;
            summary.unmapped_records += self.unmapped(event.records.iter().map(|r| r.detector));
            let output = self.process_event(&event, sink);
            let number = first_event + event.index;
            self.write_event(writer, number, &output, &mut summary)?;
        }

        writer.flush()?;
        log_summary(reader.path(), &summary);
        Ok(summary)
    }

    /// Collects the hits of one pre-clustered event.
    ///
    /// Every detector with a record in the event gets a clipboard entry;
    /// records with a zero or NaN position give no hit.
    pub fn process_cluster_event(
        &self,
        event: &ClusterEvent,
        sink: &mut dyn DiagnosticSink,
    ) -> EventOutput {
        let mut output = EventOutput::default();
        output.statistics.events = 1;

        for entry in self.config.detectors.entries() {
            if !event.has_detector(entry.id) {
                continue;
            }
            let clusters = event
                .records
                .iter()
                .filter(|r| r.detector == entry.id)
                .count() as u64;
            let hits = event.hits(entry.id);
            for hit in &hits {
                sink.record("charge_ratio", hit.charge_ratio);
            }

            let stats = &mut output.statistics;
            stats.detector_readouts += 1;
            stats.x_clusters += clusters;
            stats.y_clusters += clusters;
            stats.hits += hits.len() as u64;
            if hits.is_empty() {
                stats.non_physical += 1;
            } else {
                stats.accepted += 1;
            }
            output.clipboard.put(entry.name.clone(), hits);
        }
        output
    }

    /// Converts every event of a pre-clustered file and writes the hits,
    /// numbering events from `first_event`.
    ///
    /// Cluster records carry no event id, so the run's event window must be
    /// [`EventWindow::ByTime`].
    ///
    /// # Errors
    /// Returns an error for an event-id window or a failed write.
    pub fn process_cluster_file(
        &self,
        reader: &ClusterFileReader,
        writer: &mut HitFileWriter,
        first_event: u64,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<RunSummary> {
        let EventWindow::ByTime { duration } = self.config.event_window else {
            let message = "pre-clustered input needs a by_time event window";
            let error = gemstrip_readout::Error::InvalidConfig(message.into());
            return Err(error.into());
        };

        let mut summary = RunSummary::default();
        for event in reader.events(duration) {
            summary.records += event.len() as u64;
            summary.unmapped_records += self.unmapped(event.records.iter().map(|r| r.detector));
            let output = self.process_cluster_event(&event, sink);
            let number = first_event + event.index;
            self.write_event(writer, number, &output, &mut summary)?;
        }

        writer.flush()?;
        log_summary(reader.path(), &summary);
        Ok(summary)
    }

    fn unmapped(&self, detectors: impl Iterator<Item = u8>) -> u64 {
        detectors
            .filter(|&id| self.config.detectors.name_of(id).is_none())
            .count() as u64
    }

    fn write_event(
        &self,
        writer: &mut HitFileWriter,
        event_number: u64,
        output: &EventOutput,
        summary: &mut RunSummary,
    ) -> Result<()> {
        for entry in self.config.detectors.entries() {
            if let Some(hits) = output.clipboard.get(&entry.name) {
                writer.write_hits(event_number, entry.id, hits)?;
                summary.hits_written += hits.len() as u64;
            }
        }
        summary.statistics.merge(&output.statistics);
        Ok(())
    }
}

fn log_summary(path: &Path, summary: &RunSummary) {
    if summary.unmapped_records > 0 {
        log::warn!(
            "{}: {} record(s) from detectors missing in the detector table",
            path.display(),
            summary.unmapped_records
        );
    }
    log::info!(
        "{}: {} events, {} records, {} hits",
        path.display(),
        summary.statistics.events,
        summary.records,
        summary.hits_written
    );
}
