//! Diagnostic observation sinks.
//!
//! The reconstruction engine reports scalar observations (cluster charge,
//! cluster size, fitted position, waveform samples) by name through
//! [`DiagnosticSink`], so it never depends on a particular histogramming or
//! telemetry backend.

use std::collections::BTreeMap;

/// Receiver for named scalar observations.
pub trait DiagnosticSink {
    /// Records one observation.
    fn record(&mut self, name: &str, value: f64);
}

/// Sink that discards every observation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    #[inline]
    fn record(&mut self, _name: &str, _value: f64) {}
}

/// Running summary of one observation name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    /// Number of observations.
    pub count: u64,
    /// Sum of observed values.
    pub sum: f64,
    /// Smallest observed value.
    pub min: f64,
    /// Largest observed value.
    pub max: f64,
}

impl Default for Summary {
    fn default() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl Summary {
    /// Adds one value.
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Mean of the observed values, `None` before the first observation.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    /// Folds another summary into this one.
    pub fn merge(&mut self, other: &Summary) {
        self.count += other.count;
        self.sum += other.sum;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }
}

/// Sink keeping a [`Summary`] per observation name.
///
/// Non-finite values are counted separately and never enter a summary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummarySink {
    summaries: BTreeMap<String, Summary>,
    rejected: u64,
}

impl SummarySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Summary for `name`, if anything was recorded under it.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Summary> {
        self.summaries.get(name)
    }

    /// Iterates summaries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Summary)> {
        self.summaries
            .iter()
            .map(|(name, summary)| (name.as_str(), summary))
    }

    /// Number of non-finite values that were dropped.
    #[must_use]
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Folds another sink into this one.
    pub fn merge(&mut self, other: &SummarySink) {
        for (name, summary) in &other.summaries {
            self.summaries
                .entry(name.clone())
                .or_default()
                .merge(summary);
        }
        self.rejected += other.rejected;
    }
}

impl DiagnosticSink for SummarySink {
    fn record(&mut self, name: &str, value: f64) {
        if !value.is_finite() {
            self.rejected += 1;
            return;
        }
        if let Some(summary) = self.summaries.get_mut(name) {
            summary.push(value);
        } else {
            let mut summary = Summary::default();
            summary.push(value);
            self.summaries.insert(name.to_owned(), summary);
        }
    }
}

/// Sink that keeps observations in arrival order for later replay.
///
/// Lets independent workers record without sharing a sink; the buffers are
/// replayed into the real sink in a fixed order afterwards.
#[derive(Debug, Clone, Default)]
pub struct ObservationBuffer {
    observations: Vec<(String, f64)>,
}

impl ObservationBuffer {
    /// Number of buffered observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// True if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Forwards every buffered observation to `sink`, in arrival order.
    pub fn replay_into(&self, sink: &mut dyn DiagnosticSink) {
        for (name, value) in &self.observations {
            sink.record(name, *value);
        }
    }
}

impl DiagnosticSink for ObservationBuffer {
    fn record(&mut self, name: &str, value: f64) {
        self.observations.push((name.to_owned(), value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_sink() {
        let mut sink = SummarySink::new();
        sink.record("cluster_charge_x", 340.0);
        sink.record("cluster_charge_x", 60.0);
        sink.record("cluster_size_x", 3.0);
        sink.record("cluster_size_x", f64::NAN);

        let charge = sink.get("cluster_charge_x").unwrap();
        assert_eq!(charge.count, 2);
        assert!((charge.mean().unwrap() - 200.0).abs() < f64::EPSILON);
        assert!((charge.min - 60.0).abs() < f64::EPSILON);
        assert!((charge.max - 340.0).abs() < f64::EPSILON);

        assert_eq!(sink.get("cluster_size_x").unwrap().count, 1);
        assert_eq!(sink.rejected(), 1);
        assert!(sink.get("missing").is_none());
    }

    #[test]
    fn test_merge_sinks() {
        let mut a = SummarySink::new();
        a.record("q", 1.0);
        let mut b = SummarySink::new();
        b.record("q", 3.0);
        b.record("r", 5.0);

        a.merge(&b);
        assert_eq!(a.get("q").unwrap().count, 2);
        assert!((a.get("q").unwrap().max - 3.0).abs() < f64::EPSILON);
        assert_eq!(a.iter().count(), 2);
    }

    #[test]
    fn test_buffer_replays_in_order() {
        let mut buffer = ObservationBuffer::default();
        buffer.record("a", 1.0);
        buffer.record("a", 2.0);
        assert_eq!(buffer.len(), 2);

        let mut sink = SummarySink::new();
        buffer.replay_into(&mut sink);
        assert_eq!(sink.get("a").unwrap().count, 2);
    }

    #[test]
    fn test_empty_summary_has_no_mean() {
        assert!(Summary::default().mean().is_none());
    }
}
