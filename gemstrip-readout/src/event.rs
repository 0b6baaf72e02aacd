//! Grouping of the raw record stream into events.
//!
//! The builder owns the only cursor into the stream. It peeks one record
//! ahead to decide whether the record still belongs to the open event; the
//! record that closes an event is left in place and opens the next one.
#![allow(clippy::cast_precision_loss)]

use crate::record::RawStripRecord;
use crate::{Error, Result};
use gemstrip_core::{sort_for_clustering, Plane, RawStripHit, WaveformSource};
use serde::{Deserialize, Serialize};
use std::iter::Peekable;

/// How records are grouped into events.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EventWindow {
    /// Consecutive records sharing an `event_id`. The event id is the
    /// reference timestamp.
    #[default]
    ByEventId,
    /// Records within `duration` ns of the event's first record, whose
    /// timestamp is the reference.
    ByTime {
        /// Window length in nanoseconds.
        duration: f64,
    },
}

impl EventWindow {
    /// Checks the window.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] for a negative or non-finite duration.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::ByEventId => Ok(()),
            Self::ByTime { duration } if duration.is_finite() && duration >= 0.0 => Ok(()),
            Self::ByTime { duration } => Err(Error::InvalidConfig(format!(
                "event window duration must be finite and >= 0, got {duration}"
            ))),
        }
    }

    fn reference_of(&self, first: &RawStripRecord) -> f64 {
        match self {
            Self::ByEventId => f64::from(first.event_id),
            Self::ByTime { .. } => first.timestamp,
        }
    }

    fn includes(&self, event_id: u32, reference: f64, next: &RawStripRecord) -> bool {
        match *self {
            Self::ByEventId => next.event_id == event_id,
            Self::ByTime { duration } => next.timestamp - reference <= duration,
        }
    }
}

/// The records of one event.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    /// Sequence number of the event in the stream, from 0.
    pub index: u64,
    /// Timestamp stamped on the event's output hits.
    pub reference_timestamp: f64,
    /// Records in stream order.
    pub records: Vec<RawStripRecord>,
}

impl RawEvent {
    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if the event has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Detector ids present in the event, ascending.
    #[must_use]
    pub fn detectors(&self) -> Vec<u8> {
        let mut ids: Vec<u8> = self.records.iter().map(|r| r.detector).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// True if any record belongs to `detector`.
    #[must_use]
    pub fn has_detector(&self, detector: u8) -> bool {
        self.records.iter().any(|r| r.detector == detector)
    }

    /// Strip hits of one detector plane in clustering order.
    ///
    /// Each hit's `source_index` is the record's position in
    /// [`RawEvent::records`].
    #[must_use]
    pub fn plane_hits(&self, detector: u8, plane: Plane) -> Vec<RawStripHit> {
        let mut hits: Vec<RawStripHit> = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.detector == detector && r.plane == plane)
            .map(|(i, r)| r.to_strip_hit(i))
            .collect();
        sort_for_clustering(&mut hits);
        hits
    }
}

impl WaveformSource for RawEvent {
    fn waveform(&self, source_index: usize) -> Option<&[i16]> {
        self.records
            .get(source_index)
            .map(|r| r.waveform.as_slice())
    }
}

/// Iterator grouping a record stream into [`RawEvent`]s.
pub struct EventBuilder<I: Iterator<Item = RawStripRecord>> {
    records: Peekable<I>,
    window: EventWindow,
    next_index: u64,
}

impl<I: Iterator<Item = RawStripRecord>> EventBuilder<I> {
    /// Wraps a record stream.
    pub fn new<T>(records: T, window: EventWindow) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        Self {
            records: records.into_iter().peekable(),
            window,
            next_index: 0,
        }
    }

    /// The grouping policy.
    #[must_use]
    pub fn window(&self) -> EventWindow {
        self.window
    }
}

impl<I: Iterator<Item = RawStripRecord>> Iterator for EventBuilder<I> {
    type Item = RawEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.records.next()?;
        let window = self.window;
        let event_id = first.event_id;
        let reference = window.reference_of(&first);

        let mut records = vec![first];
        while let Some(next) = self
            .records
            .next_if(|next| window.includes(event_id, reference, next))
        {
            records.push(next);
        }

        let event = RawEvent {
            index: self.next_index,
            reference_timestamp: reference,
            records,
        };
        self.next_index += 1;
        Some(event)
    }
}
