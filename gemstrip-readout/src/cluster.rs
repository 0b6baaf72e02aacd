//! Pre-clustered records.
//!
//! Some front ends (the VMM3a chain) ship clusters instead of strips: each
//! record already pairs an X cluster with a Y cluster. They skip strip
//! clustering and cross-plane matching and become hits directly. Records
//! are stored back to back, little-endian, [`CLUSTER_RECORD_SIZE`] bytes
//! each:
//!
//! | offset | size | field |
//! |---|---|---|
//! | 0 | 8 | `time` (f64, ns) |
//! | 8 | 8 | `x_position` (f64, strips) |
//! | 16 | 8 | `y_position` (f64, strips) |
//! | 24 | 2 | `x_charge` (u16) |
//! | 26 | 2 | `y_charge` (u16) |
//! | 28 | 2 | `x_size` (u16) |
//! | 30 | 2 | `y_size` (u16) |
//! | 32 | 1 | `detector` (u8) |
//! | 33 | 7 | reserved, zero |

use crate::{Error, Result};
use gemstrip_core::Hit2D;
use std::iter::Peekable;

/// Size in bytes of one encoded cluster record.
pub const CLUSTER_RECORD_SIZE: usize = 40;

/// One X/Y cluster pair as delivered by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClusterRecord {
    /// Cluster time in nanoseconds.
    pub time: f64,
    /// X cluster position.
    pub x_position: f64,
    /// Y cluster position.
    pub y_position: f64,
    /// X cluster charge.
    pub x_charge: u16,
    /// Y cluster charge.
    pub y_charge: u16,
    /// Strips in the X cluster.
    pub x_size: u16,
    /// Strips in the Y cluster.
    pub y_size: u16,
    /// Numeric detector id (see [`crate::DetectorMap`]).
    pub detector: u8,
}

impl ClusterRecord {
    /// The record as a hit stamped with its own time.
    ///
    /// `None` when either position is zero or NaN; the front end writes zero
    /// for a plane that had no cluster.
    #[must_use]
    pub fn to_hit(&self) -> Option<Hit2D> {
        let charge = i64::from(self.x_charge) + i64::from(self.y_charge);
        let size = usize::from(self.x_size) + usize::from(self.y_size);
        let ratio = f64::from(self.y_charge) / f64::from(self.x_charge);
        let hit = Hit2D::new(self.x_position, self.y_position, charge, self.time)
            .with_cluster(size, ratio);
        hit.is_physical().then_some(hit)
    }

    /// Encodes the record into its binary layout.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; CLUSTER_RECORD_SIZE] {
        let mut buf = [0u8; CLUSTER_RECORD_SIZE];
        buf[0..8].copy_from_slice(&self.time.to_le_bytes());
        buf[8..16].copy_from_slice(&self.x_position.to_le_bytes());
        buf[16..24].copy_from_slice(&self.y_position.to_le_bytes());
        buf[24..26].copy_from_slice(&self.x_charge.to_le_bytes());
        buf[26..28].copy_from_slice(&self.y_charge.to_le_bytes());
        buf[28..30].copy_from_slice(&self.x_size.to_le_bytes());
        buf[30..32].copy_from_slice(&self.y_size.to_le_bytes());
        buf[32] = self.detector;
        buf
    }

    /// Decodes one record.
    ///
    /// # Errors
    /// Returns [`Error::BadRecord`] if `bytes` is not exactly
    /// [`CLUSTER_RECORD_SIZE`] long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let Ok(buf) = <&[u8; CLUSTER_RECORD_SIZE]>::try_from(bytes) else {
            return Err(Error::BadRecord(format!(
                "expected {CLUSTER_RECORD_SIZE} bytes, got {}",
                bytes.len()
            )));
        };

        let f64_at = |at: usize| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&buf[at..at + 8]);
            f64::from_le_bytes(raw)
        };
        let u16_at = |at: usize| u16::from_le_bytes([buf[at], buf[at + 1]]);

        Ok(Self {
            time: f64_at(0),
            x_position: f64_at(8),
            y_position: f64_at(16),
            x_charge: u16_at(24),
            y_charge: u16_at(26),
            x_size: u16_at(28),
            y_size: u16_at(30),
            detector: buf[32],
        })
    }
}

/// The cluster records of one event.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterEvent {
    /// Sequence number of the event in the stream, from 0.
    pub index: u64,
    /// Time of the event's first record.
    pub reference_timestamp: f64,
    /// Records in stream order.
    pub records: Vec<ClusterRecord>,
}

impl ClusterEvent {
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

    /// True if any record belongs to `detector`.
    #[must_use]
    pub fn has_detector(&self, detector: u8) -> bool {
        self.records.iter().any(|r| r.detector == detector)
    }

    /// Physical hits of one detector in stream order.
    #[must_use]
    pub fn hits(&self, detector: u8) -> Vec<Hit2D> {
        self.records
            .iter()
            .filter(|r| r.detector == detector)
            .filter_map(ClusterRecord::to_hit)
            .collect()
    }
}

/// Iterator grouping a cluster record stream into time windows.
///
/// An event opens at the first unconsumed record and takes every following
/// record within `duration` ns of it.
pub struct ClusterEventBuilder<I: Iterator<Item = ClusterRecord>> {
    records: Peekable<I>,
    duration: f64,
    next_index: u64,
}

impl<I: Iterator<Item = ClusterRecord>> ClusterEventBuilder<I> {
    /// Wraps a record stream.
    pub fn new<T>(records: T, duration: f64) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        Self {
            records: records.into_iter().peekable(),
            duration,
            next_index: 0,
        }
    }
}

impl<I: Iterator<Item = ClusterRecord>> Iterator for ClusterEventBuilder<I> {
    type Item = ClusterEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.records.next()?;
        let reference = first.time;
        let duration = self.duration;

        let mut records = vec![first];
        while let Some(next) = self
            .records
            .next_if(|next| next.time - reference <= duration)
        {
            records.push(next);
        }

        let event = ClusterEvent {
            index: self.next_index,
            reference_timestamp: reference,
            records,
        };
        self.next_index += 1;
        Some(event)
    }
}
