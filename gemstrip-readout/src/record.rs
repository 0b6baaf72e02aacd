//! Raw strip records and their fixed binary layout.
//!
//! One record is one strip readout: the strip's full amplitude waveform
//! (up to [`MAX_TIMEBINS`] time bins) plus the time bin the front end flagged
//! as the maximum. Records are stored back to back, little-endian,
//! [`RECORD_SIZE`] bytes each:
//!
//! | offset | size | field |
//! |---|---|---|
//! | 0 | 4 | `event_id` (u32) |
//! | 4 | 8 | `timestamp` (f64, ns) |
//! | 12 | 1 | `detector` (u8) |
//! | 13 | 1 | `plane` (u8, 0 = X, 1 = Y) |
//! | 14 | 1 | `peak_timebin` (u8, 1-based, 0 = unknown) |
//! | 15 | 1 | `n_timebins` (u8) |
//! | 16 | 2 | `strip` (u16) |
//! | 18 | 2 | reserved, zero |
//! | 20 | 32 | waveform (16 x i16, unused bins zero) |

use crate::{Error, Result};
use gemstrip_core::{Plane, RawStripHit};

/// Maximum number of time bins per waveform.
pub const MAX_TIMEBINS: usize = 16;

/// Size in bytes of one encoded record.
pub const RECORD_SIZE: usize = 52;

const WAVEFORM_OFFSET: usize = 20;

/// Amplitude waveform of one strip, one sample per time bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Waveform {
    samples: [i16; MAX_TIMEBINS],
    len: u8,
}

impl Waveform {
    /// Creates a waveform from its samples.
    ///
    /// # Errors
    /// Returns [`Error::BadRecord`] if there are more than [`MAX_TIMEBINS`] samples.
    pub fn from_slice(samples: &[i16]) -> Result<Self> {
        if samples.len() > MAX_TIMEBINS {
            return Err(Error::BadRecord(format!(
                "{} time bins exceed the maximum of {MAX_TIMEBINS}",
                samples.len()
            )));
        }
        let mut waveform = Self::default();
        waveform.samples[..samples.len()].copy_from_slice(samples);
        waveform.len = u8::try_from(samples.len()).unwrap_or(u8::MAX);
        Ok(waveform)
    }

    /// The populated samples.
    #[must_use]
    pub fn as_slice(&self) -> &[i16] {
        &self.samples[..usize::from(self.len)]
    }

    /// Number of time bins.
    #[must_use]
    pub fn len(&self) -> usize {
        usize::from(self.len)
    }

    /// True if the waveform has no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Largest sample, if any.
    #[must_use]
    pub fn max(&self) -> Option<i16> {
        self.as_slice().iter().copied().max()
    }
}

/// One strip readout.
#[derive(Debug, Clone, PartialEq)]
pub struct RawStripRecord {
    /// Front-end event counter.
    pub event_id: u32,
    /// Readout time in nanoseconds.
    pub timestamp: f64,
    /// Numeric detector id (see [`crate::DetectorMap`]).
    pub detector: u8,
    /// Readout plane.
    pub plane: Plane,
    /// Strip index within the plane.
    pub strip: u16,
    /// 1-based time bin of the waveform maximum, 0 if not reported.
    pub peak_timebin: u8,
    /// Amplitude waveform.
    pub waveform: Waveform,
}

impl RawStripRecord {
    /// Creates a record.
    #[must_use]
    pub fn new(
        event_id: u32,
        timestamp: f64,
        detector: u8,
        plane: Plane,
        strip: u16,
        peak_timebin: u8,
        waveform: Waveform,
    ) -> Self {
        Self {
            event_id,
            timestamp,
            detector,
            plane,
            strip,
            peak_timebin,
            waveform,
        }
    }

    /// Peak amplitude of the strip.
    ///
    /// The sample at the reported peak time bin. When no bin is reported or
    /// it lies outside the waveform, the waveform maximum. Zero for an empty
    /// waveform.
    #[must_use]
    pub fn peak_amplitude(&self) -> i32 {
        let samples = self.waveform.as_slice();
        usize::from(self.peak_timebin)
            .checked_sub(1)
            .and_then(|bin| samples.get(bin))
            .copied()
            .or_else(|| self.waveform.max())
            .map_or(0, i32::from)
    }

    /// Strip hit for clustering, tagged with `source_index`.
    #[must_use]
    pub fn to_strip_hit(&self, source_index: usize) -> RawStripHit {
        RawStripHit::new(i32::from(self.strip), self.peak_amplitude(), source_index)
    }

    /// Encodes the record into its binary layout.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];
        buf[0..4].copy_from_slice(&self.event_id.to_le_bytes());
        buf[4..12].copy_from_slice(&self.timestamp.to_le_bytes());
        buf[12] = self.detector;
        buf[13] = self.plane.code();
        buf[14] = self.peak_timebin;
        buf[15] = self.waveform.len;
        buf[16..18].copy_from_slice(&self.strip.to_le_bytes());
        for (i, sample) in self.waveform.samples.iter().enumerate() {
            let at = WAVEFORM_OFFSET + 2 * i;
            buf[at..at + 2].copy_from_slice(&sample.to_le_bytes());
        }
        buf
    }

    /// Decodes one record.
    ///
    /// # Errors
    /// Returns [`Error::BadRecord`] if `bytes` is not exactly [`RECORD_SIZE`]
    /// long, the plane code is unknown, or the time-bin count exceeds
    /// [`MAX_TIMEBINS`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let Ok(buf) = <&[u8; RECORD_SIZE]>::try_from(bytes) else {
            return Err(Error::BadRecord(format!(
                "expected {RECORD_SIZE} bytes, got {}",
                bytes.len()
            )));
        };

        let plane = Plane::from_code(buf[13])
            .ok_or_else(|| Error::BadRecord(format!("unknown plane code {}", buf[13])))?;
        let n_timebins = buf[15];
        if usize::from(n_timebins) > MAX_TIMEBINS {
            return Err(Error::BadRecord(format!(
                "{n_timebins} time bins exceed the maximum of {MAX_TIMEBINS}"
            )));
        }

        let mut samples = [0i16; MAX_TIMEBINS];
        for (i, sample) in samples.iter_mut().enumerate() {
            let at = WAVEFORM_OFFSET + 2 * i;
            *sample = i16::from_le_bytes([buf[at], buf[at + 1]]);
        }
        // Bins past n_timebins carry no data.
        samples[usize::from(n_timebins)..].fill(0);

        Ok(Self {
            event_id: u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
            timestamp: f64::from_le_bytes([
                buf[4], buf[5], buf[6], buf[7], buf[8], buf[9], buf[10], buf[11],
            ]),
            detector: buf[12],
            plane,
            strip: u16::from_le_bytes([buf[16], buf[17]]),
            peak_timebin: buf[14],
            waveform: Waveform {
                samples,
                len: n_timebins,
            },
        })
    }
}
