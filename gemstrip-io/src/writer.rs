//! File writers for raw records and reconstructed hits.

use crate::Result;
use gemstrip_core::Hit2D;
use gemstrip_readout::RawStripRecord;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Size in bytes of one binary hit row.
pub const HIT_RECORD_SIZE: usize = 53;

const CSV_HEADER: &str = "event,detector,x,y,charge,cluster_size,charge_ratio,timestamp";

/// Writer for raw strip record files.
pub struct RawFileWriter {
    writer: BufWriter<File>,
    records_written: u64,
}

impl RawFileWriter {
    /// Creates a new file writer.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            records_written: 0,
        })
    }

    /// Appends one record.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub fn write_record(&mut self, record: &RawStripRecord) -> Result<()> {
        self.writer.write_all(&record.to_bytes())?;
        self.records_written += 1;
        Ok(())
    }

    /// Appends records in order.
    ///
    /// # Errors
    /// Returns an error if a write fails.
    pub fn write_records(&mut self, records: &[RawStripRecord]) -> Result<()> {
        for record in records {
            self.write_record(record)?;
        }
        Ok(())
    }

    /// Records written so far.
    #[must_use]
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Flushes the writer.
    ///
    /// # Errors
    /// Returns an error if the flush fails.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Output layout for reconstructed hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitFormat {
    /// `event,detector,x,y,charge,cluster_size,charge_ratio,timestamp`
    /// with a header row.
    Csv,
    /// Little-endian rows of [`HIT_RECORD_SIZE`] bytes: u64 (event) +
    /// u8 (detector) + f64 (x) + f64 (y) + i64 (charge) + u32 (cluster size) +
    /// f64 (charge ratio) + f64 (timestamp).
    Binary,
}

impl HitFormat {
    /// CSV for a `.csv` extension, binary otherwise.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::Binary,
        }
    }
}

/// Writer for reconstructed 2D hits.
pub struct HitFileWriter {
    writer: BufWriter<File>,
    format: HitFormat,
    hits_written: u64,
}

impl HitFileWriter {
    /// Creates a new hit file. CSV files get their header row immediately.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P, format: HitFormat) -> Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        if format == HitFormat::Csv {
            writeln!(writer, "{CSV_HEADER}")?;
        }
        Ok(Self {
            writer,
            format,
            hits_written: 0,
        })
    }

    /// Output layout.
    #[must_use]
    pub fn format(&self) -> HitFormat {
        self.format
    }

    /// Appends one detector's hits for one event.
    ///
    /// # Errors
    /// Returns an error if a write fails.
    pub fn write_hits(&mut self, event: u64, detector: u8, hits: &[Hit2D]) -> Result<()> {
        for hit in hits {
            match self.format {
                HitFormat::Csv => writeln!(
                    self.writer,
                    "{},{},{},{},{},{},{},{}",
                    event,
                    detector,
                    hit.x,
                    hit.y,
                    hit.charge,
                    hit.cluster_size,
                    hit.charge_ratio,
                    hit.timestamp
                )?,
                HitFormat::Binary => {
                    let cluster_size = u32::try_from(hit.cluster_size).unwrap_or(u32::MAX);
                    self.writer.write_all(&event.to_le_bytes())?;
                    self.writer.write_all(&[detector])?;
                    self.writer.write_all(&hit.x.to_le_bytes())?;
                    self.writer.write_all(&hit.y.to_le_bytes())?;
                    self.writer.write_all(&hit.charge.to_le_bytes())?;
                    self.writer.write_all(&cluster_size.to_le_bytes())?;
                    self.writer.write_all(&hit.charge_ratio.to_le_bytes())?;
                    self.writer.write_all(&hit.timestamp.to_le_bytes())?;
                }
            }
        }
        self.hits_written += hits.len() as u64;
        Ok(())
    }

    /// Hits written so far.
    #[must_use]
    pub fn hits_written(&self) -> u64 {
        self.hits_written
    }

    /// Flushes the writer.
    ///
    /// # Errors
    /// Returns an error if the flush fails.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
