//! Memory-mapped record readers.

use crate::{Error, Result};
use gemstrip_readout::{
    ClusterEventBuilder, ClusterRecord, EventBuilder, EventWindow, RawStripRecord,
    CLUSTER_RECORD_SIZE, RECORD_SIZE,
};
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::slice::ChunksExact;

/// A memory-mapped file reader.
///
/// Uses memmap2 to access file contents without loading the entire file
/// into memory.
pub struct MappedFileReader {
    mmap: Mmap,
    path: PathBuf,
}

impl MappedFileReader {
    /// Opens a file for memory-mapped reading.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or memory-mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        // SAFETY: The file is opened read-only and we assume it is not modified concurrently.
        // This is the standard safety contract for memory mapping.
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self {
            mmap,
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Returns the file contents as a byte slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap[..]
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Returns true if the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// Path the file was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes of the fixed-size record at `index`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFormat`] if the record lies past the end of
    /// the file.
    pub fn record_bytes(&self, index: usize, record_size: usize) -> Result<&[u8]> {
        let out_of_range = || {
            Error::InvalidFormat(format!(
                "record {index} out of range ({} records)",
                self.len() / record_size.max(1)
            ))
        };
        let start = index.checked_mul(record_size).ok_or_else(out_of_range)?;
        let end = start.checked_add(record_size).ok_or_else(out_of_range)?;
        self.as_bytes().get(start..end).ok_or_else(out_of_range)
    }

    fn check_record_size(&self, record_size: usize) -> Result<()> {
        if self.len().is_multiple_of(record_size) {
            return Ok(());
        }
        Err(Error::InvalidFormat(format!(
            "file size {} is not a multiple of {record_size} (file: {})",
            self.len(),
            self.path.display()
        )))
    }
}

/// Iterator decoding records one by one.
pub struct Records<'a> {
    chunks: ChunksExact<'a, u8>,
    index: usize,
}

impl Iterator for Records<'_> {
    type Item = Result<RawStripRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk = self.chunks.next()?;
        let index = self.index;
        self.index += 1;
        let record = RawStripRecord::from_bytes(chunk)
            .map_err(|err| Error::InvalidFormat(format!("record {index}: {err}")));
        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

/// Records of a file that already passed [`RawFileReader::validate`].
pub struct ValidRecords<'a> {
    chunks: ChunksExact<'a, u8>,
}

impl Iterator for ValidRecords<'_> {
    type Item = RawStripRecord;

    fn next(&mut self) -> Option<Self::Item> {
        // Every chunk decoded once already; a failure here cannot happen.
        RawStripRecord::from_bytes(self.chunks.next()?).ok()
    }
}

/// A raw strip record file reader with memory-mapped I/O.
pub struct RawFileReader {
    reader: MappedFileReader,
}

impl RawFileReader {
    /// Opens a record file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be mapped or its size is not a
    /// multiple of the record size.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = MappedFileReader::open(path)?;
        reader.check_record_size(RECORD_SIZE)?;
        log::debug!(
            "mapped {} ({} records)",
            reader.path().display(),
            reader.len() / RECORD_SIZE
        );
        Ok(Self { reader })
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn file_size(&self) -> usize {
        self.reader.len()
    }

    /// Returns the number of records in the file.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.reader.len() / RECORD_SIZE
    }

    /// Path the file was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.reader.path()
    }

    /// Decodes the record at `index`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFormat`] if `index` is out of range or the
    /// record is malformed.
    pub fn record(&self, index: usize) -> Result<RawStripRecord> {
        let bytes = self.reader.record_bytes(index, RECORD_SIZE)?;
        RawStripRecord::from_bytes(bytes)
            .map_err(|err| Error::InvalidFormat(format!("record {index}: {err}")))
    }

    /// Iterates over all records, decoding lazily.
    #[must_use]
    pub fn records(&self) -> Records<'_> {
        Records {
            chunks: self.reader.as_bytes().chunks_exact(RECORD_SIZE),
            index: 0,
        }
    }

    /// Decodes every record.
    ///
    /// # Errors
    /// Returns the first malformed record.
    pub fn read_all(&self) -> Result<Vec<RawStripRecord>> {
        self.records().collect()
    }

    /// Checks that every record decodes.
    ///
    /// # Errors
    /// Returns the first malformed record.
    pub fn validate(&self) -> Result<()> {
        self.records().try_for_each(|record| record.map(|_| ()))
    }

    /// Streams the file as events.
    ///
    /// The file is validated first so a malformed record fails the run up
    /// front instead of mid-stream.
    ///
    /// # Errors
    /// Returns the first malformed record.
    pub fn events(&self, window: EventWindow) -> Result<EventBuilder<ValidRecords<'_>>> {
        self.validate()?;
        let records = ValidRecords {
            chunks: self.reader.as_bytes().chunks_exact(RECORD_SIZE),
        };
        Ok(EventBuilder::new(records, window))
    }
}

/// A pre-clustered record file reader with memory-mapped I/O.
///
/// Every byte pattern of the right length decodes, so the only format check
/// is the file size.
pub struct ClusterFileReader {
    reader: MappedFileReader,
}

impl ClusterFileReader {
    /// Opens a cluster record file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be mapped or its size is not a
    /// multiple of the cluster record size.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = MappedFileReader::open(path)?;
        reader.check_record_size(CLUSTER_RECORD_SIZE)?;
        log::debug!(
            "mapped {} ({} cluster records)",
            reader.path().display(),
            reader.len() / CLUSTER_RECORD_SIZE
        );
        Ok(Self { reader })
    }

    /// Returns the number of records in the file.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.reader.len() / CLUSTER_RECORD_SIZE
    }

    /// Path the file was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.reader.path()
    }

    /// Decodes the record at `index`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFormat`] if `index` is out of range.
    pub fn record(&self, index: usize) -> Result<ClusterRecord> {
        let bytes = self.reader.record_bytes(index, CLUSTER_RECORD_SIZE)?;
        Ok(ClusterRecord::from_bytes(bytes)?)
    }

    /// Iterates over all records.
    #[must_use]
    pub fn records(&self) -> impl Iterator<Item = ClusterRecord> + '_ {
        self.reader
            .as_bytes()
            .chunks_exact(CLUSTER_RECORD_SIZE)
            .filter_map(|chunk| ClusterRecord::from_bytes(chunk).ok())
    }

    /// Streams the file as time-window events of `duration` ns.
    #[must_use]
    pub fn events(
        &self,
        duration: f64,
    ) -> ClusterEventBuilder<impl Iterator<Item = ClusterRecord> + '_> {
        ClusterEventBuilder::new(self.records(), duration)
    }
}
