//! gemstrip-io: Memory-mapped file I/O for gemstrip.
//!
//! This crate provides efficient raw and pre-clustered record reading using
//! memory-mapped files via memmap2, writers for raw records and reconstructed hits, and a
//! file-level reconstruction run.
//!

mod error;
pub mod pipeline;
mod reader;
mod writer;

pub use error::{Error, Result};
pub use pipeline::{RunProcessor, RunSummary};
pub use reader::{ClusterFileReader, MappedFileReader, RawFileReader, Records, ValidRecords};
pub use writer::{HitFileWriter, HitFormat, RawFileWriter, HIT_RECORD_SIZE};
