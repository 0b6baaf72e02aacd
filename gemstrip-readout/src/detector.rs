//! Detector name to numeric id lookup.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One detector in the lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorEntry {
    /// Detector name, as used for clipboard keys.
    pub name: String,
    /// Numeric id carried by raw records.
    pub id: u8,
}

impl DetectorEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(name: impl Into<String>, id: u8) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }
}

/// Ordered table of detectors taking part in a run.
///
/// Table order is the order in which detectors are processed and reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetectorMap {
    entries: Vec<DetectorEntry>,
}

impl Default for DetectorMap {
    fn default() -> Self {
        Self::apv25_defaults()
    }
}

impl DetectorMap {
    /// Creates a validated table.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] on duplicate names or ids.
    pub fn new(entries: Vec<DetectorEntry>) -> Result<Self> {
        let map = Self { entries };
        map.validate()?;
        Ok(map)
    }

    /// Three-detector telescope read out with APV25 front ends.
    ///
    /// `GEMXY1 -> 0`, `GEMXY2 -> 1`, `GEMXY3 -> 2`.
    #[must_use]
    pub fn apv25_defaults() -> Self {
        Self {
            entries: vec![
                DetectorEntry::new("GEMXY1", 0),
                DetectorEntry::new("GEMXY2", 1),
                DetectorEntry::new("GEMXY3", 2),
            ],
        }
    }

    /// Four-detector telescope read out with VMM3a front ends.
    ///
    /// `GEMXY1 -> 1` through `GEMXY4 -> 4`.
    #[must_use]
    pub fn vmm3a_defaults() -> Self {
        Self {
            entries: (1..=4u8)
                .map(|id| DetectorEntry::new(format!("GEMXY{id}"), id))
                .collect(),
        }
    }

    /// Id for `name`.
    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<u8> {
        self.entries.iter().find(|e| e.name == name).map(|e| e.id)
    }

    /// Id for `name`, as an error if unknown.
    ///
    /// # Errors
    /// Returns [`Error::UnknownDetector`] if `name` is not in the table.
    pub fn require_id(&self, name: &str) -> Result<u8> {
        self.id_of(name)
            .ok_or_else(|| Error::UnknownDetector(name.to_owned()))
    }

    /// Name for `id`.
    #[must_use]
    pub fn name_of(&self, id: u8) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.name.as_str())
    }

    /// Entries in table order.
    #[must_use]
    pub fn entries(&self) -> &[DetectorEntry] {
        &self.entries
    }

    /// Number of detectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks that names and ids are unique and names non-empty.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] naming the offending entry.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        let mut ids = HashSet::new();
        for entry in &self.entries {
            if entry.name.is_empty() {
                return Err(Error::InvalidConfig("detector name is empty".into()));
            }
            if !names.insert(entry.name.as_str()) {
                return Err(Error::InvalidConfig(format!(
                    "duplicate detector name {}",
                    entry.name
                )));
            }
            if !ids.insert(entry.id) {
                return Err(Error::InvalidConfig(format!(
                    "duplicate detector id {} ({})",
                    entry.id, entry.name
                )));
            }
        }
        Ok(())
    }
}
