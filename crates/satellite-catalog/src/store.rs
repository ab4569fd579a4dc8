//! JSON-backed element-set catalog with keep-latest merging.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::warn;

use orbital_mechanics::ElementSet;

use crate::Result;

/// One catalog object: a name plus its most recent TLE.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    pub name: String,
    pub tle_line1: String,
    pub tle_line2: String,
}

/// Catalog persistence rooted at a single JSON file.
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all entries; a missing file is an empty catalog.
    pub fn load(&self) -> Result<Vec<CatalogEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    pub fn save(&self, entries: &[CatalogEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(&self.path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), entries)?;
        Ok(())
    }

    /// Parse entries into element sets, dropping (and logging) any whose TLE
    /// no longer validates.
    pub fn element_sets(&self) -> Result<Vec<ElementSet>> {
        let entries = self.load()?;
        let mut sets = Vec::with_capacity(entries.len());

        for entry in &entries {
            match ElementSet::from_tle(&entry.name, &entry.tle_line1, &entry.tle_line2) {
                Ok(set) => sets.push(set),
                Err(e) => warn!("Dropping catalog entry {}: {}", entry.name, e),
            }
        }

        Ok(sets)
    }
}

/// Merge freshly fetched entries over an existing catalog, keeping the
/// incoming version wherever a name appears in both.
pub fn merge_keep_latest(
    existing: Vec<CatalogEntry>,
    incoming: Vec<CatalogEntry>,
) -> Vec<CatalogEntry> {
    let mut by_name: HashMap<String, CatalogEntry> = existing
        .into_iter()
        .map(|e| (e.name.clone(), e))
        .collect();

    for entry in incoming {
        by_name.insert(entry.name.clone(), entry);
    }

    let mut merged: Vec<CatalogEntry> = by_name.into_values().collect();
    merged.sort_by(|a, b| a.name.cmp(&b.name));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISS_LINE1: &str = "1 25544U 98067A   24085.54791667  .00001264  00000-0  32228-4 0  9998";
    const ISS_LINE2: &str = "2 25544  51.6441  37.4421 0005611  34.1196 326.0046 15.49819063501318";

    fn entry(name: &str, line1: &str, line2: &str) -> CatalogEntry {
        CatalogEntry {
            name: name.to_string(),
            tle_line1: line1.to_string(),
            tle_line2: line2.to_string(),
        }
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CatalogStore::new(dir.path().join("catalog.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = CatalogStore::new(dir.path().join("catalog.json"));

        let entries = vec![entry("ISS (ZARYA)", ISS_LINE1, ISS_LINE2)];
        store.save(&entries).unwrap();
        assert_eq!(store.load().unwrap(), entries);
    }

    #[test]
    fn merge_prefers_incoming_entries() {
        let old = vec![
            entry("ISS (ZARYA)", "old1", "old2"),
            entry("NOAA 15", "n1", "n2"),
        ];
        let new = vec![entry("ISS (ZARYA)", ISS_LINE1, ISS_LINE2)];

        let merged = merge_keep_latest(old, new);
        assert_eq!(merged.len(), 2);

        let iss = merged.iter().find(|e| e.name == "ISS (ZARYA)").unwrap();
        assert_eq!(iss.tle_line1, ISS_LINE1);
        assert!(merged.iter().any(|e| e.name == "NOAA 15"));
    }

    #[test]
    fn invalid_entries_are_dropped_from_element_sets() {
        let dir = tempfile::tempdir().unwrap();
        let store = CatalogStore::new(dir.path().join("catalog.json"));

        store
            .save(&[
                entry("ISS (ZARYA)", ISS_LINE1, ISS_LINE2),
                entry("JUNK", "not a tle", "still not"),
            ])
            .unwrap();

        let sets = store.element_sets().unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].norad_id, 25544);
    }
}
