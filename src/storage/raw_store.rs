use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StorageError;
use crate::records::RawRecord;

/// JSON snapshot store for raw ingest output
///
/// Each snapshot is `{root}/raw/{name}.json`, a JSON array of records.
#[derive(Debug, Clone)]
pub struct RawStore {
    root: PathBuf,
}

impl RawStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join("raw").join(format!("{name}.json"))
    }

    /// Save records under `name`, replacing any previous snapshot
    pub fn save_raw(&self, records: &[RawRecord], name: &str) -> Result<PathBuf, StorageError> {
        let path = self.path_for(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write next to the target and rename so readers never see a partial file
        let tmp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string(records)?;
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &path)?;

        log::debug!("Saved {} records to {}", records.len(), path.display());
        Ok(path)
    }

    /// Load the snapshot saved under `name`
    ///
    /// A missing snapshot loads as empty; callers decide whether that is fatal.
    pub fn load_raw(&self, name: &str) -> Result<Vec<RawRecord>, StorageError> {
        let path = self.path_for(name);
        if !Path::new(&path).exists() {
            log::info!("No existing snapshot file found: {}", path.display());
            return Ok(Vec::new());
        }

        let json = fs::read_to_string(&path)?;
        let records: Vec<RawRecord> = serde_json::from_str(&json)?;

        log::info!("Loaded {} records from {}", records.len(), path.display());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn records(values: serde_json::Value) -> Vec<RawRecord> {
        serde_json::from_value(values).unwrap()
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let store = RawStore::new(dir.path());
        let input = records(json!([
            {"tri_facility_id": "A1", "pref_latitude": 34.1},
            {"tri_facility_id": "B2", "pref_latitude": null}
        ]));

        let path = store.save_raw(&input, "tri_facilities").unwrap();

        assert_eq!(path, dir.path().join("raw/tri_facilities.json"));
        assert_eq!(store.load_raw("tri_facilities").unwrap(), input);
    }

    #[test]
    fn test_save_overwrites_previous_snapshot() {
        let dir = tempdir().unwrap();
        let store = RawStore::new(dir.path());

        store.save_raw(&records(json!([{"a": 1}, {"a": 2}])), "ghg_emissions").unwrap();
        store.save_raw(&records(json!([{"a": 3}])), "ghg_emissions").unwrap();

        let loaded = store.load_raw("ghg_emissions").unwrap();
        assert_eq!(loaded, records(json!([{"a": 3}])));
        assert!(!dir.path().join("raw/ghg_emissions.json.tmp").exists());
    }

    #[test]
    fn test_missing_snapshot_loads_empty() {
        let dir = tempdir().unwrap();
        let store = RawStore::new(dir.path());

        assert!(store.load_raw("never_saved").unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_snapshot_is_an_error() {
        let dir = tempdir().unwrap();
        let store = RawStore::new(dir.path());
        fs::create_dir_all(dir.path().join("raw")).unwrap();
        fs::write(store.path_for("broken"), "{not json").unwrap();

        assert!(matches!(
            store.load_raw("broken"),
            Err(StorageError::Serialization(_))
        ));
    }
}
