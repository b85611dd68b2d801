//! Partnership store
//!
//! Every partnership, ledger included, lives in one JSON document. Saves
//! write a sibling temporary file and rename it over the store, so a crash
//! leaves either the old or the new document on disk.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::partnership::PartnershipRecord;
use crate::SyncError;

const STORE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreDocument {
    version: u32,
    #[serde(default)]
    partnerships: Vec<PartnershipRecord>,
}

/// JSON file holding all partnership records
#[derive(Debug, Clone)]
pub struct PartnershipStore {
    path: PathBuf,
}

impl PartnershipStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads every record; a missing store file is an empty store
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> Result<Vec<PartnershipRecord>, SyncError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("store file not found, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.error(e)),
        };
        let document: StoreDocument = serde_json::from_str(&content).map_err(|e| self.error(e))?;
        if document.version > STORE_VERSION {
            return Err(self.error(format!(
                "store version {} is newer than supported version {STORE_VERSION}",
                document.version
            )));
        }
        debug!(partnerships = document.partnerships.len(), "store loaded");
        Ok(document.partnerships)
    }

    /// Replaces the store contents with `records`
    #[instrument(skip(self, records), fields(path = %self.path.display(), count = records.len()))]
    pub fn save(&self, records: &[PartnershipRecord]) -> Result<(), SyncError> {
        let document = StoreDocument {
            version: STORE_VERSION,
            partnerships: records.to_vec(),
        };
        let json = serde_json::to_string_pretty(&document).map_err(|e| self.error(e))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.error(e))?;
        }
        let tmp_path = {
            let mut p = self.path.as_os_str().to_owned();
            p.push(".tmp");
            PathBuf::from(p)
        };
        fs::write(&tmp_path, json).map_err(|e| self.error(e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| self.error(e))?;
        debug!("store saved");
        Ok(())
    }

    /// Looks up a record by name
    pub fn get(&self, name: &str) -> Result<PartnershipRecord, SyncError> {
        self.load()?
            .into_iter()
            .find(|r| r.name == name)
            .ok_or_else(|| SyncError::PartnershipNotFound(name.to_string()))
    }

    /// Adds a record; the name must be free
    pub fn insert(&self, record: PartnershipRecord) -> Result<(), SyncError> {
        let mut records = self.load()?;
        if records.iter().any(|r| r.name == record.name) {
            return Err(SyncError::PartnershipExists(record.name));
        }
        records.push(record);
        self.save(&records)
    }

    /// Replaces the record with the same name, or adds it
    pub fn upsert(&self, record: PartnershipRecord) -> Result<(), SyncError> {
        let mut records = self.load()?;
        match records.iter_mut().find(|r| r.name == record.name) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        self.save(&records)
    }

    /// Removes a record by name
    pub fn remove(&self, name: &str) -> Result<PartnershipRecord, SyncError> {
        let mut records = self.load()?;
        let index = records
            .iter()
            .position(|r| r.name == name)
            .ok_or_else(|| SyncError::PartnershipNotFound(name.to_string()))?;
        let removed = records.remove(index);
        self.save(&records)?;
        Ok(removed)
    }

    fn error(&self, reason: impl ToString) -> SyncError {
        SyncError::Store {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;
    use twinsync_core::domain::{ChecksumLedger, EntityPath};

    use super::*;

    fn record(name: &str) -> PartnershipRecord {
        PartnershipRecord {
            name: name.to_string(),
            left: PathBuf::from("/data/left"),
            right: PathBuf::from("/data/right"),
            ledger: ChecksumLedger::new(),
        }
    }

    #[test]
    fn test_missing_store_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = PartnershipStore::new(dir.path().join("none.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load_with_ledger() {
        let dir = TempDir::new().unwrap();
        let store = PartnershipStore::new(dir.path().join("nested/store.json"));

        let mut rec = record("photos");
        rec.ledger
            .record(EntityPath::decode("file:\\a\\b.txt").unwrap(), 99);
        rec.ledger.ignore(EntityPath::decode("folder:\\tmp").unwrap());
        store.insert(rec.clone()).unwrap();

        let loaded = store.get("photos").unwrap();
        assert_eq!(loaded, rec);

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains(r#""file:\\a\\b.txt": 99"#));
        assert!(raw.contains(r#""folder:\\tmp|ignored": 0"#));
        assert!(!dir.path().join("nested/store.json.tmp").exists());
    }

    #[test]
    fn test_insert_duplicate_rejected() {
        let dir = TempDir::new().unwrap();
        let store = PartnershipStore::new(dir.path().join("store.json"));
        store.insert(record("docs")).unwrap();

        let result = store.insert(record("docs"));
        assert!(matches!(result, Err(SyncError::PartnershipExists(n)) if n == "docs"));
    }

    #[test]
    fn test_upsert_replaces() {
        let dir = TempDir::new().unwrap();
        let store = PartnershipStore::new(dir.path().join("store.json"));
        store.insert(record("docs")).unwrap();

        let mut updated = record("docs");
        updated.right = PathBuf::from("/elsewhere");
        store.upsert(updated).unwrap();

        let all = store.load().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].right, PathBuf::from("/elsewhere"));
    }

    #[test]
    fn test_remove() {
        let dir = TempDir::new().unwrap();
        let store = PartnershipStore::new(dir.path().join("store.json"));
        store.insert(record("a")).unwrap();
        store.insert(record("b")).unwrap();

        let removed = store.remove("a").unwrap();
        assert_eq!(removed.name, "a");
        assert_eq!(store.load().unwrap().len(), 1);
        assert!(matches!(
            store.remove("a"),
            Err(SyncError::PartnershipNotFound(_))
        ));
    }

    #[test]
    fn test_corrupt_store_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{ not json").unwrap();

        let result = PartnershipStore::new(path).load();
        assert!(matches!(result, Err(SyncError::Store { .. })));
    }
}
