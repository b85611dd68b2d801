//! Checksum ledger
//!
//! The only memory a partnership keeps of prior synchronizations: the last
//! agreed checksum per [`EntityPath`], plus the set of paths the user asked
//! to stop tracking.
//!
//! Presence of a key means the node was observed in sync, or resolved, as of
//! the last successful sync. Absence means it was never recorded, which the
//! engines read as "new".
//!
//! ## Serialized form
//!
//! A flat map from encoded entity path to checksum. Ignored paths are written
//! as the encoded path followed by [`IGNORE_SUFFIX`], with value `0`. No
//! [`EntityPath`] can end with the suffix, so the two kinds of key never
//! collide.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::EntityPath;

/// Reserved suffix marking an ignored entity in the serialized ledger
pub const IGNORE_SUFFIX: &str = "|ignored";

/// Mapping from entity path to last synchronized checksum
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, u64>", into = "BTreeMap<String, u64>")]
pub struct ChecksumLedger {
    entries: BTreeMap<EntityPath, u64>,
    ignored: BTreeSet<EntityPath>,
}

impl ChecksumLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last recorded checksum, `None` if the path was never recorded
    #[must_use]
    pub fn get(&self, path: &EntityPath) -> Option<u64> {
        self.entries.get(path).copied()
    }

    #[must_use]
    pub fn contains(&self, path: &EntityPath) -> bool {
        self.entries.contains_key(path)
    }

    /// Records `checksum` as the agreed state of `path`
    ///
    /// Returns the previous value. Ignored paths are not tracked; recording
    /// one is a no-op.
    pub fn record(&mut self, path: EntityPath, checksum: u64) -> Option<u64> {
        if self.ignored.contains(&path) {
            return None;
        }
        self.entries.insert(path, checksum)
    }

    /// Records only if there is no entry yet; returns true if recorded
    pub fn record_if_absent(&mut self, path: &EntityPath, checksum: u64) -> bool {
        if self.ignored.contains(path) || self.entries.contains_key(path) {
            return false;
        }
        self.entries.insert(path.clone(), checksum);
        true
    }

    pub fn remove(&mut self, path: &EntityPath) -> Option<u64> {
        self.entries.remove(path)
    }

    /// Removes every entry strictly below `folder`; returns how many
    pub fn remove_descendants(&mut self, folder: &EntityPath) -> usize {
        let before = self.entries.len();
        self.entries.retain(|path, _| !path.is_descendant_of(folder));
        before - self.entries.len()
    }

    /// Stops tracking `path` and hides it from future traversals
    pub fn ignore(&mut self, path: EntityPath) {
        self.entries.remove(&path);
        self.ignored.insert(path);
    }

    /// Resumes tracking a previously ignored path
    pub fn unignore(&mut self, path: &EntityPath) -> bool {
        self.ignored.remove(path)
    }

    #[must_use]
    pub fn is_ignored(&self, path: &EntityPath) -> bool {
        self.ignored.contains(path)
    }

    /// Tracked entity paths, in order
    pub fn paths(&self) -> impl Iterator<Item = &EntityPath> {
        self.entries.keys()
    }

    /// Ignored entity paths, in order
    pub fn ignored(&self) -> impl Iterator<Item = &EntityPath> {
        self.ignored.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TryFrom<BTreeMap<String, u64>> for ChecksumLedger {
    type Error = DomainError;

    fn try_from(raw: BTreeMap<String, u64>) -> Result<Self, Self::Error> {
        let mut ledger = ChecksumLedger::new();
        for (key, checksum) in raw {
            match key.strip_suffix(IGNORE_SUFFIX) {
                Some(path) => {
                    if checksum != 0 {
                        return Err(DomainError::InvalidPath(format!(
                            "ignore marker '{key}' must have value 0, found {checksum}"
                        )));
                    }
                    ledger.ignored.insert(EntityPath::decode(path)?);
                }
                None => {
                    ledger.entries.insert(EntityPath::decode(&key)?, checksum);
                }
            }
        }
        Ok(ledger)
    }
}

impl From<ChecksumLedger> for BTreeMap<String, u64> {
    fn from(ledger: ChecksumLedger) -> Self {
        let mut raw: BTreeMap<String, u64> = ledger
            .entries
            .into_iter()
            .map(|(path, checksum)| (path.encode(), checksum))
            .collect();
        for path in ledger.ignored {
            raw.insert(format!("{}{IGNORE_SUFFIX}", path.encode()), 0);
        }
        raw
    }
}
