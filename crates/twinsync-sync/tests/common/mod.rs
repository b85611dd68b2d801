//! Shared fixtures for the twinsync-sync integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use filetime::FileTime;
use tempfile::TempDir;

use twinsync_core::config::SyncConfig;
use twinsync_core::domain::{Conflict, EntityPath};
use twinsync_core::ports::NoProgress;
use twinsync_sync::{LocalFileSystemAdapter, Partnership, SyncReport};

/// Two empty roots and a private trash inside one temporary directory
pub struct Fixture {
    pub dir: TempDir,
    pub left: PathBuf,
    pub right: PathBuf,
    pub trash: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let left = dir.path().join("left");
        let right = dir.path().join("right");
        let trash = dir.path().join("trash");
        fs::create_dir_all(&left).unwrap();
        fs::create_dir_all(&right).unwrap();
        Self {
            dir,
            left,
            right,
            trash,
        }
    }

    pub fn adapter(&self) -> Arc<LocalFileSystemAdapter> {
        Arc::new(LocalFileSystemAdapter::with_trash_dir(&self.trash))
    }

    pub fn partnership(&self) -> Partnership {
        self.partnership_with(SyncConfig::default())
    }

    pub fn partnership_with(&self, config: SyncConfig) -> Partnership {
        Partnership::new("test", &self.left, &self.right, self.adapter(), config).unwrap()
    }
}

/// Writes `content` at `path`, creating parent directories
pub fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

pub fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

/// Pins the modification time of `path` to `secs` after the epoch
pub fn set_mtime(path: &Path, secs: i64) {
    filetime::set_file_mtime(path, FileTime::from_unix_time(secs, 0)).unwrap();
}

/// Writes the same content on both sides with the same modification time
pub fn write_both(fixture: &Fixture, rel: &str, content: &str, mtime: i64) {
    for root in [&fixture.left, &fixture.right] {
        let path = root.join(rel);
        write(&path, content);
        set_mtime(&path, mtime);
    }
}

pub fn sync(partnership: &mut Partnership) -> SyncReport {
    partnership.sync(&mut NoProgress).unwrap()
}

pub fn entity(encoded: &str) -> EntityPath {
    EntityPath::decode(encoded).unwrap()
}

/// The conflict for `encoded`, panicking if the report has none
pub fn conflict<'a>(report: &'a SyncReport, encoded: &str) -> &'a Conflict {
    let wanted = entity(encoded);
    report
        .conflicts
        .iter()
        .find(|c| c.entity_path() == wanted)
        .unwrap_or_else(|| panic!("no conflict for {encoded}: {:?}", report.conflicts))
}
