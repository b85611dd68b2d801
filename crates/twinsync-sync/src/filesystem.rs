//! Local filesystem adapter (secondary/driven adapter)
//!
//! Implements [`ILocalFileSystem`] on top of `std::fs`.
//!
//! ## Design Decisions
//!
//! - **Listings**: only real directories and regular files are reported.
//!   Symlinks and special files are skipped, as are names that are not
//!   valid UTF-8 or cannot form an entity path (a `\` inside the name, or
//!   the ledger's ignore suffix at its end).
//! - **Exclusive create**: `create_new` uses `O_EXCL` semantics so the node
//!   layer can probe for free temporary names.
//! - **Trash**: recoverable deletes follow the freedesktop.org trash layout
//!   (`files/` + `info/<name>.trashinfo`). A rename that crosses
//!   filesystems falls back to copy-then-remove.
//! - **Timestamps**: modification times are applied through `filetime`;
//!   creation times cannot be set on Linux and are ignored.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use filetime::FileTime;
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use twinsync_core::domain::RelativePath;
use twinsync_core::ports::{FileSystemState, ILocalFileSystem};

/// Upper bound on `name.N` suffixes tried when the trash already holds a name
const MAX_TRASH_SUFFIX: u32 = 10_000;

// ============================================================================
// LocalFileSystemAdapter struct
// ============================================================================

/// Adapter that bridges the [`ILocalFileSystem`] port to the real filesystem.
///
/// Stateless apart from the trash location; every operation takes absolute
/// paths.
#[derive(Debug, Clone, Default)]
pub struct LocalFileSystemAdapter {
    trash_dir: Option<PathBuf>,
}

impl LocalFileSystemAdapter {
    /// Create an adapter that trashes into `$XDG_DATA_HOME/Trash`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an adapter with an explicit trash directory.
    #[must_use]
    pub fn with_trash_dir(trash_dir: impl Into<PathBuf>) -> Self {
        Self {
            trash_dir: Some(trash_dir.into()),
        }
    }

    /// Resolved trash location
    pub fn trash_dir(&self) -> io::Result<PathBuf> {
        match &self.trash_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_local_dir()
                .map(|d| d.join("Trash"))
                .ok_or_else(|| io::Error::new(ErrorKind::NotFound, "no XDG data directory")),
        }
    }
}

// ============================================================================
// ILocalFileSystem implementation
// ============================================================================

impl ILocalFileSystem for LocalFileSystemAdapter {
    #[instrument(skip_all, fields(path = %path.display()))]
    fn get_state(&self, path: &Path) -> io::Result<FileSystemState> {
        let metadata = match fs::metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("path not found");
                return Ok(FileSystemState::not_found());
            }
            Err(e) => return Err(e),
        };

        let state = FileSystemState {
            exists: true,
            is_file: metadata.is_file(),
            size: if metadata.is_file() { metadata.len() } else { 0 },
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            created: metadata.created().ok().map(DateTime::<Utc>::from),
        };
        debug!(is_file = state.is_file, size = state.size, "state retrieved");
        Ok(state)
    }

    #[instrument(skip_all, fields(path = %path.display()))]
    fn list_directories(&self, path: &Path) -> io::Result<Vec<String>> {
        list_names(path, EntryKind::Directory)
    }

    #[instrument(skip_all, fields(path = %path.display()))]
    fn list_files(&self, path: &Path) -> io::Result<Vec<String>> {
        list_names(path, EntryKind::File)
    }

    #[instrument(skip_all, fields(path = %path.display(), offset = offset))]
    fn open_read(&self, path: &Path, offset: u64) -> io::Result<Box<dyn Read + Send>> {
        let mut file = File::open(path)?;
        if offset > 0 {
            file.seek(SeekFrom::Start(offset))?;
        }
        Ok(Box::new(file))
    }

    #[instrument(skip_all, fields(path = %path.display()))]
    fn create_new(&self, path: &Path) -> io::Result<Box<dyn Write + Send>> {
        let file = OpenOptions::new().write(true).create_new(true).open(path)?;
        debug!("file created");
        Ok(Box::new(BufWriter::new(file)))
    }

    #[instrument(skip_all, fields(path = %path.display()))]
    fn create_directory(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    #[instrument(skip_all, fields(from = %from.display(), to = %to.display()))]
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    #[instrument(skip_all, fields(path = %path.display()))]
    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    #[instrument(skip_all, fields(path = %path.display()))]
    fn remove_directory(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }

    #[instrument(skip_all, fields(path = %path.display()))]
    fn move_to_trash(&self, path: &Path) -> io::Result<()> {
        let trash = self.trash_dir()?;
        let files_dir = trash.join("files");
        let info_dir = trash.join("info");
        fs::create_dir_all(&files_dir)?;
        fs::create_dir_all(&info_dir)?;

        let original = absolute(path)?;
        let base = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| io::Error::new(ErrorKind::InvalidInput, "path has no file name"))?;

        let (name, info_path, mut info_file) = reserve_trash_name(&files_dir, &info_dir, base)?;
        let info = format!(
            "[Trash Info]\nPath={}\nDeletionDate={}\n",
            encode_trash_path(&original),
            Local::now().format("%Y-%m-%dT%H:%M:%S")
        );
        let moved = info_file
            .write_all(info.as_bytes())
            .and_then(|()| move_path(path, &files_dir.join(&name)));
        if let Err(e) = moved {
            if let Err(cleanup) = fs::remove_file(&info_path) {
                warn!(info = %info_path.display(), error = %cleanup, "could not remove trash info file");
            }
            return Err(e);
        }

        debug!(trashed_as = %name, "moved to trash");
        Ok(())
    }

    #[instrument(skip_all, fields(path = %path.display(), modified = %modified))]
    fn set_times(
        &self,
        path: &Path,
        modified: DateTime<Utc>,
        _created: Option<DateTime<Utc>>,
    ) -> io::Result<()> {
        let mtime = FileTime::from_unix_time(modified.timestamp(), modified.timestamp_subsec_nanos());
        filetime::set_file_mtime(path, mtime)
    }

    fn is_in_use(&self, path: &Path) -> bool {
        let Ok(cwd) = std::env::current_dir() else {
            return false;
        };
        let cwd = fs::canonicalize(&cwd).unwrap_or(cwd);
        let target = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        cwd.starts_with(&target)
    }
}

// ============================================================================
// Helpers
// ============================================================================

#[derive(Clone, Copy)]
enum EntryKind {
    Directory,
    File,
}

fn list_names(path: &Path, kind: EntryKind) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let wanted = match kind {
            EntryKind::Directory => file_type.is_dir(),
            EntryKind::File => file_type.is_file(),
        };
        if !wanted {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) if RelativePath::is_valid_segment(&name) => names.push(name),
            Ok(name) => warn!(dir = %path.display(), %name, "skipping entry with untrackable name"),
            Err(raw) => warn!(name = ?raw, "skipping entry with non UTF-8 name"),
        }
    }
    Ok(names)
}

fn absolute(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Claims a free name in the trash by exclusively creating its info file
fn reserve_trash_name(
    files_dir: &Path,
    info_dir: &Path,
    base: &str,
) -> io::Result<(String, PathBuf, File)> {
    for n in 0..MAX_TRASH_SUFFIX {
        let name = if n == 0 {
            base.to_string()
        } else {
            format!("{base}.{n}")
        };
        if files_dir.join(&name).symlink_metadata().is_ok() {
            continue;
        }
        let info_path = info_dir.join(format!("{name}.trashinfo"));
        match OpenOptions::new().write(true).create_new(true).open(&info_path) {
            Ok(file) => return Ok((name, info_path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }
    Err(io::Error::new(
        ErrorKind::AlreadyExists,
        format!("no free trash name for {base}"),
    ))
}

/// Percent-encodes a path for the `Path=` key of a trash info file
fn encode_trash_path(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Renames `from` to `to`, copying across filesystems when needed
fn move_path(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device(&e) => {
            debug!(from = %from.display(), to = %to.display(), "cross-device move, copying");
            copy_recursive(from, to)?;
            if fs::symlink_metadata(from)?.is_dir() {
                fs::remove_dir_all(from)
            } else {
                fs::remove_file(from)
            }
        }
        Err(e) => Err(e),
    }
}

fn is_cross_device(err: &io::Error) -> bool {
    #[cfg(unix)]
    {
        err.raw_os_error() == Some(libc::EXDEV)
    }
    #[cfg(not(unix))]
    {
        let _ = err;
        false
    }
}

fn copy_recursive(from: &Path, to: &Path) -> io::Result<()> {
    for entry in WalkDir::new(from) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| io::Error::new(ErrorKind::Other, e))?;
        let target = if relative.as_os_str().is_empty() {
            to.to_path_buf()
        } else {
            to.join(relative)
        };
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

// ============================================================================
// Unit tests
// ============================================================================
