//! File variant of a syncable node
//!
//! Checksums stream the file in `buffer_size` chunks. Copies go through a
//! uniquely named temporary sibling of the destination, folding the rolling
//! checksum while writing, and only replace the destination once the whole
//! stream landed. A cancelled or failed copy removes its temporary file.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::TEMP_SUFFIX;
use crate::context::SyncContext;
use crate::domain::checksum::{compare_streams, read_chunk, CompareError, StreamSide};
use crate::domain::{EntityPath, NodeError, RelativePath, RollingChecksum, StreamComparison};
use crate::ports::{percent, ActionKind, FileSystemState, ILocalFileSystem};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    root: PathBuf,
    relative: RelativePath,
    checksum: Option<u64>,
}

impl FileNode {
    pub fn new(root: impl Into<PathBuf>, relative: RelativePath) -> Self {
        Self {
            root: root.into(),
            relative,
            checksum: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn relative_path(&self) -> &RelativePath {
        &self.relative
    }

    pub fn full_path(&self) -> PathBuf {
        self.relative.to_path(&self.root)
    }

    pub fn entity_path(&self) -> EntityPath {
        EntityPath::file(self.relative.clone())
    }

    pub fn cached_checksum(&self) -> Option<u64> {
        self.checksum
    }

    pub(crate) fn set_cached_checksum(&mut self, checksum: Option<u64>) {
        self.checksum = checksum;
    }

    /// Drops the memoized checksum so the next call recomputes it
    pub fn invalidate_checksum(&mut self) {
        self.checksum = None;
    }

    /// Live metadata query
    pub fn state(&self, fs: &dyn ILocalFileSystem) -> Result<FileSystemState, NodeError> {
        let path = self.full_path();
        fs.get_state(&path).map_err(|e| NodeError::from_io(e, &path))
    }

    pub fn exists(&self, fs: &dyn ILocalFileSystem) -> bool {
        match self.state(fs) {
            Ok(state) => state.is_regular_file(),
            Err(e) => {
                debug!(path = %self.full_path().display(), error = %e, "stat failed, treating as missing");
                false
            }
        }
    }

    /// Full checksum, streamed in chunks and memoized on the node
    pub fn checksum(&mut self, ctx: &mut SyncContext<'_>) -> Result<u64, NodeError> {
        if let Some(checksum) = self.checksum {
            return Ok(checksum);
        }

        let path = self.full_path();
        let fs = ctx.fs();
        let state = fs
            .get_state(&path)
            .map_err(|e| NodeError::from_read(e, &path))?;
        let mut reader = fs
            .open_read(&path, 0)
            .map_err(|e| NodeError::from_read(e, &path))?;

        let label = self.entity_path().encode();
        let mut buf = vec![0u8; ctx.buffer_size()];
        let mut sum = RollingChecksum::new();
        loop {
            let n = read_chunk(&mut reader, &mut buf).map_err(|e| NodeError::from_read(e, &path))?;
            sum.update(&buf[..n]);
            ctx.report(&label, ActionKind::Checksum, percent(sum.length(), state.size))?;
            if n < buf.len() {
                break;
            }
        }

        debug!(entity = %label, checksum = sum.value(), bytes = sum.length(), "checksum computed");
        self.checksum = Some(sum.value());
        Ok(sum.value())
    }

    /// True if the checksum differs from the ledger, or the ledger has no entry
    pub fn has_changed(&mut self, ctx: &mut SyncContext<'_>) -> Result<bool, NodeError> {
        let recorded = ctx.ledger().get(&self.entity_path());
        match recorded {
            None => Ok(true),
            Some(recorded) => Ok(self.checksum(ctx)? != recorded),
        }
    }

    /// Copies this file over `dest`, returning the checksum of the copied bytes
    pub fn copy_to(
        &mut self,
        dest: &mut FileNode,
        ctx: &mut SyncContext<'_>,
    ) -> Result<u64, NodeError> {
        let fs = ctx.fs();
        let source = self.full_path();
        let target = dest.full_path();

        let state = fs
            .get_state(&source)
            .map_err(|e| NodeError::from_read(e, &source))?;
        if !state.is_regular_file() {
            return Err(NodeError::ReadError {
                path: source,
                reason: "source file does not exist".to_string(),
            });
        }
        if dest.state(fs)?.is_directory() {
            return Err(NodeError::InvalidArgument(format!(
                "cannot copy file {} over folder {}",
                self.entity_path(),
                target.display()
            )));
        }

        let parent = target
            .parent()
            .ok_or_else(|| NodeError::InvalidPath(target.display().to_string()))?;
        fs.create_directory(parent)
            .map_err(|e| NodeError::from_io(e, parent))?;

        let (temp, writer) = create_temp_sibling(fs, &target, ctx.config().temp_name_attempts)?;
        debug!(source = %source.display(), temp = %temp.display(), "copying via temporary file");

        let written = self
            .stream_into(writer, &temp, state.size, ctx)
            .and_then(|checksum| replace_with(fs, &temp, &target).map(|()| checksum));
        let checksum = match written {
            Ok(checksum) => checksum,
            Err(e) => {
                discard_temp(fs, &temp);
                return Err(e);
            }
        };

        if let Some(modified) = state.modified {
            if let Err(e) = fs.set_times(&target, modified, state.created) {
                warn!(path = %target.display(), error = %e, "could not preserve timestamps");
            }
        }

        self.checksum = Some(checksum);
        dest.checksum = Some(checksum);
        Ok(checksum)
    }

    fn stream_into(
        &self,
        mut writer: Box<dyn Write + Send>,
        temp: &Path,
        total: u64,
        ctx: &mut SyncContext<'_>,
    ) -> Result<u64, NodeError> {
        let source = self.full_path();
        let mut reader = ctx
            .fs()
            .open_read(&source, 0)
            .map_err(|e| NodeError::from_read(e, &source))?;

        let label = self.entity_path().encode();
        let mut buf = vec![0u8; ctx.buffer_size()];
        let mut sum = RollingChecksum::new();
        loop {
            let n = read_chunk(&mut reader, &mut buf)
                .map_err(|e| NodeError::from_read(e, &source))?;
            sum.update(&buf[..n]);
            writer
                .write_all(&buf[..n])
                .map_err(|e| NodeError::from_io(e, temp))?;
            ctx.report(&label, ActionKind::Copy, percent(sum.length(), total))?;
            if n < buf.len() {
                break;
            }
        }
        writer.flush().map_err(|e| NodeError::from_io(e, temp))?;
        Ok(sum.value())
    }

    /// Deletes the file, through the trash when `recoverable`
    pub fn delete(&self, recoverable: bool, ctx: &mut SyncContext<'_>) -> Result<(), NodeError> {
        let path = self.full_path();
        let fs = ctx.fs();
        if !self.state(fs)?.is_regular_file() {
            return Err(NodeError::DirectoryDoesNotExist(path));
        }

        ctx.report(&self.entity_path().encode(), ActionKind::Delete, 0)?;
        let result = if recoverable {
            fs.move_to_trash(&path)
        } else {
            fs.remove_file(&path)
        };
        result.map_err(|e| NodeError::from_io(e, &path))
    }
}

/// Compares two files chunk by chunk, stopping at the first divergence
///
/// When both checksums are already memoized they are compared directly.
/// Otherwise both files are streamed in lockstep; if they match to the end,
/// both nodes keep the final value as their memoized checksum.
pub fn have_equal_checksums(
    left: &mut FileNode,
    right: &mut FileNode,
    ctx: &mut SyncContext<'_>,
) -> Result<bool, NodeError> {
    if let (Some(a), Some(b)) = (left.checksum, right.checksum) {
        return Ok(a == b);
    }

    let fs = ctx.fs();
    let left_path = left.full_path();
    let right_path = right.full_path();
    let total = fs
        .get_state(&left_path)
        .map_err(|e| NodeError::from_read(e, &left_path))?
        .size;
    let mut left_reader = fs
        .open_read(&left_path, 0)
        .map_err(|e| NodeError::from_read(e, &left_path))?;
    let mut right_reader = fs
        .open_read(&right_path, 0)
        .map_err(|e| NodeError::from_read(e, &right_path))?;

    let label = left.entity_path().encode();
    let chunk_size = ctx.buffer_size();
    let outcome = compare_streams(&mut left_reader, &mut right_reader, chunk_size, |done| {
        ctx.report(&label, ActionKind::Checksum, percent(done, total))
    });

    match outcome {
        Ok(StreamComparison::Equal(checksum)) => {
            left.checksum = Some(checksum);
            right.checksum = Some(checksum);
            Ok(true)
        }
        Ok(StreamComparison::Different) => Ok(false),
        Err(CompareError::Io(StreamSide::Left, e)) => Err(NodeError::from_read(e, &left_path)),
        Err(CompareError::Io(StreamSide::Right, e)) => Err(NodeError::from_read(e, &right_path)),
        Err(CompareError::Aborted(e)) => Err(e),
    }
}

/// Creates a free temporary file next to `target`
///
/// Names follow `.<name>.<random><TEMP_SUFFIX>`; at most `attempts` names
/// are probed.
fn create_temp_sibling(
    fs: &dyn ILocalFileSystem,
    target: &Path,
    attempts: u32,
) -> Result<(PathBuf, Box<dyn Write + Send>), NodeError> {
    let dir = target
        .parent()
        .ok_or_else(|| NodeError::InvalidPath(target.display().to_string()))?;
    let name = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| NodeError::InvalidPath(target.display().to_string()))?;

    for _ in 0..attempts {
        let short = &Uuid::new_v4().simple().to_string()[..8];
        let candidate = dir.join(format!(".{name}.{short}{TEMP_SUFFIX}"));

        let taken = fs
            .get_state(&candidate)
            .map(|s| s.exists)
            .map_err(|e| NodeError::from_io(e, &candidate))?;
        if taken {
            continue;
        }
        match fs.create_new(&candidate) {
            Ok(writer) => return Ok((candidate, writer)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(NodeError::from_io(e, &candidate)),
        }
    }

    Err(NodeError::TempNameExhausted {
        path: target.to_path_buf(),
        attempts,
    })
}

/// Replaces `target` with `temp`: delete-if-exists, then rename
fn replace_with(fs: &dyn ILocalFileSystem, temp: &Path, target: &Path) -> Result<(), NodeError> {
    let existing = fs
        .get_state(target)
        .map_err(|e| NodeError::from_io(e, target))?;
    if existing.is_regular_file() {
        fs.remove_file(target)
            .map_err(|e| NodeError::from_io(e, target))?;
    }
    fs.rename(temp, target)
        .map_err(|e| NodeError::from_io(e, target))
}

fn discard_temp(fs: &dyn ILocalFileSystem, temp: &Path) {
    match fs.remove_file(temp) {
        Ok(()) => debug!(temp = %temp.display(), "temporary file removed"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(temp = %temp.display(), error = %e, "could not remove temporary file"),
    }
}
