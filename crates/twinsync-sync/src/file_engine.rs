//! Single-file comparison
//!
//! Decides, for one entity present under both roots, whether the two sides
//! agree and, if not, what the safe or suggested action is. The left side is
//! always the first argument; the outcome is not symmetric in its inputs.
//!
//! Decision table:
//!
//! | left | right | ledger / change state                 | outcome                   |
//! |------|-------|---------------------------------------|---------------------------|
//! | no   | no    | -                                     | nothing                   |
//! | yes  | yes   | same length and mtime, or same bytes  | in sync (entry recorded)  |
//! | yes  | yes   | only right changed                    | auto `CopyToLeft`         |
//! | yes  | yes   | only left changed                     | auto `CopyToRight`        |
//! | yes  | yes   | both changed, left older              | suggest `CopyToLeft`      |
//! | yes  | yes   | both changed, right older             | suggest `CopyToRight`     |
//! | yes  | yes   | both changed, same mtime              | undecided                 |
//! | yes  | no    | no entry                              | auto `CopyToRight`        |
//! | yes  | no    | entry equals left checksum            | auto `DeleteLeft`         |
//! | yes  | no    | entry differs                         | undecided                 |
//!
//! The right-only rows mirror the left-only ones.

use std::cmp::Ordering;

use tracing::debug;

use twinsync_core::domain::{Conflict, NodeError, Presence, SyncAction, Verdict};
use twinsync_core::ports::FileSystemState;
use twinsync_core::syncable::{have_equal_checksums, FileNode};
use twinsync_core::{SyncContext, SyncableNode};

/// What comparing one file pair produced
#[derive(Debug)]
pub enum FileComparison {
    /// Neither side has the file
    Missing,
    /// The entity is on the ignore list
    Ignored,
    /// Both sides agree; `recorded` is true if a ledger entry was added
    InSync { recorded: bool },
    /// The sides diverge
    Diverged(Conflict),
}

impl FileComparison {
    pub fn into_conflict(self) -> Option<Conflict> {
        match self {
            FileComparison::Diverged(conflict) => Some(conflict),
            _ => None,
        }
    }
}

/// Compares one file across both roots
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSyncEngine;

impl FileSyncEngine {
    pub fn new() -> Self {
        Self
    }

    /// Compares `left` against `right`, returning the conflict if they diverge
    pub fn sync(
        &self,
        left: &mut FileNode,
        right: &mut FileNode,
        ctx: &mut SyncContext<'_>,
    ) -> Result<Option<Conflict>, NodeError> {
        self.compare(left, right, ctx).map(FileComparison::into_conflict)
    }

    /// Full outcome of a comparison, including the in-sync and skipped cases
    pub fn compare(
        &self,
        left: &mut FileNode,
        right: &mut FileNode,
        ctx: &mut SyncContext<'_>,
    ) -> Result<FileComparison, NodeError> {
        let entity = left.entity_path();
        if ctx.ledger().is_ignored(&entity) {
            debug!(entity = %entity, "skipping ignored file");
            return Ok(FileComparison::Ignored);
        }

        let fs = ctx.fs();
        let left_state = left.state(fs)?;
        let right_state = right.state(fs)?;

        match (left_state.is_regular_file(), right_state.is_regular_file()) {
            (false, false) => Ok(FileComparison::Missing),
            (true, true) => compare_present(left, right, &left_state, &right_state, ctx),
            (true, false) => {
                let verdict = one_sided(left, SyncAction::CopyToRight, SyncAction::DeleteLeft, ctx)?;
                Ok(diverged(left, right, Presence::new(true, false), verdict))
            }
            (false, true) => {
                let verdict = one_sided(right, SyncAction::CopyToLeft, SyncAction::DeleteRight, ctx)?;
                Ok(diverged(left, right, Presence::new(false, true), verdict))
            }
        }
    }
}

fn compare_present(
    left: &mut FileNode,
    right: &mut FileNode,
    left_state: &FileSystemState,
    right_state: &FileSystemState,
    ctx: &mut SyncContext<'_>,
) -> Result<FileComparison, NodeError> {
    let entity = left.entity_path();
    let same_length = left_state.size == right_state.size;
    let same_mtime = left_state.modified.is_some() && left_state.modified == right_state.modified;

    let in_sync = (same_length && same_mtime)
        || (same_length && have_equal_checksums(left, right, ctx)?);
    if in_sync {
        let mut recorded = false;
        if !ctx.ledger().contains(&entity) {
            let checksum = left.checksum(ctx)?;
            recorded = ctx.ledger_mut().record_if_absent(&entity, checksum);
            debug!(entity = %entity, checksum, "in sync, ledger entry recorded");
        }
        return Ok(FileComparison::InSync { recorded });
    }

    let left_changed = left.has_changed(ctx)?;
    let right_changed = right.has_changed(ctx)?;

    let verdict = match (left_changed, right_changed) {
        (false, true) => Verdict::auto(SyncAction::CopyToLeft),
        (true, false) => Verdict::auto(SyncAction::CopyToRight),
        _ => match left_state.modified.cmp(&right_state.modified) {
            Ordering::Less => Verdict::suggest(SyncAction::CopyToLeft),
            Ordering::Greater => Verdict::suggest(SyncAction::CopyToRight),
            Ordering::Equal => Verdict::undecided(),
        },
    };
    debug!(
        entity = %entity,
        left_changed,
        right_changed,
        auto = %verdict.auto_resolve,
        "files diverge"
    );
    Ok(diverged(left, right, Presence::new(true, true), verdict))
}

/// Verdict when only `present` exists
///
/// No ledger entry means the file is new; an entry matching the present
/// side means the other side deleted it.
fn one_sided(
    present: &mut FileNode,
    copy: SyncAction,
    delete: SyncAction,
    ctx: &mut SyncContext<'_>,
) -> Result<Verdict, NodeError> {
    let entity = present.entity_path();
    let recorded = ctx.ledger().get(&entity);
    let verdict = match recorded {
        None => Verdict::auto(copy),
        Some(recorded) if present.checksum(ctx)? == recorded => Verdict::auto(delete),
        Some(_) => Verdict::undecided(),
    };
    debug!(entity = %entity, auto = %verdict.auto_resolve, "file present on one side only");
    Ok(verdict)
}

fn diverged(left: &FileNode, right: &FileNode, presence: Presence, verdict: Verdict) -> FileComparison {
    FileComparison::Diverged(Conflict::new(
        SyncableNode::File(left.clone()),
        SyncableNode::File(right.clone()),
        presence,
        verdict,
    ))
}
