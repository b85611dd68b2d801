//! Conflict resolution executor
//!
//! Carries out a chosen [`SyncAction`] against the two nodes of a conflict
//! and keeps the checksum ledger in step:
//! - `CopyToLeft` / `CopyToRight`: copy, then record the new checksum
//! - `DeleteLeft` / `DeleteRight`: delete, then forget the entry
//! - `Ignore`: mark the entity so later syncs skip it
//! - `Merge`: always fails, content merge is not implemented

use tracing::{debug, info, warn};

use twinsync_core::domain::{Conflict, EntityKind, EntityPath, Resolved, SyncAction};
use twinsync_core::{SyncContext, SyncableNode};

use crate::error::ConflictError;

/// Result of a batch resolution operation
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub resolved: Vec<Resolved>,
    pub failed: u32,
    pub errors: Vec<String>,
}

impl BatchResult {
    pub fn resolved_count(&self) -> usize {
        self.resolved.len()
    }
}

/// Applies conflict resolutions with real file operations
///
/// Stateless: everything it touches arrives through the [`SyncContext`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictResolver;

impl ConflictResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolves `conflict` with an explicit action
    ///
    /// The conflict itself is left untouched, so a failed or cancelled
    /// resolution can be retried.
    pub fn resolve(
        &self,
        ctx: &mut SyncContext<'_>,
        conflict: &Conflict,
        action: SyncAction,
    ) -> Result<Resolved, ConflictError> {
        let entity = conflict.entity_path();
        info!(
            conflict_id = %conflict.id(),
            entity = %entity,
            action = %action,
            "Applying conflict resolution"
        );

        let mut left = conflict.left().clone();
        let mut right = conflict.right().clone();
        let recoverable = ctx.config().recoverable_delete;

        match action {
            SyncAction::CopyToLeft => {
                let checksum = right.copy_to(&mut left, ctx)?;
                record(ctx, &entity, checksum);
            }
            SyncAction::CopyToRight => {
                let checksum = left.copy_to(&mut right, ctx)?;
                record(ctx, &entity, checksum);
            }
            SyncAction::DeleteLeft => {
                left.delete(recoverable, ctx)?;
                forget(ctx, &entity);
            }
            SyncAction::DeleteRight => {
                right.delete(recoverable, ctx)?;
                forget(ctx, &entity);
            }
            SyncAction::Merge => {
                left.merge(&right)?;
            }
            SyncAction::Ignore => {
                ctx.ledger_mut().ignore(entity.clone());
                debug!(entity = %entity, "Entity marked as ignored");
            }
            SyncAction::Unknown => {
                warn!(entity = %entity, "Refusing to resolve with unknown action");
                return Err(ConflictError::InvalidAction(action));
            }
        }

        info!(entity = %entity, action = %action, "Conflict resolved");
        Ok(Resolved::new(left, right, action))
    }

    /// Resolves `conflict` with its auto action, or the current selection
    pub fn resolve_default(
        &self,
        ctx: &mut SyncContext<'_>,
        conflict: &Conflict,
    ) -> Result<Resolved, ConflictError> {
        self.resolve(ctx, conflict, conflict.chosen_action())
    }

    /// Resolves `conflict` after validating `action` against its legal set
    pub fn resolve_with_choice(
        &self,
        ctx: &mut SyncContext<'_>,
        conflict: &mut Conflict,
        action: SyncAction,
    ) -> Result<Resolved, ConflictError> {
        conflict.select(action)?;
        self.resolve(ctx, conflict, action)
    }

    /// Resolves every conflict with its chosen action
    ///
    /// Failures are collected and the batch moves on, except for a
    /// cancellation, which stops the batch and is returned as an error.
    pub fn resolve_batch(
        &self,
        ctx: &mut SyncContext<'_>,
        conflicts: &[Conflict],
    ) -> Result<BatchResult, ConflictError> {
        let mut result = BatchResult::default();

        for conflict in conflicts {
            match self.resolve_default(ctx, conflict) {
                Ok(resolved) => result.resolved.push(resolved),
                Err(e) if e.is_cancelled() => {
                    info!(
                        resolved = result.resolved.len(),
                        remaining = conflicts.len() - result.resolved.len() - result.failed as usize,
                        "Batch resolution cancelled"
                    );
                    return Err(e);
                }
                Err(e) => {
                    warn!(entity = %conflict.entity_path(), error = %e, "Batch resolution failed for item");
                    result.failed += 1;
                    result.errors.push(format!("{}: {e}", conflict.entity_path()));
                }
            }
        }

        Ok(result)
    }
}

/// Records the post-copy checksum; a copied folder's subtree entries go stale
fn record(ctx: &mut SyncContext<'_>, entity: &EntityPath, checksum: u64) {
    let ledger = ctx.ledger_mut();
    if entity.kind() == EntityKind::Folder {
        let dropped = ledger.remove_descendants(entity);
        if dropped > 0 {
            debug!(entity = %entity, dropped, "Dropped ledger entries below copied folder");
        }
    }
    ledger.record(entity.clone(), checksum);
}

/// Removes the entry of a deleted entity, and of its subtree for folders
fn forget(ctx: &mut SyncContext<'_>, entity: &EntityPath) {
    let ledger = ctx.ledger_mut();
    ledger.remove(entity);
    if entity.kind() == EntityKind::Folder {
        ledger.remove_descendants(entity);
    }
}

/// Builds the node pair for an entity under two roots
pub fn nodes_for(
    left_root: &std::path::Path,
    right_root: &std::path::Path,
    entity: &EntityPath,
) -> (SyncableNode, SyncableNode) {
    (
        SyncableNode::from_entity(left_root, entity),
        SyncableNode::from_entity(right_root, entity),
    )
}
