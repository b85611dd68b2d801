//! Conflict use cases - orchestrate partitioning and resolution
//!
//! The sync engines hand back every divergence they found. These helpers
//! split that list into what can be applied unattended and what needs the
//! user, and apply the former.

use tracing::info;

use twinsync_core::domain::Conflict;
use twinsync_core::SyncContext;

use crate::error::ConflictError;
use crate::resolver::{BatchResult, ConflictResolver};

/// Splits conflicts into `(auto_resolvable, needs_input)`, keeping order
pub fn partition_auto_resolvable(conflicts: Vec<Conflict>) -> (Vec<Conflict>, Vec<Conflict>) {
    conflicts.into_iter().partition(Conflict::is_auto_resolvable)
}

/// Resolves every auto-resolvable conflict and returns the rest
///
/// # Errors
/// Only a cancellation aborts; per-conflict failures land in the
/// [`BatchResult`].
pub fn resolve_auto(
    ctx: &mut SyncContext<'_>,
    conflicts: Vec<Conflict>,
) -> Result<(BatchResult, Vec<Conflict>), ConflictError> {
    let (auto, pending) = partition_auto_resolvable(conflicts);
    info!(
        auto = auto.len(),
        pending = pending.len(),
        "Resolving auto-resolvable conflicts"
    );
    let result = ConflictResolver::new().resolve_batch(ctx, &auto)?;
    Ok((result, pending))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::Path;

    use twinsync_core::domain::{EntityPath, Presence, RelativePath, SyncAction, Verdict};
    use twinsync_core::SyncableNode;

    fn conflict(rel: &str, verdict: Verdict) -> Conflict {
        let entity = EntityPath::file(RelativePath::parse(rel).unwrap());
        Conflict::new(
            SyncableNode::from_entity(Path::new("/l"), &entity),
            SyncableNode::from_entity(Path::new("/r"), &entity),
            Presence::new(true, false),
            verdict,
        )
    }

    #[test]
    fn test_partition_keeps_order() {
        let conflicts = vec![
            conflict("a", Verdict::auto(SyncAction::CopyToRight)),
            conflict("b", Verdict::suggest(SyncAction::DeleteLeft)),
            conflict("c", Verdict::auto(SyncAction::DeleteLeft)),
            conflict("d", Verdict::undecided()),
        ];

        let (auto, pending) = partition_auto_resolvable(conflicts);

        let names = |v: &[Conflict]| v.iter().map(|c| c.entity_path().encode()).collect::<Vec<_>>();
        assert_eq!(names(&auto), vec!["file:\\a", "file:\\c"]);
        assert_eq!(names(&pending), vec!["file:\\b", "file:\\d"]);
        assert_eq!(pending[0].selected_action(), SyncAction::DeleteLeft);
    }

    #[test]
    fn test_partition_empty() {
        let (auto, pending) = partition_auto_resolvable(Vec::new());
        assert!(auto.is_empty());
        assert!(pending.is_empty());
    }
}
