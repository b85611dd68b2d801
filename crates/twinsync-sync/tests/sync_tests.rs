//! Integration tests for divergence detection
//!
//! Each test builds two real directory trees under a `TempDir` and runs a
//! partnership sync through the `LocalFileSystemAdapter`.

mod common;

use std::fs;

use twinsync_core::config::SyncConfig;
use twinsync_core::domain::{RollingChecksum, SyncAction};
use twinsync_core::ports::{ActionKind, NoProgress, SyncStatus};
use twinsync_sync::SyncError;

use common::*;

// ============================================================================
// Reference scenarios
// ============================================================================

#[test]
fn test_new_file_on_left_copies_right() {
    let fx = Fixture::new();
    write(&fx.left.join("a.txt"), "fresh");
    let mut p = fx.partnership();

    let report = sync(&mut p);

    assert_eq!(report.conflicts.len(), 1);
    let c = conflict(&report, "file:\\a.txt");
    assert_eq!(c.auto_resolve_action(), SyncAction::CopyToRight);
    assert!(c.is_auto_resolvable());
}

#[test]
fn test_identical_files_are_recorded() {
    let fx = Fixture::new();
    write_both(&fx, "a.txt", "same", 1_600_000_000);
    let mut p = fx.partnership();

    let report = sync(&mut p);

    assert!(report.is_clean());
    assert_eq!(report.entries_recorded, 1);
    assert_eq!(
        p.ledger().get(&entity("file:\\a.txt")),
        Some(RollingChecksum::of(b"same"))
    );
}

#[test]
fn test_unchanged_left_with_missing_right_is_a_deletion() {
    let fx = Fixture::new();
    write_both(&fx, "a.txt", "content", 1_600_000_000);
    let mut p = fx.partnership();
    sync(&mut p);

    fs::remove_file(fx.right.join("a.txt")).unwrap();
    let report = sync(&mut p);

    let c = conflict(&report, "file:\\a.txt");
    assert_eq!(c.auto_resolve_action(), SyncAction::DeleteLeft);
}

#[test]
fn test_both_modified_suggests_newer_side() {
    let fx = Fixture::new();
    write_both(&fx, "a.txt", "base", 1_600_000_000);
    let mut p = fx.partnership();
    sync(&mut p);

    write(&fx.left.join("a.txt"), "left edit");
    write(&fx.right.join("a.txt"), "right edit!");
    set_mtime(&fx.left.join("a.txt"), 1_700_000_200);
    set_mtime(&fx.right.join("a.txt"), 1_700_000_100);
    let report = sync(&mut p);

    let c = conflict(&report, "file:\\a.txt");
    assert_eq!(c.auto_resolve_action(), SyncAction::Unknown);
    assert_eq!(c.suggested_action(), Some(SyncAction::CopyToRight));
    assert_eq!(c.selected_action(), SyncAction::CopyToRight);
}

// ============================================================================
// Auto-resolve matrix
// ============================================================================

#[test]
fn test_new_file_on_right_copies_left() {
    let fx = Fixture::new();
    write(&fx.right.join("b.txt"), "fresh");
    let mut p = fx.partnership();

    let report = sync(&mut p);

    let c = conflict(&report, "file:\\b.txt");
    assert_eq!(c.auto_resolve_action(), SyncAction::CopyToLeft);
    assert_eq!(
        c.legal_actions(),
        &[SyncAction::CopyToLeft, SyncAction::DeleteRight, SyncAction::Ignore]
    );
}

#[test]
fn test_unchanged_right_with_missing_left_is_a_deletion() {
    let fx = Fixture::new();
    write_both(&fx, "a.txt", "content", 1_600_000_000);
    let mut p = fx.partnership();
    sync(&mut p);

    fs::remove_file(fx.left.join("a.txt")).unwrap();
    let report = sync(&mut p);

    assert_eq!(
        conflict(&report, "file:\\a.txt").auto_resolve_action(),
        SyncAction::DeleteRight
    );
}

#[test]
fn test_changed_left_with_missing_right_is_ambiguous() {
    let fx = Fixture::new();
    write_both(&fx, "a.txt", "content", 1_600_000_000);
    let mut p = fx.partnership();
    sync(&mut p);

    fs::remove_file(fx.right.join("a.txt")).unwrap();
    write(&fx.left.join("a.txt"), "edited after sync");
    let report = sync(&mut p);

    let c = conflict(&report, "file:\\a.txt");
    assert_eq!(c.auto_resolve_action(), SyncAction::Unknown);
    assert_eq!(c.suggested_action(), None);
    assert_eq!(
        c.legal_actions(),
        &[SyncAction::CopyToRight, SyncAction::DeleteLeft, SyncAction::Ignore]
    );
    assert_eq!(c.selected_action(), SyncAction::CopyToRight);
}

#[test]
fn test_only_left_changed_copies_right() {
    let fx = Fixture::new();
    write_both(&fx, "a.txt", "base", 1_600_000_000);
    let mut p = fx.partnership();
    sync(&mut p);

    write(&fx.left.join("a.txt"), "left changed");
    let report = sync(&mut p);

    assert_eq!(
        conflict(&report, "file:\\a.txt").auto_resolve_action(),
        SyncAction::CopyToRight
    );
}

#[test]
fn test_only_right_changed_copies_left() {
    let fx = Fixture::new();
    write_both(&fx, "a.txt", "base", 1_600_000_000);
    let mut p = fx.partnership();
    sync(&mut p);

    write(&fx.right.join("a.txt"), "right changed");
    let report = sync(&mut p);

    assert_eq!(
        conflict(&report, "file:\\a.txt").auto_resolve_action(),
        SyncAction::CopyToLeft
    );
}

#[test]
fn test_both_changed_left_older_suggests_copy_to_left() {
    let fx = Fixture::new();
    write_both(&fx, "a.txt", "base", 1_600_000_000);
    let mut p = fx.partnership();
    sync(&mut p);

    write(&fx.left.join("a.txt"), "left edit");
    write(&fx.right.join("a.txt"), "right edit!");
    set_mtime(&fx.left.join("a.txt"), 1_700_000_000);
    set_mtime(&fx.right.join("a.txt"), 1_700_000_500);
    let report = sync(&mut p);

    let c = conflict(&report, "file:\\a.txt");
    assert_eq!(c.auto_resolve_action(), SyncAction::Unknown);
    assert_eq!(c.suggested_action(), Some(SyncAction::CopyToLeft));
}

#[test]
fn test_both_changed_same_mtime_has_no_suggestion() {
    let fx = Fixture::new();
    write_both(&fx, "a.txt", "base", 1_600_000_000);
    let mut p = fx.partnership();
    sync(&mut p);

    write(&fx.left.join("a.txt"), "short");
    write(&fx.right.join("a.txt"), "much longer");
    set_mtime(&fx.left.join("a.txt"), 1_700_000_000);
    set_mtime(&fx.right.join("a.txt"), 1_700_000_000);
    let report = sync(&mut p);

    let c = conflict(&report, "file:\\a.txt");
    assert_eq!(c.auto_resolve_action(), SyncAction::Unknown);
    assert_eq!(c.suggested_action(), None);
    assert_eq!(c.selected_action(), SyncAction::CopyToLeft);
}

#[test]
fn test_same_content_different_mtime_is_in_sync() {
    let fx = Fixture::new();
    write(&fx.left.join("a.txt"), "identical");
    write(&fx.right.join("a.txt"), "identical");
    set_mtime(&fx.left.join("a.txt"), 1_600_000_000);
    set_mtime(&fx.right.join("a.txt"), 1_650_000_000);
    let mut p = fx.partnership();

    let report = sync(&mut p);

    assert!(report.is_clean());
    assert!(p.ledger().contains(&entity("file:\\a.txt")));
}

#[test]
fn test_new_files_on_both_sides_without_ledger() {
    let fx = Fixture::new();
    write(&fx.left.join("a.txt"), "left");
    write(&fx.right.join("a.txt"), "right side");
    set_mtime(&fx.left.join("a.txt"), 1_600_000_000);
    set_mtime(&fx.right.join("a.txt"), 1_600_000_100);
    let mut p = fx.partnership();

    let report = sync(&mut p);

    let c = conflict(&report, "file:\\a.txt");
    assert_eq!(c.auto_resolve_action(), SyncAction::Unknown);
    assert_eq!(c.suggested_action(), Some(SyncAction::CopyToLeft));
}

// ============================================================================
// Folders
// ============================================================================

#[test]
fn test_new_folder_on_left_copies_right() {
    let fx = Fixture::new();
    write(&fx.left.join("docs/inner/a.txt"), "a");
    let mut p = fx.partnership();

    let report = sync(&mut p);

    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(
        conflict(&report, "folder:\\docs").auto_resolve_action(),
        SyncAction::CopyToRight
    );
}

#[test]
fn test_new_folder_on_right_copies_left() {
    let fx = Fixture::new();
    fs::create_dir_all(fx.right.join("photos")).unwrap();
    let mut p = fx.partnership();

    let report = sync(&mut p);

    assert_eq!(
        conflict(&report, "folder:\\photos").auto_resolve_action(),
        SyncAction::CopyToLeft
    );
}

#[test]
fn test_shared_folder_is_recorded_and_descended() {
    let fx = Fixture::new();
    write_both(&fx, "docs/a.txt", "a", 1_600_000_000);
    write(&fx.left.join("docs/new.txt"), "new");
    let mut p = fx.partnership();

    let report = sync(&mut p);

    assert!(p.ledger().contains(&entity("folder:\\docs")));
    assert!(p.ledger().contains(&entity("file:\\docs\\a.txt")));
    assert_eq!(report.folders_visited, 2);
    assert_eq!(report.files_compared, 2);
    assert_eq!(
        conflict(&report, "file:\\docs\\new.txt").auto_resolve_action(),
        SyncAction::CopyToRight
    );
}

#[test]
fn test_folder_removed_on_right_is_a_deletion() {
    let fx = Fixture::new();
    write_both(&fx, "docs/a.txt", "a", 1_600_000_000);
    let mut p = fx.partnership();
    sync(&mut p);

    fs::remove_dir_all(fx.right.join("docs")).unwrap();
    let report = sync(&mut p);

    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(
        conflict(&report, "folder:\\docs").auto_resolve_action(),
        SyncAction::DeleteLeft
    );
}

#[test]
fn test_folder_removed_on_left_deletes_right() {
    let fx = Fixture::new();
    write_both(&fx, "docs/a.txt", "a", 1_600_000_000);
    let mut p = fx.partnership();
    sync(&mut p);

    fs::remove_dir_all(fx.left.join("docs")).unwrap();
    let report = sync(&mut p);

    assert_eq!(
        conflict(&report, "folder:\\docs").auto_resolve_action(),
        SyncAction::DeleteRight
    );
}

// ============================================================================
// Ledger idempotence
// ============================================================================

#[test]
fn test_second_sync_is_a_no_op() {
    let fx = Fixture::new();
    write_both(&fx, "a.txt", "a", 1_600_000_000);
    write_both(&fx, "x/b.txt", "b", 1_600_000_000);
    write_both(&fx, "x/y/c.txt", "c", 1_600_000_000);
    let mut p = fx.partnership();

    let first = sync(&mut p);
    assert!(first.is_clean());
    let ledger = p.ledger().clone();

    let second = sync(&mut p);
    assert!(second.is_clean());
    assert_eq!(second.entries_recorded, 0);
    assert_eq!(p.ledger(), &ledger);
}

// ============================================================================
// Filtering and ignore markers
// ============================================================================

#[test]
fn test_temporary_files_are_excluded_by_default() {
    let fx = Fixture::new();
    write(&fx.left.join(".a.txt.0badf00d.twinsync-tmp"), "partial");
    let mut p = fx.partnership();

    let report = sync(&mut p);

    assert!(report.is_clean());
    assert_eq!(report.files_compared, 0);
}

#[test]
fn test_custom_exclusions() {
    let fx = Fixture::new();
    write(&fx.left.join("debug.log"), "log");
    write(&fx.left.join("cache/blob"), "blob");
    write(&fx.left.join("keep.txt"), "keep");
    let mut config = SyncConfig::default();
    config.exclude.push("*.log".to_string());
    config.exclude.push("cache".to_string());
    let mut p = fx.partnership_with(config);

    let report = sync(&mut p);

    assert_eq!(report.conflicts.len(), 1);
    conflict(&report, "file:\\keep.txt");
}

#[test]
fn test_invalid_exclusion_rejected() {
    let fx = Fixture::new();
    let mut config = SyncConfig::default();
    config.exclude.push("[".to_string());

    let result = twinsync_sync::Partnership::new("bad", &fx.left, &fx.right, fx.adapter(), config);
    assert!(matches!(result, Err(SyncError::InvalidPattern { .. })));
}

#[test]
fn test_ignored_paths_are_skipped() {
    let fx = Fixture::new();
    write(&fx.left.join("secret.txt"), "s");
    write(&fx.right.join("private/x.txt"), "x");
    let mut p = fx.partnership();
    p.ledger_mut().ignore(entity("file:\\secret.txt"));
    p.ledger_mut().ignore(entity("folder:\\private"));

    let report = sync(&mut p);

    assert!(report.is_clean());
    assert!(!p.ledger().contains(&entity("file:\\secret.txt")));
}

// ============================================================================
// Roots and cancellation
// ============================================================================

#[test]
fn test_missing_root_is_reported() {
    let fx = Fixture::new();
    fs::remove_dir_all(&fx.right).unwrap();
    let mut p = fx.partnership();

    let result = p.sync(&mut NoProgress);

    assert!(matches!(result, Err(SyncError::RootMissing { side: "right", .. })));
}

#[test]
fn test_cancel_during_walk() {
    let fx = Fixture::new();
    write_both(&fx, "a/1.txt", "1", 1_600_000_000);
    write_both(&fx, "b/2.txt", "2", 1_600_000_000);
    write_both(&fx, "top.txt", "t", 1_600_000_000);
    let mut p = fx.partnership();
    p.ledger_mut().ignore(entity("file:\\elsewhere.txt"));
    let before = p.ledger().clone();

    let mut sync_reports = 0;
    let mut observer = |status: &SyncStatus<'_>| {
        if status.action == ActionKind::Sync {
            sync_reports += 1;
        }
        sync_reports < 3
    };
    let result = p.sync(&mut observer);

    assert!(result.unwrap_err().is_cancelled());
    assert_eq!(p.ledger(), &before);
    assert!(!p.ledger().contains(&entity("file:\\top.txt")));

    let report = sync(&mut p);
    assert!(report.is_clean());
    assert!(p.ledger().contains(&entity("file:\\top.txt")));
    assert!(p.ledger().contains(&entity("folder:\\a")));
}

#[test]
fn test_progress_reaches_completion() {
    let fx = Fixture::new();
    write_both(&fx, "a/1.txt", "1", 1_600_000_000);
    let mut p = fx.partnership();

    let mut last_overall = 0;
    let mut observer = |status: &SyncStatus<'_>| {
        assert!(status.overall_percent >= last_overall);
        last_overall = status.overall_percent;
        true
    };
    p.sync(&mut observer).unwrap();

    assert!(last_overall > 0);
}

#[cfg(unix)]
#[test]
fn test_untrackable_names_are_left_alone() {
    let fx = Fixture::new();
    write(&fx.left.join("a\\b.txt"), "backslash");
    write(&fx.left.join("x|ignored"), "suffix");
    write(&fx.left.join("plain.txt"), "plain");
    let mut p = fx.partnership();

    let report = sync(&mut p);

    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(report.conflicts[0].entity_path(), entity("file:\\plain.txt"));
    assert_eq!(report.files_compared, 1);

    let saved = serde_json::to_string(p.ledger()).unwrap();
    let restored: twinsync_core::domain::ChecksumLedger = serde_json::from_str(&saved).unwrap();
    assert_eq!(&restored, p.ledger());
}
