//! Conflict domain entities
//!
//! This module defines the actions that can settle a divergence between the
//! two sides of a partnership, the [`Conflict`] raised for each divergence,
//! and the [`Resolved`] record produced once an action was carried out.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::{ConflictId, EntityPath};
use crate::syncable::SyncableNode;

/// An action that settles a conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    /// Copy the right node over the left one
    CopyToLeft,
    /// Copy the left node over the right one
    CopyToRight,
    /// Delete the left node
    DeleteLeft,
    /// Delete the right node
    DeleteRight,
    /// Merge both nodes (not implemented)
    Merge,
    /// Stop tracking the path
    Ignore,
    /// The engine could not decide
    Unknown,
}

impl SyncAction {
    /// Every action, in declaration order
    pub const ALL: [SyncAction; 7] = [
        SyncAction::CopyToLeft,
        SyncAction::CopyToRight,
        SyncAction::DeleteLeft,
        SyncAction::DeleteRight,
        SyncAction::Merge,
        SyncAction::Ignore,
        SyncAction::Unknown,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SyncAction::CopyToLeft => "copy_to_left",
            SyncAction::CopyToRight => "copy_to_right",
            SyncAction::DeleteLeft => "delete_left",
            SyncAction::DeleteRight => "delete_right",
            SyncAction::Merge => "merge",
            SyncAction::Ignore => "ignore",
            SyncAction::Unknown => "unknown",
        }
    }

    /// Returns true for anything but [`SyncAction::Unknown`]
    #[must_use]
    pub fn is_known(self) -> bool {
        self != SyncAction::Unknown
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SyncAction {
    type Err = DomainError;

    /// Accepts `copy_to_left`, `copy-to-left` and `CopyToLeft` spellings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        SyncAction::ALL
            .into_iter()
            .find(|action| action.as_str().replace('_', "") == normalized)
            .ok_or_else(|| DomainError::InvalidAction(s.to_string()))
    }
}

/// Which sides of a conflict existed when it was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presence {
    pub left: bool,
    pub right: bool,
}

impl Presence {
    #[must_use]
    pub const fn new(left: bool, right: bool) -> Self {
        Self { left, right }
    }
}

/// What the detection algorithm concluded about a divergence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub auto_resolve: SyncAction,
    pub suggested: Option<SyncAction>,
}

impl Verdict {
    /// Safe to apply without asking
    #[must_use]
    pub const fn auto(action: SyncAction) -> Self {
        Self {
            auto_resolve: action,
            suggested: None,
        }
    }

    /// Needs the user, with a non-binding hint
    #[must_use]
    pub const fn suggest(action: SyncAction) -> Self {
        Self {
            auto_resolve: SyncAction::Unknown,
            suggested: Some(action),
        }
    }

    /// Needs the user, no hint
    #[must_use]
    pub const fn undecided() -> Self {
        Self {
            auto_resolve: SyncAction::Unknown,
            suggested: None,
        }
    }
}

/// A divergence between the two sides of a partnership
///
/// If [`Conflict::auto_resolve_action`] is known the conflict is safe to
/// resolve without user input. Otherwise the user picks one of
/// [`Conflict::legal_actions`], pre-selected from the suggestion when there
/// is one.
#[derive(Debug, Clone)]
pub struct Conflict {
    id: ConflictId,
    detected_at: DateTime<Utc>,
    left: SyncableNode,
    right: SyncableNode,
    auto_resolve: SyncAction,
    suggested: Option<SyncAction>,
    legal_actions: Vec<SyncAction>,
    selected: SyncAction,
}

impl Conflict {
    /// Creates a conflict and derives the actions a user may pick from
    ///
    /// - left missing: copy to left or delete right, default copy to left
    /// - right missing: copy to right or delete left, default copy to right
    /// - both present: copy either way, default copy to left
    ///
    /// Ignore is always legal. A suggestion overrides the default selection.
    pub fn new(
        left: SyncableNode,
        right: SyncableNode,
        presence: Presence,
        verdict: Verdict,
    ) -> Self {
        let mut legal_actions = if !presence.left {
            vec![SyncAction::CopyToLeft, SyncAction::DeleteRight]
        } else if !presence.right {
            vec![SyncAction::CopyToRight, SyncAction::DeleteLeft]
        } else {
            vec![SyncAction::CopyToLeft, SyncAction::CopyToRight]
        };
        let mut selected = legal_actions[0];
        legal_actions.push(SyncAction::Ignore);

        let suggested = verdict.suggested.filter(|a| a.is_known());
        if let Some(suggestion) = suggested {
            selected = suggestion;
        }

        Self {
            id: ConflictId::new(),
            detected_at: Utc::now(),
            left,
            right,
            auto_resolve: verdict.auto_resolve,
            suggested,
            legal_actions,
            selected,
        }
    }

    pub fn id(&self) -> &ConflictId {
        &self.id
    }

    pub fn detected_at(&self) -> DateTime<Utc> {
        self.detected_at
    }

    pub fn left(&self) -> &SyncableNode {
        &self.left
    }

    pub fn right(&self) -> &SyncableNode {
        &self.right
    }

    /// Identity shared by both nodes
    pub fn entity_path(&self) -> EntityPath {
        self.left.entity_path()
    }

    pub fn auto_resolve_action(&self) -> SyncAction {
        self.auto_resolve
    }

    pub fn suggested_action(&self) -> Option<SyncAction> {
        self.suggested
    }

    pub fn legal_actions(&self) -> &[SyncAction] {
        &self.legal_actions
    }

    pub fn selected_action(&self) -> SyncAction {
        self.selected
    }

    /// Returns true if the conflict can be resolved without asking
    pub fn is_auto_resolvable(&self) -> bool {
        self.auto_resolve.is_known()
    }

    /// Changes the user selection
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidAction`] if `action` is not legal for
    /// this conflict.
    pub fn select(&mut self, action: SyncAction) -> Result<(), DomainError> {
        if !self.legal_actions.contains(&action) {
            return Err(DomainError::InvalidAction(format!(
                "{action} is not a legal choice for {}",
                self.entity_path()
            )));
        }
        self.selected = action;
        Ok(())
    }

    /// The action a no-argument resolve carries out
    ///
    /// The auto-resolve action when known, the current selection otherwise.
    pub fn chosen_action(&self) -> SyncAction {
        if self.auto_resolve.is_known() {
            self.auto_resolve
        } else {
            self.selected
        }
    }

    /// Splits the conflict into its two nodes
    pub fn into_nodes(self) -> (SyncableNode, SyncableNode) {
        (self.left, self.right)
    }
}

/// Record of a resolution that was carried out
///
/// Used for reporting only; the engines never consult it.
#[derive(Debug, Clone)]
pub struct Resolved {
    left: SyncableNode,
    right: SyncableNode,
    action_done: SyncAction,
    resolved_at: DateTime<Utc>,
}

impl Resolved {
    pub fn new(left: SyncableNode, right: SyncableNode, action_done: SyncAction) -> Self {
        Self {
            left,
            right,
            action_done,
            resolved_at: Utc::now(),
        }
    }

    pub fn left(&self) -> &SyncableNode {
        &self.left
    }

    pub fn right(&self) -> &SyncableNode {
        &self.right
    }

    pub fn action_done(&self) -> SyncAction {
        self.action_done
    }

    pub fn resolved_at(&self) -> DateTime<Utc> {
        self.resolved_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::newtypes::RelativePath;
    use std::path::Path;

    fn pair(name: &str) -> (SyncableNode, SyncableNode) {
        let rel = RelativePath::parse(name).unwrap();
        (
            SyncableNode::file(Path::new("/left"), rel.clone()),
            SyncableNode::file(Path::new("/right"), rel),
        )
    }

    #[test]
    fn test_action_parse_spellings() {
        assert_eq!("copy_to_left".parse::<SyncAction>().unwrap(), SyncAction::CopyToLeft);
        assert_eq!("copy-to-right".parse::<SyncAction>().unwrap(), SyncAction::CopyToRight);
        assert_eq!("DeleteLeft".parse::<SyncAction>().unwrap(), SyncAction::DeleteLeft);
        assert_eq!("ignore".parse::<SyncAction>().unwrap(), SyncAction::Ignore);
        assert!("explode".parse::<SyncAction>().is_err());
    }

    #[test]
    fn test_action_display_round_trip() {
        for action in SyncAction::ALL {
            assert_eq!(action.to_string().parse::<SyncAction>().unwrap(), action);
        }
    }

    #[test]
    fn test_left_missing_actions() {
        let (left, right) = pair("a.txt");
        let conflict = Conflict::new(left, right, Presence::new(false, true), Verdict::undecided());

        assert_eq!(
            conflict.legal_actions(),
            &[SyncAction::CopyToLeft, SyncAction::DeleteRight, SyncAction::Ignore]
        );
        assert_eq!(conflict.selected_action(), SyncAction::CopyToLeft);
        assert!(!conflict.is_auto_resolvable());
    }

    #[test]
    fn test_right_missing_actions() {
        let (left, right) = pair("a.txt");
        let conflict = Conflict::new(
            left,
            right,
            Presence::new(true, false),
            Verdict::auto(SyncAction::CopyToRight),
        );

        assert_eq!(
            conflict.legal_actions(),
            &[SyncAction::CopyToRight, SyncAction::DeleteLeft, SyncAction::Ignore]
        );
        assert_eq!(conflict.selected_action(), SyncAction::CopyToRight);
        assert!(conflict.is_auto_resolvable());
        assert_eq!(conflict.chosen_action(), SyncAction::CopyToRight);
    }

    #[test]
    fn test_both_present_actions() {
        let (left, right) = pair("a.txt");
        let conflict = Conflict::new(left, right, Presence::new(true, true), Verdict::undecided());

        assert_eq!(
            conflict.legal_actions(),
            &[SyncAction::CopyToLeft, SyncAction::CopyToRight, SyncAction::Ignore]
        );
        assert_eq!(conflict.selected_action(), SyncAction::CopyToLeft);
        assert_eq!(conflict.chosen_action(), SyncAction::CopyToLeft);
    }

    #[test]
    fn test_suggestion_overrides_default() {
        let (left, right) = pair("a.txt");
        let conflict = Conflict::new(
            left,
            right,
            Presence::new(true, true),
            Verdict::suggest(SyncAction::CopyToRight),
        );

        assert_eq!(conflict.suggested_action(), Some(SyncAction::CopyToRight));
        assert_eq!(conflict.selected_action(), SyncAction::CopyToRight);
        assert_eq!(conflict.auto_resolve_action(), SyncAction::Unknown);
        assert_eq!(conflict.chosen_action(), SyncAction::CopyToRight);
    }

    #[test]
    fn test_select_rejects_illegal_action() {
        let (left, right) = pair("a.txt");
        let mut conflict =
            Conflict::new(left, right, Presence::new(true, true), Verdict::undecided());

        assert!(conflict.select(SyncAction::DeleteLeft).is_err());
        assert!(conflict.select(SyncAction::Ignore).is_ok());
        assert_eq!(conflict.chosen_action(), SyncAction::Ignore);
    }

    #[test]
    fn test_entity_path_from_nodes() {
        let (left, right) = pair("docs/a.txt");
        let conflict = Conflict::new(left, right, Presence::new(true, false), Verdict::undecided());
        assert_eq!(conflict.entity_path().encode(), "file:\\docs\\a.txt");
    }

    #[test]
    fn test_resolved_record() {
        let (left, right) = pair("a.txt");
        let resolved = Resolved::new(left, right, SyncAction::DeleteLeft);
        assert_eq!(resolved.action_done(), SyncAction::DeleteLeft);
        assert!(resolved.resolved_at() <= Utc::now());
    }
}
