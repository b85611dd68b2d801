//! Exclusion filter for the tree walk
//!
//! Patterns are globs. A pattern without a `/` is matched against the bare
//! entry name at every level; a pattern with a `/` is matched against the
//! entry's relative path, using `/` as separator.

use glob::{MatchOptions, Pattern};
use tracing::trace;

use twinsync_core::domain::RelativePath;

use crate::SyncError;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Compiled set of exclusion globs
#[derive(Debug, Clone, Default)]
pub struct ExclusionFilter {
    names: Vec<Pattern>,
    paths: Vec<Pattern>,
}

impl ExclusionFilter {
    /// Compiles `patterns`, failing on the first invalid one
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, SyncError> {
        let mut filter = Self::default();
        for raw in patterns {
            let raw = raw.as_ref();
            let pattern = Pattern::new(raw).map_err(|e| SyncError::InvalidPattern {
                pattern: raw.to_string(),
                reason: e.to_string(),
            })?;
            if raw.contains('/') {
                filter.paths.push(pattern);
            } else {
                filter.names.push(pattern);
            }
        }
        Ok(filter)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.paths.is_empty()
    }

    /// Returns true if the entry at `relative` must be skipped
    pub fn is_excluded(&self, relative: &RelativePath) -> bool {
        let Some(name) = relative.file_name() else {
            return false;
        };
        if self.names.iter().any(|p| p.matches_with(name, MATCH_OPTIONS)) {
            trace!(name, "excluded by name pattern");
            return true;
        }
        if self.paths.is_empty() {
            return false;
        }
        let slashed = relative.to_string().replace('\\', "/");
        let excluded = self
            .paths
            .iter()
            .any(|p| p.matches_with(&slashed, MATCH_OPTIONS));
        if excluded {
            trace!(path = %slashed, "excluded by path pattern");
        }
        excluded
    }
}
