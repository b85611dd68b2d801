//! Domain newtypes with validation
//!
//! This module provides strongly-typed wrappers for domain identifiers and values.
//! Each newtype ensures data validity at construction time.

use std::fmt::{self, Display, Formatter};
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;
use super::ledger::IGNORE_SUFFIX;

// ============================================================================
// ConflictId
// ============================================================================

/// Identifier for Conflict entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConflictId(Uuid);

impl ConflictId {
    /// Create a new random ConflictId
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID value
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ConflictId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ConflictId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConflictId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| DomainError::ValidationFailed(format!("Invalid ConflictId: {e}")))
    }
}

// ============================================================================
// RelativePath
// ============================================================================

/// Separator used in the serialized form of relative paths
pub const WIRE_SEPARATOR: char = '\\';

/// A path relative to a partnership root
///
/// Stored as normalized segments so the same logical path compares equal
/// regardless of the separator it was written with. The empty path is the
/// root itself. `.` and `..` segments are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RelativePath(Vec<String>);

impl RelativePath {
    /// The partnership root (no segments)
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parses a relative path written with `\` or `/` separators
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let mut segments = Vec::new();
        for segment in s.split(['\\', '/']) {
            match segment {
                "" => continue,
                "." | ".." => {
                    return Err(DomainError::InvalidPath(format!(
                        "relative path must not contain '{segment}': {s}"
                    )))
                }
                name if name.ends_with(IGNORE_SUFFIX) => {
                    return Err(DomainError::InvalidPath(format!(
                        "name must not end with '{IGNORE_SUFFIX}': {s}"
                    )))
                }
                name => segments.push(name.to_string()),
            }
        }
        Ok(Self(segments))
    }

    /// Returns true if `name` can be a single segment of a relative path
    ///
    /// Separators of either style, `.`, `..` and names ending in the
    /// ledger's ignore suffix cannot be represented in an [`EntityPath`],
    /// so entries named that way are not tracked.
    #[must_use]
    pub fn is_valid_segment(name: &str) -> bool {
        !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['\\', '/'])
            && !name.ends_with(IGNORE_SUFFIX)
    }

    /// Builds a relative path from OS path components
    pub fn from_path(path: &Path) -> Result<Self, DomainError> {
        let mut segments = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(name) => {
                    let name = name.to_str().ok_or_else(|| {
                        DomainError::InvalidPath(format!(
                            "non UTF-8 path component: {}",
                            path.display()
                        ))
                    })?;
                    if !Self::is_valid_segment(name) {
                        return Err(DomainError::InvalidPath(format!(
                            "unsupported path component '{name}': {}",
                            path.display()
                        )));
                    }
                    segments.push(name.to_string());
                }
                Component::CurDir => continue,
                _ => {
                    return Err(DomainError::InvalidPath(format!(
                        "not a relative path: {}",
                        path.display()
                    )))
                }
            }
        }
        Ok(Self(segments))
    }

    /// Returns true for the partnership root
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Appends one name to this path
    ///
    /// Names containing separators are split so the result stays normalized.
    #[must_use]
    pub fn join(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.extend(
            name.split(['\\', '/'])
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        );
        Self(segments)
    }

    /// Appends every segment of `other`
    #[must_use]
    pub fn join_path(&self, other: &RelativePath) -> Self {
        let mut segments = self.0.clone();
        segments.extend(other.0.iter().cloned());
        Self(segments)
    }

    /// Last segment, if any
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Path without its last segment (`None` for the root)
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Returns true if `prefix` is this path or one of its ancestors
    #[must_use]
    pub fn starts_with(&self, prefix: &RelativePath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Resolves this path below an absolute root
    #[must_use]
    pub fn to_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        for segment in &self.0 {
            path.push(segment);
        }
        path
    }

    /// Number of segments
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl Display for RelativePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.0 {
            if !first {
                write!(f, "{WIRE_SEPARATOR}")?;
            }
            write!(f, "{segment}")?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for RelativePath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RelativePath {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<RelativePath> for String {
    fn from(path: RelativePath) -> Self {
        path.to_string()
    }
}

// ============================================================================
// EntityPath
// ============================================================================

/// Which variant of syncable node an entity path names
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    File,
    Folder,
}

impl EntityKind {
    /// Serialized type tag, including the trailing separator
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            EntityKind::File => "file:\\",
            EntityKind::Folder => "folder:\\",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::File => write!(f, "file"),
            EntityKind::Folder => write!(f, "folder"),
        }
    }
}

/// Identity of a node within a partnership
///
/// A type tag followed by the path relative to the partnership root, e.g.
/// `file:\docs\a.txt`. Equal entity paths name the same logical object
/// across syncs. Renaming the root keeps the entity path; renaming the node
/// itself produces a different one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityPath {
    kind: EntityKind,
    relative: RelativePath,
}

impl EntityPath {
    #[must_use]
    pub fn new(kind: EntityKind, relative: RelativePath) -> Self {
        Self { kind, relative }
    }

    #[must_use]
    pub fn file(relative: RelativePath) -> Self {
        Self::new(EntityKind::File, relative)
    }

    #[must_use]
    pub fn folder(relative: RelativePath) -> Self {
        Self::new(EntityKind::Folder, relative)
    }

    #[must_use]
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    #[must_use]
    pub fn relative(&self) -> &RelativePath {
        &self.relative
    }

    /// Serializes to the tagged wire form
    #[must_use]
    pub fn encode(&self) -> String {
        format!("{}{}", self.kind.tag(), self.relative)
    }

    /// Parses the tagged wire form
    pub fn decode(s: &str) -> Result<Self, DomainError> {
        let (kind, rest) = if let Some(rest) = s.strip_prefix("file:") {
            (EntityKind::File, rest)
        } else if let Some(rest) = s.strip_prefix("folder:") {
            (EntityKind::Folder, rest)
        } else {
            return Err(DomainError::InvalidEntityPath(s.to_string()));
        };
        let relative = RelativePath::parse(rest)
            .map_err(|_| DomainError::InvalidEntityPath(s.to_string()))?;
        Ok(Self { kind, relative })
    }

    /// Returns true if this entity lies strictly below `folder`
    #[must_use]
    pub fn is_descendant_of(&self, folder: &EntityPath) -> bool {
        folder.kind == EntityKind::Folder
            && self.relative.depth() > folder.relative.depth()
            && self.relative.starts_with(&folder.relative)
    }
}

impl Display for EntityPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.tag(), self.relative)
    }
}

impl FromStr for EntityPath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl TryFrom<String> for EntityPath {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::decode(&s)
    }
}

impl From<EntityPath> for String {
    fn from(path: EntityPath) -> Self {
        path.encode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path_parse_normalizes_separators() {
        let a = RelativePath::parse("docs/sub\\a.txt").unwrap();
        let b = RelativePath::parse("\\docs\\sub\\a.txt").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "docs\\sub\\a.txt");
        assert_eq!(a.depth(), 3);
    }

    #[test]
    fn test_relative_path_rejects_parent_segments() {
        assert!(RelativePath::parse("docs/../etc").is_err());
        assert!(RelativePath::parse("./a").is_err());
    }

    #[test]
    fn test_relative_path_rejects_ignore_suffix() {
        assert!(RelativePath::parse("docs/x|ignored").is_err());
        assert!(RelativePath::from_path(Path::new("docs/x|ignored")).is_err());
        assert!(RelativePath::parse("docs/x|ignored.txt").is_ok());
    }

    #[test]
    fn test_valid_segments() {
        assert!(RelativePath::is_valid_segment("a.txt"));
        assert!(RelativePath::is_valid_segment("x|ignored.bak"));
        assert!(!RelativePath::is_valid_segment("a\\b.txt"));
        assert!(!RelativePath::is_valid_segment("a/b"));
        assert!(!RelativePath::is_valid_segment(".."));
        assert!(!RelativePath::is_valid_segment(""));
        assert!(!RelativePath::is_valid_segment("x|ignored"));
    }

    #[test]
    fn test_relative_path_root() {
        let root = RelativePath::parse("").unwrap();
        assert!(root.is_root());
        assert_eq!(root, RelativePath::root());
        assert!(root.parent().is_none());
        assert!(root.file_name().is_none());
    }

    #[test]
    fn test_relative_path_join_and_parent() {
        let path = RelativePath::root().join("docs").join("a.txt");
        assert_eq!(path.file_name(), Some("a.txt"));
        assert_eq!(path.parent().unwrap().to_string(), "docs");
        assert!(path.starts_with(&RelativePath::parse("docs").unwrap()));

        let nested = RelativePath::parse("docs").unwrap().join_path(&RelativePath::parse("a/b").unwrap());
        assert_eq!(nested.to_string(), "docs\\a\\b");
    }

    #[test]
    fn test_relative_path_to_path() {
        let path = RelativePath::parse("docs\\a.txt").unwrap();
        let full = path.to_path(Path::new("/sync/left"));
        assert_eq!(full, PathBuf::from("/sync/left/docs/a.txt"));
    }

    #[test]
    fn test_relative_path_from_path() {
        let path = RelativePath::from_path(Path::new("docs/a.txt")).unwrap();
        assert_eq!(path.to_string(), "docs\\a.txt");
        assert!(RelativePath::from_path(Path::new("/abs")).is_err());
    }

    #[test]
    fn test_entity_path_encode() {
        let file = EntityPath::file(RelativePath::parse("a.txt").unwrap());
        assert_eq!(file.encode(), "file:\\a.txt");

        let folder = EntityPath::folder(RelativePath::parse("docs/sub").unwrap());
        assert_eq!(folder.encode(), "folder:\\docs\\sub");
    }

    #[test]
    fn test_entity_path_round_trip() {
        for wire in [
            "file:\\a.txt",
            "file:\\docs\\nested\\deep\\a.txt",
            "folder:\\docs",
            "folder:\\docs\\nested",
            "folder:\\",
        ] {
            let decoded = EntityPath::decode(wire).unwrap();
            assert_eq!(decoded.encode(), wire);
            assert_eq!(EntityPath::decode(&decoded.encode()).unwrap(), decoded);
        }
    }

    #[test]
    fn test_entity_path_decode_rejects_unknown_tag() {
        assert!(matches!(
            EntityPath::decode("link:\\a"),
            Err(DomainError::InvalidEntityPath(_))
        ));
        assert!(EntityPath::decode("a.txt").is_err());
    }

    #[test]
    fn test_entity_path_serde_as_string() {
        let path = EntityPath::file(RelativePath::parse("docs/a.txt").unwrap());
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"file:\\\\docs\\\\a.txt\"");
        let back: EntityPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }

    #[test]
    fn test_is_descendant_of() {
        let folder = EntityPath::folder(RelativePath::parse("docs").unwrap());
        let child = EntityPath::file(RelativePath::parse("docs/a.txt").unwrap());
        let sibling = EntityPath::file(RelativePath::parse("docs2/a.txt").unwrap());
        assert!(child.is_descendant_of(&folder));
        assert!(!sibling.is_descendant_of(&folder));
        assert!(!folder.is_descendant_of(&folder));
        assert!(!folder.is_descendant_of(&child));
    }

    #[test]
    fn test_conflict_id_parse() {
        let id = ConflictId::new();
        let parsed: ConflictId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<ConflictId>().is_err());
    }
}
