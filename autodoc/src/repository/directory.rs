//! The pre-loaded directory index of a repository.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::{DIRECTORY_SEPARATOR, ROOT_PATH};

/// Identifier of a repository directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DirectoryId(String);

impl DirectoryId {
    /// Wraps a repository-assigned identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DirectoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct DirectoryEntry {
    id: DirectoryId,
    path: String,
}

/// Opaque, cheaply clonable reference to one repository directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirectoryHandle(Arc<DirectoryEntry>);

impl DirectoryHandle {
    /// Creates a handle. `path` is normalized to `/a/b/` form.
    #[must_use]
    pub fn new(id: DirectoryId, path: &str) -> Self {
        Self(Arc::new(DirectoryEntry {
            id,
            path: normalize_directory_path(path),
        }))
    }

    /// Returns the directory identifier.
    #[must_use]
    pub fn id(&self) -> &DirectoryId {
        &self.0.id
    }

    /// Returns the directory path, always with leading and trailing separator.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.0.path
    }

    /// Returns true for the root directory.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.path == ROOT_PATH
    }
}

/// Read-only map from directory paths to directory handles.
///
/// Keys are normalized `/a/b/` paths; the root is `/`. Lookups are exact.
#[derive(Debug, Clone)]
pub struct DirectoryTree {
    entries: BTreeMap<String, DirectoryHandle>,
}

impl Default for DirectoryTree {
    fn default() -> Self {
        let root = DirectoryHandle::new(DirectoryId::generate(), ROOT_PATH);
        let mut entries = BTreeMap::new();
        entries.insert(root.path().to_string(), root);
        Self { entries }
    }
}

impl DirectoryTree {
    /// Creates a tree holding only the root directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tree from directory paths, creating missing ancestors.
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tree = Self::new();
        for path in paths {
            tree.insert_path(path.as_ref());
        }
        tree
    }

    /// Adds a directory (and its ancestors) if missing; returns its handle.
    pub fn insert_path(&mut self, path: &str) -> DirectoryHandle {
        let normalized = normalize_directory_path(path);
        let mut current = String::from(DIRECTORY_SEPARATOR);
        for segment in segments(&normalized) {
            current.push_str(segment);
            current.push(DIRECTORY_SEPARATOR);
            self.entries
                .entry(current.clone())
                .or_insert_with(|| DirectoryHandle::new(DirectoryId::generate(), &current));
        }
        self.entries[&normalized].clone()
    }

    /// Adds a directory with a repository-assigned identifier.
    pub fn insert(&mut self, handle: DirectoryHandle) {
        if let Some(parent) = parent_path(handle.path()) {
            self.insert_path(&parent);
        }
        self.entries.insert(handle.path().to_string(), handle);
    }

    /// Looks up a directory by exact path.
    #[must_use]
    pub fn find_directory(&self, path: &str) -> Option<&DirectoryHandle> {
        self.entries.get(path)
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &DirectoryHandle {
        &self.entries[ROOT_PATH]
    }

    /// Iterates over all directory paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns the number of directories, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the tree holds no directories.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(DIRECTORY_SEPARATOR).filter(|s| !s.is_empty())
}

/// Normalizes a directory path to `/a/b/` form.
#[must_use]
pub fn normalize_directory_path(path: &str) -> String {
    let mut normalized = String::from(DIRECTORY_SEPARATOR);
    for segment in segments(path) {
        normalized.push_str(segment);
        normalized.push(DIRECTORY_SEPARATOR);
    }
    normalized
}

fn parent_path(path: &str) -> Option<String> {
    let parts: Vec<&str> = segments(path).collect();
    if parts.is_empty() {
        return None;
    }
    Some(normalize_directory_path(&parts[..parts.len() - 1].join("/")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_directory_path(""), "/");
        assert_eq!(normalize_directory_path("/"), "/");
        assert_eq!(normalize_directory_path("a/b"), "/a/b/");
        assert_eq!(normalize_directory_path("/a//b/"), "/a/b/");
    }

    #[test]
    fn test_from_paths_creates_ancestors() {
        let tree = DirectoryTree::from_paths(["/a/b/c/"]);
        assert_eq!(tree.paths().collect::<Vec<_>>(), vec!["/", "/a/", "/a/b/", "/a/b/c/"]);
        assert!(tree.root().is_root());
    }

    #[test]
    fn test_lookup_is_exact() {
        let tree = DirectoryTree::from_paths(["/a/b/"]);
        assert!(tree.find_directory("/a/b/").is_some());
        assert!(tree.find_directory("/a/b").is_none());
        assert!(tree.find_directory("a/b/").is_none());
    }

    #[test]
    fn test_insert_keeps_assigned_id() {
        let mut tree = DirectoryTree::new();
        tree.insert(DirectoryHandle::new(DirectoryId::new("42"), "/sales/daily"));
        let handle = tree.find_directory("/sales/daily/").unwrap();
        assert_eq!(handle.id().as_str(), "42");
        assert!(tree.find_directory("/sales/").is_some());
    }
}
