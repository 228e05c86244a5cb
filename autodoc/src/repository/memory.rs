//! In-memory repository.

use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{normalize_directory_path, DirectoryHandle, DirectoryTree, Repository, DIRECTORY_SEPARATOR};
use crate::core::SubjectType;
use crate::providers::SubjectDefinition;

type DefinitionKey = (String, String, SubjectType);

/// A repository kept entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    name: String,
    directories: RwLock<BTreeSet<String>>,
    definitions: RwLock<HashMap<DefinitionKey, SubjectDefinition>>,
    tree_loads: AtomicUsize,
}

impl InMemoryRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds an empty directory.
    #[must_use]
    pub fn with_directory(self, path: &str) -> Self {
        self.directories.write().insert(normalize_directory_path(path));
        self
    }

    /// Stores a definition under a full path such as `/sales/load_orders`.
    #[must_use]
    pub fn with_definition(
        self,
        full_path: &str,
        subject_type: SubjectType,
        definition: SubjectDefinition,
    ) -> Self {
        self.insert(full_path, subject_type, definition);
        self
    }

    /// Stores a definition under a full path.
    pub fn insert(&self, full_path: &str, subject_type: SubjectType, definition: SubjectDefinition) {
        let (directory, name) = match full_path.rfind(DIRECTORY_SEPARATOR) {
            Some(i) => (&full_path[..=i], &full_path[i + 1..]),
            None => ("", full_path),
        };
        let directory = normalize_directory_path(directory);
        self.directories.write().insert(directory.clone());
        self.definitions
            .write()
            .insert((directory, name.to_string(), subject_type), definition);
    }

    /// Returns how many times the directory tree was loaded.
    #[must_use]
    pub fn tree_loads(&self) -> usize {
        self.tree_loads.load(Ordering::SeqCst)
    }
}

impl Repository for InMemoryRepository {
    fn name(&self) -> &str {
        &self.name
    }

    fn load_directory_tree(&self) -> anyhow::Result<DirectoryTree> {
        self.tree_loads.fetch_add(1, Ordering::SeqCst);
        Ok(DirectoryTree::from_paths(self.directories.read().iter()))
    }

    fn load_definition(
        &self,
        directory: &DirectoryHandle,
        name: &str,
        subject_type: SubjectType,
    ) -> anyhow::Result<SubjectDefinition> {
        let key = (directory.path().to_string(), name.to_string(), subject_type);
        self.definitions.read().get(&key).cloned().ok_or_else(|| {
            anyhow::anyhow!(
                "{subject_type} '{name}' does not exist in directory '{}' of repository '{}'",
                directory.path(),
                self.name
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definitions_are_found_by_directory_and_name() {
        let repo = InMemoryRepository::new("dev").with_definition(
            "/sales/load_orders",
            SubjectType::Process,
            SubjectDefinition::named("load_orders"),
        );

        let tree = repo.load_directory_tree().unwrap();
        let sales = tree.find_directory("/sales/").unwrap();
        let def = repo
            .load_definition(sales, "load_orders", SubjectType::Process)
            .unwrap();
        assert_eq!(def.name.as_deref(), Some("load_orders"));
        assert_eq!(repo.tree_loads(), 1);
    }

    #[test]
    fn test_type_is_part_of_the_key() {
        let repo = InMemoryRepository::new("dev").with_definition(
            "nightly",
            SubjectType::Workflow,
            SubjectDefinition::named("nightly"),
        );
        let tree = repo.load_directory_tree().unwrap();
        let err = repo
            .load_definition(tree.root(), "nightly", SubjectType::Process)
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
        assert!(repo
            .load_definition(tree.root(), "nightly", SubjectType::Workflow)
            .is_ok());
    }
}
