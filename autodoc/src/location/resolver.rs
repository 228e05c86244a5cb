//! Resolution of row cells into subject locations.

use std::sync::Arc;
use tracing::trace;

use crate::core::{SubjectLocation, SubjectType};
use crate::errors::{AutoDocError, DirectoryNotFoundError, LocationResolutionError, UnknownTypeError};
use crate::repository::{DirectoryTree, DIRECTORY_SEPARATOR};

/// Text used in errors for null cells.
const NULL_CELL: &str = "null";

/// Turns `(name, type label)` pairs into subject locations.
///
/// Without a directory index names are used as plain paths. With one, the
/// name is split at its last separator and the directory part is looked up.
#[derive(Debug, Clone, Default)]
pub struct LocationResolver {
    directory_index: Option<Arc<DirectoryTree>>,
}

impl LocationResolver {
    /// Creates a resolver for plain paths.
    #[must_use]
    pub fn flat() -> Self {
        Self::default()
    }

    /// Creates a resolver that looks names up in `index`.
    #[must_use]
    pub fn hierarchical(index: Arc<DirectoryTree>) -> Self {
        Self {
            directory_index: Some(index),
        }
    }

    /// Creates a resolver with an optional index.
    #[must_use]
    pub fn new(directory_index: Option<Arc<DirectoryTree>>) -> Self {
        Self { directory_index }
    }

    /// Returns the directory index, if any.
    #[must_use]
    pub fn directory_index(&self) -> Option<&Arc<DirectoryTree>> {
        self.directory_index.as_ref()
    }

    /// Resolves a name and a type label.
    pub fn resolve(&self, file_name: &str, file_type_label: &str) -> Result<SubjectLocation, AutoDocError> {
        let subject_type = SubjectType::from_label(file_type_label)?;

        let location = match &self.directory_index {
            None => SubjectLocation::file(file_name, subject_type),
            Some(index) => {
                let (directory_path, leaf_name) = split_repository_path(file_name);
                let directory = index
                    .find_directory(&directory_path)
                    .ok_or_else(|| DirectoryNotFoundError::new(directory_path.clone()))?;
                SubjectLocation::repository(directory.clone(), leaf_name, subject_type)
            }
        };

        trace!(location = %location, "Resolved subject location");
        Ok(location)
    }

    /// Resolves nullable row cells. A null type is an unknown type; a null
    /// name cannot be located.
    pub fn resolve_cells(
        &self,
        file_name: Option<&str>,
        file_type_label: Option<&str>,
    ) -> Result<SubjectLocation, AutoDocError> {
        let Some(label) = file_type_label else {
            return Err(UnknownTypeError::new(NULL_CELL).into());
        };
        let Some(name) = file_name else {
            return Err(LocationResolutionError::new(NULL_CELL, label).into());
        };
        self.resolve(name, label)
    }
}

/// Splits a repository path into `(directory path with trailing separator,
/// leaf name)`. Names without a separator live in the root directory.
#[must_use]
pub fn split_repository_path(file_name: &str) -> (String, String) {
    let (qualified, split_at) = match file_name.rfind(DIRECTORY_SEPARATOR) {
        Some(index) => (file_name.to_string(), index),
        None => (format!("{DIRECTORY_SEPARATOR}{file_name}"), 0),
    };
    let (directory, leaf) = qualified.split_at(split_at + DIRECTORY_SEPARATOR.len_utf8());
    (directory.to_string(), leaf.to_string())
}
