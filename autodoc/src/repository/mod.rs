//! Hierarchical definition stores.
//!
//! A repository exposes its directory tree (loaded once per run) and loads
//! subject definitions addressed by directory and name. Connection handling
//! belongs to implementations; [`InMemoryRepository`] is the reference one.

mod directory;
mod memory;

pub use directory::{normalize_directory_path, DirectoryHandle, DirectoryId, DirectoryTree};
pub use memory::InMemoryRepository;

use crate::core::SubjectType;
use crate::providers::SubjectDefinition;

/// Separator between repository directory names.
pub const DIRECTORY_SEPARATOR: char = '/';

/// Path of the repository root directory.
pub const ROOT_PATH: &str = "/";

/// A hierarchical store of subject definitions.
pub trait Repository: Send + Sync {
    /// Returns a display name for logs.
    fn name(&self) -> &str;

    /// Loads the complete directory tree.
    fn load_directory_tree(&self) -> anyhow::Result<DirectoryTree>;

    /// Loads one definition.
    fn load_definition(
        &self,
        directory: &DirectoryHandle,
        name: &str,
        subject_type: SubjectType,
    ) -> anyhow::Result<SubjectDefinition>;
}
