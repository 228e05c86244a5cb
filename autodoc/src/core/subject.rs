//! Subject types and resolved subject locations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::UnknownTypeError;
use crate::repository::DirectoryHandle;

/// The kind of definition a subject is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectType {
    /// A data process definition, labelled "Transformation" in rows.
    Process,
    /// A job-like workflow definition, labelled "Job" in rows.
    Workflow,
}

impl SubjectType {
    /// Both subject types, in declaration order.
    pub const ALL: [Self; 2] = [Self::Process, Self::Workflow];

    /// Returns the canonical row label for this type.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Process => "Transformation",
            Self::Workflow => "Job",
        }
    }

    /// Maps a row label to a subject type, ignoring case.
    ///
    /// Characters are compared one by one on their Unicode upper and lower
    /// case forms, so "tranſformation" names a process.
    pub fn from_label(label: &str) -> Result<Self, UnknownTypeError> {
        Self::ALL
            .into_iter()
            .find(|t| eq_ignore_case(t.label(), label))
            .ok_or_else(|| UnknownTypeError::new(label))
    }
}

impl FromStr for SubjectType {
    type Err = UnknownTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s)
    }
}

impl fmt::Display for SubjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a subject lives.
///
/// A location is either a plain path (no repository configured) or a leaf
/// name inside a repository directory. It is never both.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubjectLocation {
    /// A definition addressed by path, used as given.
    File {
        /// The path exactly as it appeared in the row.
        path: String,
        /// The subject type.
        subject_type: SubjectType,
    },
    /// A definition stored in a repository directory.
    Repository {
        /// The directory holding the definition.
        directory: DirectoryHandle,
        /// The definition name inside the directory.
        name: String,
        /// The subject type.
        subject_type: SubjectType,
    },
}

impl SubjectLocation {
    /// Creates a path location.
    #[must_use]
    pub fn file(path: impl Into<String>, subject_type: SubjectType) -> Self {
        Self::File {
            path: path.into(),
            subject_type,
        }
    }

    /// Creates a repository location.
    #[must_use]
    pub fn repository(
        directory: DirectoryHandle,
        name: impl Into<String>,
        subject_type: SubjectType,
    ) -> Self {
        Self::Repository {
            directory,
            name: name.into(),
            subject_type,
        }
    }

    /// Returns the subject type.
    #[must_use]
    pub const fn subject_type(&self) -> SubjectType {
        match self {
            Self::File { subject_type, .. } | Self::Repository { subject_type, .. } => {
                *subject_type
            }
        }
    }

    /// Returns the leaf name of the subject (the path for file locations).
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::File { path, .. } => path,
            Self::Repository { name, .. } => name,
        }
    }

    /// Returns true for repository locations.
    #[must_use]
    pub const fn is_repository(&self) -> bool {
        matches!(self, Self::Repository { .. })
    }
}

impl fmt::Display for SubjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File { path, subject_type } => write!(f, "{subject_type} {path}"),
            Self::Repository {
                directory,
                name,
                subject_type,
            } => write!(f, "{subject_type} {}{name}", directory.path()),
        }
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars().count() == b.chars().count()
        && a.chars().zip(b.chars()).all(|(x, y)| {
            x == y
                || x.to_uppercase().eq(y.to_uppercase())
                || x.to_lowercase().eq(y.to_lowercase())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_case_insensitive() {
        for label in ["Transformation", "TRANSFORMATION", "transformation", "tRaNsFoRmAtIoN"] {
            assert_eq!(SubjectType::from_label(label), Ok(SubjectType::Process));
        }
        for label in ["Job", "JOB", "job", "jOb"] {
            assert_eq!(SubjectType::from_label(label), Ok(SubjectType::Workflow));
        }
    }

    #[test]
    fn test_labels_fold_unicode_case() {
        assert_eq!(SubjectType::from_label("TRANſFORMATION"), Ok(SubjectType::Process));
        assert_eq!(SubjectType::from_label("transformatıon"), Ok(SubjectType::Process));
        assert!(SubjectType::from_label("Joƀ").is_err());
    }

    #[test]
    fn test_unknown_labels_fail() {
        for label in ["", "Jobs", "Transform", " Job", "report"] {
            let err = SubjectType::from_label(label).unwrap_err();
            assert_eq!(err.label, label);
        }
    }

    #[test]
    fn test_file_location_accessors() {
        let location = SubjectLocation::file("/etl/load.ktr", SubjectType::Process);
        assert_eq!(location.subject_type(), SubjectType::Process);
        assert_eq!(location.name(), "/etl/load.ktr");
        assert!(!location.is_repository());
        assert_eq!(location.to_string(), "Transformation /etl/load.ktr");
    }
}
