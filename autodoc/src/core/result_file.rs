//! Result files registered by a run.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Comment attached to every document produced by the step.
pub const GENERATED_DOCUMENT_COMMENT: &str =
    "This file was generated by the 'Auto Documentation Output' step";

/// Classification of a result file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultFileType {
    /// A general output file.
    General,
    /// A log file.
    Log,
}

/// A file produced by a run that the host should know about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultFile {
    /// The kind of file.
    #[serde(rename = "type")]
    pub file_type: ResultFileType,
    /// The produced file.
    pub path: PathBuf,
    /// Name of the pipeline that ran the step.
    pub origin_parent: String,
    /// Name of the step that produced the file.
    pub origin: String,
    /// Free-form annotation.
    pub comment: Option<String>,
    /// When the file was registered.
    pub timestamp: DateTime<Utc>,
}

impl ResultFile {
    /// Creates a new result file.
    #[must_use]
    pub fn new(
        file_type: ResultFileType,
        path: impl Into<PathBuf>,
        origin_parent: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            file_type,
            path: path.into(),
            origin_parent: origin_parent.into(),
            origin: origin.into(),
            comment: None,
            timestamp: Utc::now(),
        }
    }

    /// Sets the comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// The shared list of result files of a run.
///
/// Cloning shares the same list, so the host keeps one handle and gives
/// another to the step.
#[derive(Debug, Clone, Default)]
pub struct ResultFiles {
    files: Arc<Mutex<Vec<ResultFile>>>,
}

impl ResultFiles {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a file.
    pub fn add(&self, file: ResultFile) {
        self.files.lock().push(file);
    }

    /// Returns a copy of the registered files.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ResultFile> {
        self.files.lock().clone()
    }

    /// Returns the number of registered files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.lock().len()
    }

    /// Returns true if nothing was registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.lock().is_empty()
    }
}
