//! Error types for the auto-documentation step.
//!
//! Every failure is fatal for the run that raised it: nothing is retried and
//! the original cause is kept as the error source.

use std::path::PathBuf;
use thiserror::Error;

use crate::step::RunPhase;

/// The main error type for auto-documentation runs.
#[derive(Debug, Error)]
pub enum AutoDocError {
    /// Invalid or unresolvable configuration.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// A row carried a subject type label that is not recognized.
    #[error("{0}")]
    UnknownType(#[from] UnknownTypeError),

    /// A hierarchical lookup missed.
    #[error("{0}")]
    DirectoryNotFound(#[from] DirectoryNotFoundError),

    /// No location could be built for a row.
    #[error("{0}")]
    LocationResolution(#[from] LocationResolutionError),

    /// The subject image could not be encoded.
    #[error("{0}")]
    ImageSerialization(#[from] ImageSerializationError),

    /// The document renderer (or its engine boot) failed.
    #[error("{0}")]
    Render(#[from] RenderError),

    /// An information provider could not load subject data.
    #[error("Unable to load information for subject '{subject}': {source}")]
    Provider {
        /// Display form of the subject location.
        subject: String,
        /// The underlying cause.
        #[source]
        source: anyhow::Error,
    },

    /// The directory store could not be read.
    #[error("Unable to load repository directory tree: {0}")]
    Repository(#[source] anyhow::Error),

    /// Downstream stopped accepting rows.
    #[error("Output row set was closed before the run completed")]
    OutputClosed,

    /// An operation was invoked in a phase that does not allow it.
    #[error("Cannot {operation} while the run is {phase}")]
    InvalidPhase {
        /// The attempted operation.
        operation: &'static str,
        /// The phase the run was in.
        phase: RunPhase,
    },
}

impl AutoDocError {
    /// Creates a provider error for the given subject.
    #[must_use]
    pub fn provider(subject: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Provider {
            subject: subject.into(),
            source,
        }
    }

    /// Creates an invalid phase error.
    #[must_use]
    pub fn invalid_phase(operation: &'static str, phase: RunPhase) -> Self {
        Self::InvalidPhase { operation, phase }
    }
}

/// Configuration errors detected while validating or initializing a run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A configured field name does not exist in the input schema.
    #[error("Unable to find the {role} field '{field}' in the input")]
    FieldNotFound {
        /// Which setting referenced the field ("filename" or "file type").
        role: &'static str,
        /// The field name after variable substitution.
        field: String,
    },

    /// The output type label is not recognized.
    #[error("Unknown output type '{0}' (expected PDF, HTML, DOC, XLS, CSV or METADATA)")]
    InvalidOutputType(String),

    /// A configured field has the wrong value type.
    #[error("Field '{field}' must be a string field")]
    NotAStringField {
        /// The offending field.
        field: String,
    },

    /// Any other invalid setting.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Creates a field-not-found error.
    #[must_use]
    pub fn field_not_found(role: &'static str, field: impl Into<String>) -> Self {
        Self::FieldNotFound {
            role,
            field: field.into(),
        }
    }
}

/// Raised when a type label matches neither recognized subject type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown file type value '{label}' (expected 'Transformation' or 'Job')")]
pub struct UnknownTypeError {
    /// The label as found in the row.
    pub label: String,
}

impl UnknownTypeError {
    /// Creates a new unknown type error.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

/// Raised when a directory path is absent from the directory index.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Repository directory '{path}' could not be found")]
pub struct DirectoryNotFoundError {
    /// The directory path that was looked up.
    pub path: String,
}

impl DirectoryNotFoundError {
    /// Creates a new directory not found error.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Raised when a row cannot be turned into a subject location.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unable to determine the location of '{file_name}' of type '{file_type}'")]
pub struct LocationResolutionError {
    /// The name as found in the row.
    pub file_name: String,
    /// The type label as found in the row.
    pub file_type: String,
}

impl LocationResolutionError {
    /// Creates a new location resolution error.
    #[must_use]
    pub fn new(file_name: impl Into<String>, file_type: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            file_type: file_type.into(),
        }
    }
}

/// Raised when a subject image cannot be written as PNG.
#[derive(Debug, Error)]
#[error("Unable to serialize image to PNG")]
pub struct ImageSerializationError {
    /// The encoder failure.
    #[source]
    pub source: anyhow::Error,
}

impl ImageSerializationError {
    /// Wraps an encoder failure.
    #[must_use]
    pub fn new(source: impl Into<anyhow::Error>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

/// Which part of document production failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    /// Starting the render engine.
    Boot,
    /// Building the report from the collected subjects.
    Build,
    /// Writing the report to its target.
    Render,
}

impl std::fmt::Display for RenderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Boot => write!(f, "boot"),
            Self::Build => write!(f, "build"),
            Self::Render => write!(f, "render"),
        }
    }
}

/// Raised when the report could not be produced.
#[derive(Debug, Error)]
#[error("Unable to render report to '{}' ({stage} failed)", target.display())]
pub struct RenderError {
    /// The stage that failed.
    pub stage: RenderStage,
    /// The document that was being produced.
    pub target: PathBuf,
    /// The underlying cause.
    #[source]
    pub source: anyhow::Error,
}

impl RenderError {
    /// Creates a new render error.
    #[must_use]
    pub fn new(stage: RenderStage, target: impl Into<PathBuf>, source: anyhow::Error) -> Self {
        Self {
            stage,
            target: target.into(),
            source,
        }
    }
}
