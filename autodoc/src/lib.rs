//! # Autodoc
//!
//! A row-driven step that documents process and workflow definitions.
//!
//! Each input row names a subject and its type. Depending on the configured
//! output mode the step either:
//!
//! - **Metadata**: resolves the subject, loads its definition and appends the
//!   selected metadata columns to the row
//! - **Document**: collects every subject and, at the end of the stream,
//!   renders one consolidated document and emits a single row naming it
//!
//! Subjects are addressed by file path, or by path inside a repository whose
//! directory tree is loaded once per run.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use autodoc::prelude::*;
//!
//! let config = AutoDocConfig::new()
//!     .with_output_type(OutputMode::Metadata)
//!     .with_input_fields("path", "kind");
//! let mut step = AutoDocStep::new(config, StepPorts::new())?;
//!
//! let summary = step.run(&mut input, &mut output).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod location;
pub mod observability;
pub mod projector;
pub mod providers;
pub mod render;
pub mod repository;
pub mod step;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{
        AutoDocConfig, DocumentFormat, FieldSelection, MetadataField, OutputMode, Variables,
    };
    pub use crate::core::{
        ResultFile, ResultFiles, Row, RowMeta, SubjectLocation, SubjectType, Value, ValueMeta,
        ValueType,
    };
    pub use crate::errors::{AutoDocError, ConfigError, RenderError};
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink, StepEvent};
    pub use crate::location::LocationResolver;
    pub use crate::projector::MetadataProjector;
    pub use crate::providers::{InformationProvider, ProviderTable, SubjectHandle};
    pub use crate::render::{DocumentRenderer, RenderEngine, RenderEngineBootstrap, RenderJob};
    pub use crate::repository::{DirectoryTree, InMemoryRepository, Repository};
    pub use crate::step::{AutoDocStep, RowInput, RowOutput, RunPhase, RunSummary, StepPorts};
}
