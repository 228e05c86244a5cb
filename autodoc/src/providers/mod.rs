//! Information providers: per-type access to subject definitions.
//!
//! The projector talks to providers only through [`InformationProvider`] and
//! [`SubjectHandle`]. A [`ProviderTable`] holds one provider per subject type
//! and is built once, before the first row is projected.

mod definition;
mod diagram;

pub use definition::{DefinitionProvider, DiagramNode, ExecutionRecord, LogTable, SubjectDefinition};
pub use diagram::{AreaType, DiagramArea, RasterImage, Rgba, ICON_SIZE, MAX_CANVAS_PIXELS};

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

use crate::core::{SubjectLocation, SubjectType};
use crate::repository::Repository;

/// A loaded subject definition.
///
/// Every accessor may return `None`; callers pass absence through.
pub trait SubjectHandle: Send + Sync + fmt::Debug {
    /// The subject name.
    fn name(&self) -> Option<String>;

    /// The short description.
    fn description(&self) -> Option<String>;

    /// The extended description.
    fn extended_description(&self) -> Option<String>;

    /// When the definition was created.
    fn created(&self) -> Option<DateTime<Utc>>;

    /// When the definition was last modified.
    fn modified(&self) -> Option<DateTime<Utc>>;

    /// Summary of where executions are logged.
    fn logging_configuration(&self) -> Option<String>;

    /// Summary of the most recent execution.
    fn last_execution_result(&self) -> Option<String>;

    /// Draws the subject diagram.
    fn image(&self) -> anyhow::Result<RasterImage>;
}

/// Loads subjects of one type.
pub trait InformationProvider: Send + Sync {
    /// Loads the subject at `location`.
    fn fetch_subject(&self, location: &SubjectLocation) -> anyhow::Result<Arc<dyn SubjectHandle>>;

    /// Returns the clickable areas of the subject diagram, in drawing order.
    fn fetch_diagram_areas(&self, location: &SubjectLocation) -> anyhow::Result<Vec<DiagramArea>>;
}

/// One information provider per subject type.
#[derive(Clone)]
pub struct ProviderTable {
    process: Arc<dyn InformationProvider>,
    workflow: Arc<dyn InformationProvider>,
}

impl fmt::Debug for ProviderTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderTable").finish_non_exhaustive()
    }
}

impl ProviderTable {
    /// Creates a table from explicit providers.
    #[must_use]
    pub fn new(
        process: Arc<dyn InformationProvider>,
        workflow: Arc<dyn InformationProvider>,
    ) -> Self {
        Self { process, workflow }
    }

    /// Creates definition-backed providers, reading from `repository` when
    /// one is given and from the file system otherwise.
    #[must_use]
    pub fn definitions(repository: Option<Arc<dyn Repository>>) -> Self {
        Self {
            process: Arc::new(DefinitionProvider::new(
                SubjectType::Process,
                repository.clone(),
            )),
            workflow: Arc::new(DefinitionProvider::new(SubjectType::Workflow, repository)),
        }
    }

    /// Returns the provider for a subject type.
    #[must_use]
    pub fn for_type(&self, subject_type: SubjectType) -> &dyn InformationProvider {
        match subject_type {
            SubjectType::Process => self.process.as_ref(),
            SubjectType::Workflow => self.workflow.as_ref(),
        }
    }
}
