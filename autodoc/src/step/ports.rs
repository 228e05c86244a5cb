//! Collaborators a step talks to.

use std::fmt;
use std::sync::Arc;

use crate::config::Variables;
use crate::core::ResultFiles;
use crate::events::{EventSink, NoOpEventSink};
use crate::providers::ProviderTable;
use crate::render::{DocumentRenderer, RenderEngineBootstrap};
use crate::repository::Repository;

/// Everything outside the step that a run needs.
///
/// Only the variables and result list have useful defaults. Without a
/// repository, subject names are file paths. Without explicit providers,
/// definition-backed providers over the repository (or the file system)
/// are used. Document output needs a renderer and a bootstrap.
#[derive(Clone)]
pub struct StepPorts {
    repository: Option<Arc<dyn Repository>>,
    providers: Option<ProviderTable>,
    renderer: Option<Arc<dyn DocumentRenderer>>,
    bootstrap: Option<Arc<RenderEngineBootstrap>>,
    events: Arc<dyn EventSink>,
    result_files: ResultFiles,
    variables: Variables,
    pipeline_name: String,
}

impl Default for StepPorts {
    fn default() -> Self {
        Self {
            repository: None,
            providers: None,
            renderer: None,
            bootstrap: None,
            events: Arc::new(NoOpEventSink),
            result_files: ResultFiles::new(),
            variables: Variables::new(),
            pipeline_name: String::new(),
        }
    }
}

impl fmt::Debug for StepPorts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepPorts")
            .field("repository", &self.repository.as_ref().map(|r| r.name().to_string()))
            .field("providers", &self.providers)
            .field("has_renderer", &self.renderer.is_some())
            .field("bootstrap", &self.bootstrap)
            .field("result_files", &self.result_files.len())
            .field("variables", &self.variables)
            .field("pipeline_name", &self.pipeline_name)
            .finish_non_exhaustive()
    }
}

impl StepPorts {
    /// Creates ports with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the hierarchical store subjects are looked up in.
    #[must_use]
    pub fn with_repository(mut self, repository: Arc<dyn Repository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Sets explicit information providers.
    #[must_use]
    pub fn with_providers(mut self, providers: ProviderTable) -> Self {
        self.providers = Some(providers);
        self
    }

    /// Sets the document renderer.
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn DocumentRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Sets the shared engine bootstrap.
    #[must_use]
    pub fn with_bootstrap(mut self, bootstrap: Arc<RenderEngineBootstrap>) -> Self {
        self.bootstrap = Some(bootstrap);
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Sets the result file list shared with the host.
    #[must_use]
    pub fn with_result_files(mut self, result_files: ResultFiles) -> Self {
        self.result_files = result_files;
        self
    }

    /// Sets the variable space.
    #[must_use]
    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    /// Sets the name of the pipeline running the step.
    #[must_use]
    pub fn with_pipeline_name(mut self, name: impl Into<String>) -> Self {
        self.pipeline_name = name.into();
        self
    }

    /// Returns the repository, if any.
    #[must_use]
    pub fn repository(&self) -> Option<&Arc<dyn Repository>> {
        self.repository.as_ref()
    }

    /// Returns the explicit providers, or definition-backed ones.
    #[must_use]
    pub fn providers(&self) -> ProviderTable {
        self.providers
            .clone()
            .unwrap_or_else(|| ProviderTable::definitions(self.repository.clone()))
    }

    /// Returns the renderer, if any.
    #[must_use]
    pub fn renderer(&self) -> Option<&Arc<dyn DocumentRenderer>> {
        self.renderer.as_ref()
    }

    /// Returns the bootstrap, if any.
    #[must_use]
    pub fn bootstrap(&self) -> Option<&Arc<RenderEngineBootstrap>> {
        self.bootstrap.as_ref()
    }

    /// Returns the event sink.
    #[must_use]
    pub fn events(&self) -> &Arc<dyn EventSink> {
        &self.events
    }

    /// Returns the result file list.
    #[must_use]
    pub fn result_files(&self) -> &ResultFiles {
        &self.result_files
    }

    /// Returns the variable space.
    #[must_use]
    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn pipeline_name(&self) -> &str {
        &self.pipeline_name
    }
}
