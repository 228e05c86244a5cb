//! Rows and wiring for step tests.

use std::sync::Arc;

use super::mocks::{CountingRenderEngine, RecordingRenderer, StaticProvider};
use crate::core::{ResultFiles, Row, RowMeta, SubjectType, Value, ValueMeta, ValueType};
use crate::events::CollectingEventSink;
use crate::providers::ProviderTable;
use crate::render::RenderEngineBootstrap;
use crate::step::StepPorts;

/// Input schema `(id: Integer, filename: String, filetype: String)`.
#[must_use]
pub fn input_meta() -> Arc<RowMeta> {
    Arc::new(
        RowMeta::new()
            .with_field(ValueMeta::new("id", ValueType::Integer))
            .with_field(ValueMeta::string("filename"))
            .with_field(ValueMeta::string("filetype")),
    )
}

/// A row of [`input_meta`].
#[must_use]
pub fn subject_row(id: i64, name: &str, type_label: &str) -> Row {
    Row::new(
        input_meta(),
        vec![Value::Integer(id), Value::from(name), Value::from(type_label)],
    )
}

/// Rows of [`input_meta`] numbered from 1.
#[must_use]
pub fn subject_rows(subjects: &[(&str, &str)]) -> Vec<Row> {
    subjects
        .iter()
        .zip(1..)
        .map(|((name, label), id)| subject_row(id, name, label))
        .collect()
}

/// Recording collaborators for one step, with handles kept for assertions.
#[derive(Debug)]
pub struct StepHarness {
    /// Provider for processes.
    pub process: Arc<StaticProvider>,
    /// Provider for workflows.
    pub workflow: Arc<StaticProvider>,
    /// Document renderer.
    pub renderer: Arc<RecordingRenderer>,
    /// Render engine behind the bootstrap.
    pub engine: Arc<CountingRenderEngine>,
    /// Shared bootstrap.
    pub bootstrap: Arc<RenderEngineBootstrap>,
    /// Collected events.
    pub events: Arc<CollectingEventSink>,
    /// Registered result files.
    pub result_files: ResultFiles,
}

impl Default for StepHarness {
    fn default() -> Self {
        Self::with_renderer(RecordingRenderer::new())
    }
}

impl StepHarness {
    /// Creates a harness with succeeding collaborators.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a harness around a configured renderer.
    #[must_use]
    pub fn with_renderer(renderer: RecordingRenderer) -> Self {
        let engine = Arc::new(CountingRenderEngine::new());
        Self {
            process: Arc::new(StaticProvider::sample(SubjectType::Process)),
            workflow: Arc::new(StaticProvider::sample(SubjectType::Workflow)),
            renderer: Arc::new(renderer),
            bootstrap: Arc::new(RenderEngineBootstrap::new(engine.clone())),
            engine,
            events: Arc::new(CollectingEventSink::new()),
            result_files: ResultFiles::new(),
        }
    }

    /// Replaces the process provider.
    #[must_use]
    pub fn with_process_provider(mut self, provider: StaticProvider) -> Self {
        self.process = Arc::new(provider);
        self
    }

    /// Ports wired to the harness collaborators.
    #[must_use]
    pub fn ports(&self) -> StepPorts {
        StepPorts::new()
            .with_providers(ProviderTable::new(self.process.clone(), self.workflow.clone()))
            .with_renderer(self.renderer.clone())
            .with_bootstrap(self.bootstrap.clone())
            .with_events(self.events.clone())
            .with_result_files(self.result_files.clone())
            .with_pipeline_name("nightly_docs")
    }
}
