//! The row-driven step runtime.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, trace};
use uuid::Uuid;

use super::ports::StepPorts;
use super::rowset::{RowInput, RowOutput};
use super::state::{InputFields, RunPhase, RunState};
use crate::config::{AutoDocConfig, OutputMode};
use crate::core::{
    ResultFile, ResultFileType, Row, RowMeta, Value, ValueMeta, ValueType,
    GENERATED_DOCUMENT_COMMENT,
};
use crate::errors::{AutoDocError, ConfigError, RenderError, RenderStage};
use crate::events::StepEvent;
use crate::location::LocationResolver;
use crate::observability::SpanTimer;
use crate::projector::MetadataProjector;
use crate::render::RenderRequest;

/// Name of the single column emitted in document mode.
pub const DOCUMENT_FIELD: &str = "filename";

/// Outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Run identifier.
    pub run_id: Uuid,
    /// Rows received.
    pub rows_read: u64,
    /// Rows emitted, including the document row.
    pub rows_written: u64,
    /// The produced document, if any.
    pub document: Option<PathBuf>,
}

/// One run of the auto-documentation step.
///
/// The first row fixes the input schema. In metadata mode each row is
/// resolved, projected and returned right away. In document mode rows only
/// contribute their subject location; `finalize` renders one document for
/// all of them and returns a single row naming it.
///
/// Any error ends the run: the step moves to [`RunPhase::Terminal`] and every
/// later call fails with [`AutoDocError::InvalidPhase`].
#[derive(Debug)]
pub struct AutoDocStep {
    config: AutoDocConfig,
    ports: StepPorts,
    run_id: Uuid,
    state: RunState,
}

impl AutoDocStep {
    /// Creates a run after validating `config`.
    pub fn new(config: AutoDocConfig, ports: StepPorts) -> Result<Self, AutoDocError> {
        config.validate()?;
        Ok(Self {
            config,
            ports,
            run_id: Uuid::new_v4(),
            state: RunState::new(),
        })
    }

    /// Returns the run identifier.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Returns the current phase.
    #[must_use]
    pub const fn phase(&self) -> RunPhase {
        self.state.phase
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &AutoDocConfig {
        &self.config
    }

    /// Returns the output schema once initialized.
    #[must_use]
    pub fn output_meta(&self) -> Option<&Arc<RowMeta>> {
        self.state.output_meta.as_ref()
    }

    /// Returns the resolved input column indexes once initialized.
    #[must_use]
    pub const fn input_fields(&self) -> Option<InputFields> {
        self.state.input_fields
    }

    /// Returns the run totals so far.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            run_id: self.run_id,
            rows_read: self.state.rows_read,
            rows_written: self.state.rows_written,
            document: self.state.document.clone(),
        }
    }

    /// Resolves the configured fields against `input_meta` and builds the
    /// output schema. Called implicitly by the first [`process_row`].
    ///
    /// [`process_row`]: Self::process_row
    pub fn initialize(&mut self, input_meta: &RowMeta) -> Result<(), AutoDocError> {
        let result = self
            .expect_phase("initialize", &[RunPhase::Uninitialized])
            .and_then(|()| self.try_initialize(input_meta));
        self.settle(result)
    }

    /// Handles one input row.
    ///
    /// Returns the enriched row in metadata mode and nothing in document
    /// mode.
    pub fn process_row(&mut self, row: Row) -> Result<Option<Row>, AutoDocError> {
        let result = self
            .begin_row(&row)
            .and_then(|()| self.try_process_row(row));
        self.settle(result)
    }

    /// Ends the input stream.
    ///
    /// In document mode with at least one collected subject this renders the
    /// document, registers it as a result file and returns the row naming
    /// it. Otherwise returns nothing.
    pub fn finalize(&mut self) -> Result<Option<Row>, AutoDocError> {
        let result = self
            .expect_phase(
                "finalize",
                &[
                    RunPhase::Uninitialized,
                    RunPhase::Initialized,
                    RunPhase::Streaming,
                ],
            )
            .and_then(|()| {
                self.state.phase = RunPhase::Draining;
                self.try_finalize()
            });
        let output = self.settle(result)?;

        self.state.phase = RunPhase::Terminal;
        info!(
            run_id = %self.run_id,
            step = %self.config.step_name,
            rows_read = self.state.rows_read,
            rows_written = self.state.rows_written,
            "Run completed"
        );
        self.emit(&StepEvent::Completed {
            run_id: self.run_id,
            rows_read: self.state.rows_read,
            rows_written: self.state.rows_written,
        });
        Ok(output)
    }

    /// Drives a whole run: pulls rows from `input` until it ends, forwards
    /// every produced row to `output` in order, finalizes and closes the
    /// output.
    pub async fn run<I, O>(&mut self, input: &mut I, output: &mut O) -> Result<RunSummary, AutoDocError>
    where
        I: RowInput + ?Sized,
        O: RowOutput + ?Sized,
    {
        info!(
            run_id = %self.run_id,
            step = %self.config.step_name,
            output_type = %self.config.output_type,
            "Starting run"
        );

        while let Some(row) = input.next_row().await {
            if let Some(out) = self.process_row(row)? {
                self.forward(output, out).await?;
            }
        }
        if let Some(out) = self.finalize()? {
            self.forward(output, out).await?;
        }
        output.finish().await;

        Ok(self.summary())
    }

    async fn forward<O>(&mut self, output: &mut O, row: Row) -> Result<(), AutoDocError>
    where
        O: RowOutput + ?Sized,
    {
        let result = output.put_row(row).await;
        self.settle(result)
    }

    fn try_initialize(&mut self, input_meta: &RowMeta) -> Result<(), AutoDocError> {
        let variables = self.ports.variables();
        let input_fields = InputFields {
            filename: locate_string_field(
                input_meta,
                "filename",
                &variables.substitute(&self.config.filename_field),
            )?,
            file_type: locate_string_field(
                input_meta,
                "file type",
                &variables.substitute(&self.config.file_type_field),
            )?,
        };

        let (output_meta, projector) = match self.config.output_type {
            OutputMode::Metadata => {
                let projector = MetadataProjector::new(self.ports.providers(), self.config.fields);
                let mut meta = input_meta.clone();
                for field in projector.output_fields() {
                    meta.push(field);
                }
                (meta, Some(projector))
            }
            OutputMode::Document(_) => {
                if self.ports.renderer().is_none() || self.ports.bootstrap().is_none() {
                    return Err(ConfigError::Invalid(
                        "document output requires a renderer and a render engine bootstrap".into(),
                    )
                    .into());
                }
                (document_meta(), None)
            }
        };

        let resolver = match self.ports.repository() {
            Some(repository) => {
                let tree = repository
                    .load_directory_tree()
                    .map_err(AutoDocError::Repository)?;
                debug!(
                    repository = repository.name(),
                    directories = tree.len(),
                    "Loaded directory index"
                );
                LocationResolver::hierarchical(Arc::new(tree))
            }
            None => LocationResolver::flat(),
        };

        let output_meta = Arc::new(output_meta);
        self.emit(&StepEvent::Initialized {
            run_id: self.run_id,
            output_type: self.config.output_type.to_string(),
            hierarchical: resolver.directory_index().is_some(),
            output_fields: output_meta
                .field_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
        });
        debug!(
            run_id = %self.run_id,
            filename_index = input_fields.filename,
            file_type_index = input_fields.file_type,
            output_fields = output_meta.len(),
            "Step initialized"
        );

        self.state.input_fields = Some(input_fields);
        self.state.output_meta = Some(output_meta);
        self.state.projector = projector;
        self.state.resolver = resolver;
        self.state.phase = RunPhase::Initialized;
        Ok(())
    }

    fn begin_row(&mut self, row: &Row) -> Result<(), AutoDocError> {
        if self.state.phase == RunPhase::Uninitialized {
            self.try_initialize(row.meta())?;
        }
        self.expect_phase(
            "process a row",
            &[RunPhase::Initialized, RunPhase::Streaming],
        )?;
        self.state.phase = RunPhase::Streaming;
        self.state.rows_read += 1;
        Ok(())
    }

    fn try_process_row(&mut self, row: Row) -> Result<Option<Row>, AutoDocError> {
        let Some(fields) = self.state.input_fields else {
            return Err(AutoDocError::invalid_phase("process a row", self.state.phase));
        };

        let location = self
            .state
            .resolver
            .resolve_cells(row.get_str(fields.filename), row.get_str(fields.file_type))?;
        trace!(run_id = %self.run_id, location = %location, "Row resolved");
        self.emit(&StepEvent::SubjectResolved {
            run_id: self.run_id,
            location: location.to_string(),
        });

        match self.config.output_type {
            OutputMode::Document(_) => {
                self.state.accumulator.push(location);
                Ok(None)
            }
            OutputMode::Metadata => {
                let (Some(projector), Some(meta)) = (&self.state.projector, &self.state.output_meta)
                else {
                    return Err(AutoDocError::invalid_phase("process a row", self.state.phase));
                };
                let values = projector.project(&location)?;
                let out = row.extend(Arc::clone(meta), values);
                self.state.rows_written += 1;
                Ok(Some(out))
            }
        }
    }

    fn try_finalize(&mut self) -> Result<Option<Row>, AutoDocError> {
        let OutputMode::Document(format) = self.config.output_type else {
            return Ok(None);
        };
        let locations = self.state.accumulator.take();
        if locations.is_empty() {
            debug!(run_id = %self.run_id, "No subjects collected, skipping document");
            return Ok(None);
        }

        let target = self.target_path()?;
        let target_text = path_text(&target)?;
        let (Some(renderer), Some(bootstrap)) = (self.ports.renderer(), self.ports.bootstrap())
        else {
            return Err(ConfigError::Invalid(
                "document output requires a renderer and a render engine bootstrap".into(),
            )
            .into());
        };

        bootstrap
            .ensure_started()
            .map_err(|e| RenderError::new(RenderStage::Boot, target.clone(), e))?;

        let timer = SpanTimer::start("render");
        let mut request = RenderRequest::new(format, self.config.step_name.clone());
        if !self.ports.pipeline_name().is_empty() {
            request = request.with_pipeline_name(self.ports.pipeline_name());
        }
        let job = renderer
            .build(&locations, &target, &request)
            .map_err(|e| RenderError::new(RenderStage::Build, target.clone(), e))?;
        job.render()
            .map_err(|e| RenderError::new(RenderStage::Render, target.clone(), e))?;
        let duration_ms = timer.finish();

        info!(
            run_id = %self.run_id,
            step = %self.config.step_name,
            path = %target.display(),
            subjects = locations.len(),
            duration_ms,
            "Document rendered"
        );
        self.emit(&StepEvent::DocumentRendered {
            run_id: self.run_id,
            path: target.clone(),
            subjects: locations.len(),
            duration_ms,
        });

        self.ports.result_files().add(
            ResultFile::new(
                ResultFileType::General,
                target.clone(),
                self.ports.pipeline_name(),
                self.config.step_name.clone(),
            )
            .with_comment(GENERATED_DOCUMENT_COMMENT),
        );

        let meta = self
            .state
            .output_meta
            .clone()
            .unwrap_or_else(|| Arc::new(document_meta()));
        let row = Row::new(meta, vec![Value::String(target_text)]);
        self.state.document = Some(target);
        self.state.rows_written += 1;
        Ok(Some(row))
    }

    fn target_path(&self) -> Result<PathBuf, AutoDocError> {
        let target = self.ports.variables().substitute(&self.config.target_filename);
        std::path::absolute(&target).map_err(|e| {
            ConfigError::Invalid(format!(
                "target filename '{target}' cannot be made absolute: {e}"
            ))
            .into()
        })
    }

    fn expect_phase(&self, operation: &'static str, allowed: &[RunPhase]) -> Result<(), AutoDocError> {
        if allowed.contains(&self.state.phase) {
            Ok(())
        } else {
            Err(AutoDocError::invalid_phase(operation, self.state.phase))
        }
    }

    fn settle<T>(&mut self, result: Result<T, AutoDocError>) -> Result<T, AutoDocError> {
        if let Err(err) = &result {
            if self.state.phase != RunPhase::Terminal {
                error!(
                    run_id = %self.run_id,
                    step = %self.config.step_name,
                    phase = %self.state.phase,
                    error = %err,
                    "Run aborted"
                );
                self.emit(&StepEvent::Failed {
                    run_id: self.run_id,
                    error: err.to_string(),
                });
            }
            self.state.phase = RunPhase::Terminal;
        }
        result
    }

    fn emit(&self, event: &StepEvent) {
        self.ports.events().try_emit(event);
    }
}

/// Returns the path as text, refusing paths that are not valid UTF-8.
pub(crate) fn path_text(path: &Path) -> Result<String, ConfigError> {
    path.to_str().map(str::to_owned).ok_or_else(|| {
        ConfigError::Invalid(format!(
            "target filename '{}' is not valid UTF-8",
            path.display()
        ))
    })
}

fn document_meta() -> RowMeta {
    RowMeta::new().with_field(ValueMeta::string(DOCUMENT_FIELD))
}

fn locate_string_field(
    meta: &RowMeta,
    role: &'static str,
    name: &str,
) -> Result<usize, ConfigError> {
    let index = meta
        .index_of(name)
        .ok_or_else(|| ConfigError::field_not_found(role, name))?;
    match meta.field(index) {
        Some(field) if field.value_type == ValueType::String => Ok(index),
        _ => Err(ConfigError::NotAStringField {
            field: name.to_string(),
        }),
    }
}
