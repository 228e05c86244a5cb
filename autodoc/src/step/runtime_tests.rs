//! Tests for the step runtime.

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    use crate::config::{AutoDocConfig, DocumentFormat, FieldSelection, MetadataField, OutputMode, Variables};
    use crate::core::{
        ResultFileType, Row, RowMeta, SubjectLocation, SubjectType, Value,
        GENERATED_DOCUMENT_COMMENT,
    };
    use crate::errors::{AutoDocError, ConfigError, RenderStage};
    use crate::providers::SubjectDefinition;
    use crate::render::RenderEngineBootstrap;
    use crate::repository::InMemoryRepository;
    use crate::step::{
        row_channel, AutoDocStep, CollectingRowOutput, RowInput, RowOutput, RunPhase, StepPorts,
        VecRowInput, DOCUMENT_FIELD,
    };
    use crate::testing::{
        input_meta, subject_row, subject_rows, CountingRenderEngine, RecordingRenderer,
        StaticProvider, StepHarness,
    };

    fn metadata_config(fields: FieldSelection) -> AutoDocConfig {
        AutoDocConfig::new()
            .with_output_type(OutputMode::Metadata)
            .with_fields(fields)
    }

    fn document_config(target: &str) -> AutoDocConfig {
        AutoDocConfig::new()
            .with_output_type(OutputMode::Document(DocumentFormat::Pdf))
            .with_target_filename(target)
    }

    fn names(meta: &RowMeta) -> Vec<&str> {
        meta.field_names()
    }

    // Metadata mode

    #[test]
    fn test_metadata_row_per_input_row() {
        let harness = StepHarness::new();
        let fields = FieldSelection::none()
            .with(MetadataField::Name, true)
            .with(MetadataField::Description, true)
            .with(MetadataField::Modified, true);
        let mut step = AutoDocStep::new(metadata_config(fields), harness.ports()).unwrap();

        let rows = subject_rows(&[("a.ktr", "Transformation"), ("b.kjb", "JOB")]);
        let mut outputs = Vec::new();
        for row in rows {
            outputs.push(step.process_row(row).unwrap().expect("metadata mode emits a row"));
        }

        assert_eq!(outputs.len(), 2);
        assert_eq!(
            names(step.output_meta().unwrap()),
            vec!["id", "filename", "filetype", "name", "description", "modified"]
        );
        assert_eq!(
            outputs[0].values(),
            &[
                Value::Integer(1),
                Value::from("a.ktr"),
                Value::from("Transformation"),
                Value::from("a.ktr"),
                Value::from("sample transformation"),
                Value::Null,
            ]
        );
        assert_eq!(outputs[1].get(4), Some(&Value::from("sample job")));
        assert_eq!(harness.process.subject_fetches(), 1);
        assert_eq!(harness.workflow.subject_fetches(), 1);
        assert_eq!(step.phase(), RunPhase::Streaming);
    }

    #[test]
    fn test_metadata_without_fields_passes_rows_through() {
        let harness = StepHarness::new();
        let mut step =
            AutoDocStep::new(metadata_config(FieldSelection::none()), harness.ports()).unwrap();

        let row = subject_row(7, "a.ktr", "transformation");
        let out = step.process_row(row.clone()).unwrap().unwrap();

        assert_eq!(out.values(), row.values());
        assert_eq!(out.meta().as_ref(), input_meta().as_ref());
        assert_eq!(harness.process.subject_fetches(), 1);
        assert_eq!(harness.process.area_fetches(), 1);
    }

    #[test]
    fn test_metadata_finalize_emits_nothing() {
        let harness = StepHarness::new();
        let mut step =
            AutoDocStep::new(metadata_config(FieldSelection::default()), harness.ports()).unwrap();
        step.process_row(subject_row(1, "a.ktr", "Transformation")).unwrap();

        assert_eq!(step.finalize().unwrap(), None);
        assert_eq!(step.phase(), RunPhase::Terminal);
        assert_eq!(harness.renderer.build_count(), 0);
        assert!(harness.result_files.is_empty());
    }

    #[test]
    fn test_field_names_are_substituted() {
        let harness = StepHarness::new();
        let config = metadata_config(FieldSelection::none())
            .with_input_fields("${NAME_FIELD}", "%%TYPE_FIELD%%");
        let ports = harness.ports().with_variables(
            Variables::new()
                .with("NAME_FIELD", "filename")
                .with("TYPE_FIELD", "filetype"),
        );
        let mut step = AutoDocStep::new(config, ports).unwrap();

        step.initialize(&input_meta()).unwrap();
        let fields = step.input_fields().unwrap();
        assert_eq!((fields.filename, fields.file_type), (1, 2));
        assert_eq!(step.phase(), RunPhase::Initialized);
    }

    #[test]
    fn test_missing_field_is_fatal() {
        let harness = StepHarness::new();
        let config = metadata_config(FieldSelection::none()).with_input_fields("${F}", "filetype");
        let ports = harness.ports().with_variables(Variables::new().with("F", "path"));
        let mut step = AutoDocStep::new(config, ports).unwrap();

        let err = step.process_row(subject_row(1, "a.ktr", "Job")).unwrap_err();
        assert!(matches!(
            err,
            AutoDocError::Config(ConfigError::FieldNotFound { role: "filename", ref field }) if field == "path"
        ));
        assert_eq!(step.phase(), RunPhase::Terminal);
        assert_eq!(harness.workflow.subject_fetches(), 0);
    }

    #[test]
    fn test_non_string_field_is_rejected() {
        let harness = StepHarness::new();
        let config = metadata_config(FieldSelection::none()).with_input_fields("id", "filetype");
        let mut step = AutoDocStep::new(config, harness.ports()).unwrap();

        let err = step.initialize(&input_meta()).unwrap_err();
        assert!(matches!(
            err,
            AutoDocError::Config(ConfigError::NotAStringField { ref field }) if field == "id"
        ));
    }

    // Failures

    #[test]
    fn test_unknown_type_aborts_run() {
        let harness = StepHarness::new();
        let mut step =
            AutoDocStep::new(metadata_config(FieldSelection::default()), harness.ports()).unwrap();

        step.process_row(subject_row(1, "a.ktr", "Transformation")).unwrap();
        let err = step.process_row(subject_row(2, "r.prpt", "Report")).unwrap_err();
        assert!(matches!(err, AutoDocError::UnknownType(ref e) if e.label == "Report"));
        assert_eq!(step.phase(), RunPhase::Terminal);

        let err = step.process_row(subject_row(3, "c.ktr", "Transformation")).unwrap_err();
        assert!(matches!(
            err,
            AutoDocError::InvalidPhase { phase: RunPhase::Terminal, .. }
        ));
        assert!(step.finalize().is_err());

        assert_eq!(harness.process.subject_fetches(), 1);
        let types = harness.events.event_types();
        assert_eq!(
            types.iter().filter(|t| **t == "autodoc.failed").count(),
            1
        );
    }

    #[test]
    fn test_null_name_cell_cannot_be_located() {
        let harness = StepHarness::new();
        let mut step =
            AutoDocStep::new(metadata_config(FieldSelection::none()), harness.ports()).unwrap();

        let row = Row::new(input_meta(), vec![Value::Integer(1), Value::Null, Value::from("Job")]);
        let err = step.process_row(row).unwrap_err();
        assert!(matches!(err, AutoDocError::LocationResolution(ref e) if e.file_type == "Job"));
    }

    #[test]
    fn test_provider_failure_aborts_run() {
        let harness = StepHarness::new()
            .with_process_provider(StaticProvider::sample(SubjectType::Process).failing("corrupt"));
        let mut step =
            AutoDocStep::new(metadata_config(FieldSelection::none()), harness.ports()).unwrap();

        let err = step.process_row(subject_row(1, "a.ktr", "Transformation")).unwrap_err();
        assert!(matches!(err, AutoDocError::Provider { .. }));
        assert_eq!(step.phase(), RunPhase::Terminal);
    }

    #[test]
    fn test_far_diagram_node_is_provider_error() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"nodes":[{"name":"far","x":4294967295,"y":0}]}"#)
            .unwrap();
        let path = file.path().to_string_lossy().to_string();

        let mut step =
            AutoDocStep::new(metadata_config(FieldSelection::none()), StepPorts::new()).unwrap();
        let err = step.process_row(subject_row(1, &path, "Transformation")).unwrap_err();

        assert!(matches!(err, AutoDocError::Provider { .. }));
        assert_eq!(step.phase(), RunPhase::Terminal);
    }

    #[test]
    fn test_phase_guards() {
        let harness = StepHarness::new();
        let mut step =
            AutoDocStep::new(metadata_config(FieldSelection::none()), harness.ports()).unwrap();

        step.process_row(subject_row(1, "a.ktr", "Job")).unwrap();
        let err = step.initialize(&input_meta()).unwrap_err();
        assert!(matches!(
            err,
            AutoDocError::InvalidPhase {
                operation: "initialize",
                phase: RunPhase::Streaming
            }
        ));
        assert_eq!(step.phase(), RunPhase::Terminal);
    }

    // Document mode

    #[test]
    fn test_empty_document_run_renders_nothing() {
        let harness = StepHarness::new();
        let mut step = AutoDocStep::new(document_config("/tmp/out.pdf"), harness.ports()).unwrap();

        assert_eq!(step.finalize().unwrap(), None);
        assert_eq!(step.phase(), RunPhase::Terminal);
        assert_eq!(harness.renderer.build_count(), 0);
        assert!(!harness.bootstrap.is_booted());
        assert!(harness.result_files.is_empty());
    }

    #[test]
    fn test_document_run_renders_once() {
        let dir = tempfile::tempdir().unwrap();
        let harness = StepHarness::with_renderer(RecordingRenderer::new().writing_files());
        let config = document_config("${OUT}/docs.pdf").with_step_name("Describe ETL");
        let ports = harness
            .ports()
            .with_variables(Variables::new().with("OUT", dir.path().to_string_lossy()));
        let mut step = AutoDocStep::new(config, ports).unwrap();

        let rows = subject_rows(&[
            ("load.ktr", "Transformation"),
            ("nightly.kjb", "Job"),
            ("clean.ktr", "transformation"),
        ]);
        for row in rows {
            assert_eq!(step.process_row(row).unwrap(), None);
        }
        let out = step.finalize().unwrap().expect("document row");

        let target = dir.path().join("docs.pdf");
        assert_eq!(names(out.meta()), vec![DOCUMENT_FIELD]);
        assert_eq!(out.get_str(0), Some(target.to_string_lossy().as_ref()));
        assert!(target.exists());

        let calls = harness.renderer.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].locations,
            vec![
                SubjectLocation::file("load.ktr", SubjectType::Process),
                SubjectLocation::file("nightly.kjb", SubjectType::Workflow),
                SubjectLocation::file("clean.ktr", SubjectType::Process),
            ]
        );
        assert_eq!(calls[0].target, target);
        assert_eq!(calls[0].request.format, DocumentFormat::Pdf);
        assert_eq!(calls[0].request.pipeline_name.as_deref(), Some("nightly_docs"));
        assert_eq!(harness.renderer.render_count(), 1);
        assert_eq!(harness.engine.core_starts(), 1);

        let files = harness.result_files.snapshot();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_type, ResultFileType::General);
        assert_eq!(files[0].path, target);
        assert_eq!(files[0].origin, "Describe ETL");
        assert_eq!(files[0].origin_parent, "nightly_docs");
        assert_eq!(files[0].comment.as_deref(), Some(GENERATED_DOCUMENT_COMMENT));

        let summary = step.summary();
        assert_eq!((summary.rows_read, summary.rows_written), (3, 1));
        assert_eq!(summary.document, Some(target));
        assert_eq!(harness.process.subject_fetches(), 0);
    }

    #[test]
    fn test_relative_target_is_made_absolute() {
        let harness = StepHarness::new();
        let mut step = AutoDocStep::new(document_config("docs/out.html"), harness.ports()).unwrap();
        step.process_row(subject_row(1, "a.ktr", "Transformation")).unwrap();

        let out = step.finalize().unwrap().unwrap();
        let path = std::path::PathBuf::from(out.get_str(0).unwrap());
        assert!(path.is_absolute());
        assert!(path.ends_with("docs/out.html"));
    }

    #[test]
    fn test_target_text_is_exact() {
        use crate::step::runtime::path_text;

        assert_eq!(
            path_text(std::path::Path::new("/tmp/docs/out.pdf")).unwrap(),
            "/tmp/docs/out.pdf"
        );

        #[cfg(unix)]
        {
            use std::os::unix::ffi::OsStrExt;

            let target = std::path::Path::new(std::ffi::OsStr::from_bytes(b"/tmp/out\xff.pdf"));
            let err = path_text(target).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)));
        }
    }

    #[test]
    fn test_document_mode_requires_renderer() {
        let ports = StepPorts::new();
        let mut step = AutoDocStep::new(document_config("/tmp/out.pdf"), ports).unwrap();

        let err = step.process_row(subject_row(1, "a.ktr", "Job")).unwrap_err();
        assert!(matches!(err, AutoDocError::Config(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_render_failures_name_stage() {
        let cases = [
            (RecordingRenderer::new().failing_build("no template"), RenderStage::Build),
            (RecordingRenderer::new().failing_render("disk full"), RenderStage::Render),
        ];
        for (renderer, stage) in cases {
            let harness = StepHarness::with_renderer(renderer);
            let mut step =
                AutoDocStep::new(document_config("/tmp/out.pdf"), harness.ports()).unwrap();
            step.process_row(subject_row(1, "a.ktr", "Job")).unwrap();

            let err = step.finalize().unwrap_err();
            assert!(matches!(err, AutoDocError::Render(ref e) if e.stage == stage));
            assert_eq!(step.phase(), RunPhase::Terminal);
            assert!(harness.result_files.is_empty());
        }
    }

    #[test]
    fn test_boot_failure_is_render_error_and_retried_next_run() {
        let harness = StepHarness::new();
        let engine = Arc::new(CountingRenderEngine::new().failing_fonts(1));
        let bootstrap = Arc::new(RenderEngineBootstrap::new(engine.clone()));

        let mut first = AutoDocStep::new(
            document_config("/tmp/out.pdf"),
            harness.ports().with_bootstrap(bootstrap.clone()),
        )
        .unwrap();
        first.process_row(subject_row(1, "a.ktr", "Job")).unwrap();
        let err = first.finalize().unwrap_err();
        assert!(matches!(err, AutoDocError::Render(ref e) if e.stage == RenderStage::Boot));
        assert_eq!(harness.renderer.build_count(), 0);

        let mut second = AutoDocStep::new(
            document_config("/tmp/out.pdf"),
            harness.ports().with_bootstrap(bootstrap.clone()),
        )
        .unwrap();
        second.process_row(subject_row(1, "a.ktr", "Job")).unwrap();
        assert!(second.finalize().unwrap().is_some());
        assert!(bootstrap.is_booted());
        assert_eq!(engine.core_starts(), 1);
    }

    // Repository lookups

    fn repository() -> Arc<InMemoryRepository> {
        Arc::new(
            InMemoryRepository::new("etl")
                .with_definition(
                    "/sales/load_orders",
                    SubjectType::Process,
                    SubjectDefinition {
                        description: Some("Loads orders".into()),
                        ..SubjectDefinition::named("load_orders")
                    },
                )
                .with_definition("/daily", SubjectType::Workflow, SubjectDefinition::named("daily")),
        )
    }

    #[test]
    fn test_repository_subjects_are_projected() {
        let repo = repository();
        let ports = StepPorts::new().with_repository(repo.clone());
        let fields = FieldSelection::none()
            .with(MetadataField::Name, true)
            .with(MetadataField::Description, true);
        let mut step = AutoDocStep::new(metadata_config(fields), ports).unwrap();

        let out = step
            .process_row(subject_row(1, "/sales/load_orders", "Transformation"))
            .unwrap()
            .unwrap();
        assert_eq!(out.get(3), Some(&Value::from("load_orders")));
        assert_eq!(out.get(4), Some(&Value::from("Loads orders")));

        let out = step.process_row(subject_row(2, "daily", "Job")).unwrap().unwrap();
        assert_eq!(out.get(3), Some(&Value::from("daily")));
        assert_eq!(out.get(4), Some(&Value::Null));
        assert_eq!(repo.tree_loads(), 1);
    }

    #[test]
    fn test_repository_locations_reach_renderer() {
        let harness = StepHarness::new();
        let repo = repository();
        let ports = harness.ports().with_repository(repo.clone());
        let mut step = AutoDocStep::new(document_config("/tmp/out.pdf"), ports).unwrap();

        step.process_row(subject_row(1, "/sales/load_orders", "Transformation"))
            .unwrap();
        step.process_row(subject_row(2, "daily", "Job")).unwrap();
        step.finalize().unwrap();

        let calls = harness.renderer.calls();
        let locations: Vec<_> = calls[0]
            .locations
            .iter()
            .map(|location| match location {
                SubjectLocation::Repository {
                    directory,
                    name,
                    subject_type,
                } => (directory.path().to_string(), name.clone(), *subject_type),
                SubjectLocation::File { .. } => panic!("expected repository locations"),
            })
            .collect();
        assert_eq!(
            locations,
            vec![
                ("/sales/".to_string(), "load_orders".to_string(), SubjectType::Process),
                ("/".to_string(), "daily".to_string(), SubjectType::Workflow),
            ]
        );
        assert_eq!(repo.tree_loads(), 1);
    }

    #[test]
    fn test_directory_miss_aborts_run() {
        let harness = StepHarness::new();
        let ports = harness.ports().with_repository(repository());
        let mut step = AutoDocStep::new(document_config("/tmp/out.pdf"), ports).unwrap();

        let err = step
            .process_row(subject_row(1, "/finance/close", "Job"))
            .unwrap_err();
        assert!(matches!(err, AutoDocError::DirectoryNotFound(ref e) if e.path == "/finance/"));
        assert_eq!(step.phase(), RunPhase::Terminal);
    }

    // Driver loop

    #[tokio::test]
    async fn test_run_metadata_mode() {
        let harness = StepHarness::new();
        let mut step =
            AutoDocStep::new(metadata_config(FieldSelection::default()), harness.ports()).unwrap();
        let mut input = VecRowInput::new(subject_rows(&[
            ("a.ktr", "Transformation"),
            ("b.kjb", "Job"),
            ("c.ktr", "Transformation"),
        ]));
        let mut output = CollectingRowOutput::new();

        let summary = step.run(&mut input, &mut output).await.unwrap();

        assert_eq!((summary.rows_read, summary.rows_written), (3, 3));
        assert_eq!(summary.document, None);
        assert!(output.is_finished());
        let filenames: Vec<_> = output.rows().iter().map(|r| r.get_str(1).unwrap()).collect();
        assert_eq!(filenames, vec!["a.ktr", "b.kjb", "c.ktr"]);
        assert_eq!(
            harness.events.event_types().last().copied(),
            Some("autodoc.completed")
        );
    }

    #[tokio::test]
    async fn test_run_document_mode_over_channels() {
        let harness = StepHarness::new();
        let mut step = AutoDocStep::new(document_config("/tmp/autodoc-run.pdf"), harness.ports())
            .unwrap();

        let (mut upstream, mut input) = row_channel(2);
        let (mut output, mut downstream) = row_channel(2);
        let producer = tokio::spawn(async move {
            for row in subject_rows(&[("a.ktr", "Transformation"), ("b.kjb", "Job")]) {
                upstream.put_row(row).await.unwrap();
            }
            upstream.finish().await;
        });

        let summary = step.run(&mut input, &mut output).await.unwrap();
        producer.await.unwrap();

        let row = downstream.next_row().await.unwrap();
        assert_eq!(row.get_str(0), Some("/tmp/autodoc-run.pdf"));
        assert!(downstream.next_row().await.is_none());
        assert_eq!(summary.rows_written, 1);
        assert_eq!(harness.renderer.calls()[0].locations.len(), 2);
    }

    #[tokio::test]
    async fn test_closed_output_aborts_run() {
        let harness = StepHarness::new();
        let mut step =
            AutoDocStep::new(metadata_config(FieldSelection::none()), harness.ports()).unwrap();
        let mut input = VecRowInput::new(subject_rows(&[("a.ktr", "Job")]));
        let (mut output, downstream) = row_channel(1);
        drop(downstream);

        let err = step.run(&mut input, &mut output).await.unwrap_err();
        assert!(matches!(err, AutoDocError::OutputClosed));
        assert_eq!(step.phase(), RunPhase::Terminal);
    }

    #[tokio::test]
    async fn test_concurrent_runs_share_one_boot() {
        let harness = StepHarness::new();
        let mut tasks = Vec::new();
        for i in 0..4 {
            let ports = harness.ports();
            let config = document_config(&format!("/tmp/autodoc-{i}.pdf"));
            tasks.push(tokio::spawn(async move {
                let mut step = AutoDocStep::new(config, ports).unwrap();
                let mut input = VecRowInput::new(subject_rows(&[("a.ktr", "Transformation")]));
                let mut output = CollectingRowOutput::new();
                step.run(&mut input, &mut output).await.unwrap()
            }));
        }

        let mut run_ids = Vec::new();
        for task in tasks {
            run_ids.push(task.await.unwrap().run_id);
        }
        run_ids.sort();
        run_ids.dedup();

        assert_eq!(run_ids.len(), 4);
        assert_eq!(harness.engine.core_starts(), 1);
        assert_eq!(harness.renderer.build_count(), 4);
        assert_eq!(harness.result_files.len(), 4);
    }
}
