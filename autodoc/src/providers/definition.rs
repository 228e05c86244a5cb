//! Definition-backed information providers.
//!
//! Definitions are JSON documents. File locations are read from disk,
//! repository locations through the configured [`Repository`]. Loaded
//! definitions are cached per location for the lifetime of the provider.

use anyhow::{anyhow, bail, Context};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::diagram::{draw, layout_areas};
use super::{DiagramArea, InformationProvider, RasterImage, SubjectHandle};
use crate::core::{SubjectLocation, SubjectType};
use crate::repository::Repository;

/// Where a subject logs its executions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogTable {
    /// Database connection name.
    pub connection: String,
    /// Optional schema.
    #[serde(default)]
    pub schema: Option<String>,
    /// Log table name.
    pub table: String,
}

impl LogTable {
    fn describe(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}: {}.{}", self.connection, schema, self.table),
            None => format!("{}: {}", self.connection, self.table),
        }
    }
}

/// Outcome of the most recent execution of a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Final status, e.g. "finished" or "stopped".
    pub status: String,
    /// Number of errors reported.
    #[serde(default)]
    pub errors: u64,
    /// When the execution ended.
    #[serde(default)]
    pub finished: Option<DateTime<Utc>>,
}

impl ExecutionRecord {
    fn describe(&self) -> String {
        let mut text = format!("{} ({} errors)", self.status, self.errors);
        if let Some(finished) = self.finished {
            text.push_str(&format!(" at {}", finished.to_rfc3339()));
        }
        text
    }
}

/// A positioned node of a subject diagram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramNode {
    /// Node name.
    pub name: String,
    /// Horizontal position in diagram coordinates.
    pub x: u32,
    /// Vertical position in diagram coordinates.
    pub y: u32,
}

/// A process or workflow definition document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectDefinition {
    /// Subject name.
    #[serde(default)]
    pub name: Option<String>,
    /// Short description.
    #[serde(default)]
    pub description: Option<String>,
    /// Extended description.
    #[serde(default)]
    pub extended_description: Option<String>,
    /// Creation time.
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    /// Last modification time.
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
    /// Execution log table.
    #[serde(default)]
    pub log_table: Option<LogTable>,
    /// Most recent execution.
    #[serde(default)]
    pub last_execution: Option<ExecutionRecord>,
    /// Diagram nodes in drawing order.
    #[serde(default)]
    pub nodes: Vec<DiagramNode>,
}

impl SubjectDefinition {
    /// Creates a definition with only a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Parses a JSON definition.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("invalid definition document")
    }
}

#[derive(Debug)]
struct LoadedSubject {
    subject_type: SubjectType,
    definition: SubjectDefinition,
}

impl SubjectHandle for LoadedSubject {
    fn name(&self) -> Option<String> {
        self.definition.name.clone()
    }

    fn description(&self) -> Option<String> {
        self.definition.description.clone()
    }

    fn extended_description(&self) -> Option<String> {
        self.definition.extended_description.clone()
    }

    fn created(&self) -> Option<DateTime<Utc>> {
        self.definition.created
    }

    fn modified(&self) -> Option<DateTime<Utc>> {
        self.definition.modified
    }

    fn logging_configuration(&self) -> Option<String> {
        self.definition.log_table.as_ref().map(LogTable::describe)
    }

    fn last_execution_result(&self) -> Option<String> {
        self.definition
            .last_execution
            .as_ref()
            .map(ExecutionRecord::describe)
    }

    fn image(&self) -> anyhow::Result<RasterImage> {
        draw(&self.definition.nodes, self.subject_type)
    }
}

/// Provider for one subject type backed by definition documents.
pub struct DefinitionProvider {
    subject_type: SubjectType,
    repository: Option<Arc<dyn Repository>>,
    cache: DashMap<SubjectLocation, Arc<LoadedSubject>>,
}

impl std::fmt::Debug for DefinitionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefinitionProvider")
            .field("subject_type", &self.subject_type)
            .field("has_repository", &self.repository.is_some())
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl DefinitionProvider {
    /// Creates a provider for `subject_type`.
    #[must_use]
    pub fn new(subject_type: SubjectType, repository: Option<Arc<dyn Repository>>) -> Self {
        Self {
            subject_type,
            repository,
            cache: DashMap::new(),
        }
    }

    /// Returns the number of cached definitions.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    fn load(&self, location: &SubjectLocation) -> anyhow::Result<Arc<LoadedSubject>> {
        if location.subject_type() != self.subject_type {
            bail!(
                "{} provider cannot load {location}",
                self.subject_type
            );
        }
        if let Some(cached) = self.cache.get(location) {
            return Ok(Arc::clone(cached.value()));
        }

        let definition = match location {
            SubjectLocation::File { path, .. } => {
                debug!(path = %path, "Loading definition file");
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("unable to read definition file '{path}'"))?;
                SubjectDefinition::from_json(&text)?
            }
            SubjectLocation::Repository {
                directory,
                name,
                subject_type,
            } => {
                let repository = self
                    .repository
                    .as_ref()
                    .ok_or_else(|| anyhow!("no repository configured to load {location}"))?;
                debug!(
                    repository = repository.name(),
                    directory = directory.path(),
                    name = %name,
                    "Loading definition from repository"
                );
                repository.load_definition(directory, name, *subject_type)?
            }
        };

        let loaded = Arc::new(LoadedSubject {
            subject_type: self.subject_type,
            definition,
        });
        self.cache.insert(location.clone(), Arc::clone(&loaded));
        Ok(loaded)
    }
}

impl InformationProvider for DefinitionProvider {
    fn fetch_subject(&self, location: &SubjectLocation) -> anyhow::Result<Arc<dyn SubjectHandle>> {
        let loaded: Arc<dyn SubjectHandle> = self.load(location)?;
        Ok(loaded)
    }

    fn fetch_diagram_areas(&self, location: &SubjectLocation) -> anyhow::Result<Vec<DiagramArea>> {
        let loaded = self.load(location)?;
        layout_areas(&loaded.definition.nodes, self.subject_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryRepository;
    use std::io::Write;

    const DEFINITION: &str = r#"{
        "name": "load_orders",
        "description": "Loads orders",
        "created": "2024-01-02T03:04:05Z",
        "log_table": {"connection": "dwh", "schema": "etl", "table": "trans_log"},
        "last_execution": {"status": "finished", "errors": 0},
        "nodes": [{"name": "read", "x": 0, "y": 0}, {"name": "write", "x": 64, "y": 0}]
    }"#;

    #[test]
    fn test_loads_file_definition_once() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DEFINITION.as_bytes()).unwrap();
        let path = file.path().to_string_lossy().to_string();

        let provider = DefinitionProvider::new(SubjectType::Process, None);
        let location = SubjectLocation::file(path, SubjectType::Process);

        let subject = provider.fetch_subject(&location).unwrap();
        assert_eq!(subject.name().as_deref(), Some("load_orders"));
        assert_eq!(subject.description().as_deref(), Some("Loads orders"));
        assert_eq!(subject.extended_description(), None);
        assert!(subject.created().is_some());
        assert_eq!(subject.modified(), None);
        assert_eq!(subject.logging_configuration().as_deref(), Some("dwh: etl.trans_log"));
        assert_eq!(subject.last_execution_result().as_deref(), Some("finished (0 errors)"));

        let areas = provider.fetch_diagram_areas(&location).unwrap();
        assert_eq!(areas.len(), 2);
        assert_eq!(areas[1].owner, "write");
        assert_eq!(provider.cached(), 1);
    }

    #[test]
    fn test_missing_file_fails() {
        let provider = DefinitionProvider::new(SubjectType::Workflow, None);
        let location = SubjectLocation::file("/does/not/exist.kjb", SubjectType::Workflow);
        let err = provider.fetch_subject(&location).unwrap_err();
        assert!(err.to_string().contains("/does/not/exist.kjb"));
    }

    #[test]
    fn test_rejects_other_subject_type() {
        let provider = DefinitionProvider::new(SubjectType::Workflow, None);
        let location = SubjectLocation::file("a.ktr", SubjectType::Process);
        assert!(provider.fetch_subject(&location).is_err());
    }

    #[test]
    fn test_loads_repository_definition() {
        let repo = Arc::new(InMemoryRepository::new("dev").with_definition(
            "/jobs/nightly",
            SubjectType::Workflow,
            SubjectDefinition::named("nightly"),
        ));
        let tree = repo.load_directory_tree().unwrap();
        let directory = tree.find_directory("/jobs/").unwrap().clone();

        let repo: Arc<dyn Repository> = repo;
        let provider = DefinitionProvider::new(SubjectType::Workflow, Some(repo));
        let location = SubjectLocation::repository(directory, "nightly", SubjectType::Workflow);
        let subject = provider.fetch_subject(&location).unwrap();
        assert_eq!(subject.name().as_deref(), Some("nightly"));
        assert!(subject.image().is_ok());
    }

    #[test]
    fn test_far_node_fails_instead_of_overflowing() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"nodes":[{"name":"far","x":4294967295,"y":0}]}"#)
            .unwrap();
        let path = file.path().to_string_lossy().to_string();

        let provider = DefinitionProvider::new(SubjectType::Process, None);
        let location = SubjectLocation::file(path, SubjectType::Process);

        let err = provider.fetch_diagram_areas(&location).unwrap_err();
        assert!(err.to_string().contains("'far'"));
        let subject = provider.fetch_subject(&location).unwrap();
        assert!(subject.image().is_err());
    }

    #[test]
    fn test_huge_diagram_image_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"nodes":[{"name":"far","x":1000000,"y":1000000}]}"#)
            .unwrap();
        let path = file.path().to_string_lossy().to_string();

        let provider = DefinitionProvider::new(SubjectType::Workflow, None);
        let location = SubjectLocation::file(path, SubjectType::Workflow);

        assert_eq!(provider.fetch_diagram_areas(&location).unwrap().len(), 1);
        let err = provider.fetch_subject(&location).unwrap().image().unwrap_err();
        assert!(err.to_string().contains("exceeds the limit"));
    }
}
