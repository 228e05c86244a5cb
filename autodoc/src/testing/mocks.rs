//! Hand-written collaborators for tests.

use anyhow::bail;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::core::{SubjectLocation, SubjectType};
use crate::providers::{
    AreaType, DiagramArea, InformationProvider, RasterImage, Rgba, SubjectHandle, ICON_SIZE,
};
use crate::render::{DocumentRenderer, RenderEngine, RenderJob, RenderRequest, ResourceContext};

/// A subject with fixed metadata.
#[derive(Debug, Clone)]
pub struct StaticSubject {
    /// Subject name.
    pub name: Option<String>,
    /// Short description.
    pub description: Option<String>,
    /// Extended description.
    pub extended_description: Option<String>,
    /// Creation time.
    pub created: Option<DateTime<Utc>>,
    /// Modification time.
    pub modified: Option<DateTime<Utc>>,
    /// Logging summary.
    pub logging: Option<String>,
    /// Last execution summary.
    pub last_execution: Option<String>,
    /// Whether drawing the image fails.
    pub broken_image: bool,
}

impl SubjectHandle for StaticSubject {
    fn name(&self) -> Option<String> {
        self.name.clone()
    }

    fn description(&self) -> Option<String> {
        self.description.clone()
    }

    fn extended_description(&self) -> Option<String> {
        self.extended_description.clone()
    }

    fn created(&self) -> Option<DateTime<Utc>> {
        self.created
    }

    fn modified(&self) -> Option<DateTime<Utc>> {
        self.modified
    }

    fn logging_configuration(&self) -> Option<String> {
        self.logging.clone()
    }

    fn last_execution_result(&self) -> Option<String> {
        self.last_execution.clone()
    }

    fn image(&self) -> anyhow::Result<RasterImage> {
        if self.broken_image {
            bail!("diagram could not be drawn");
        }
        Ok(RasterImage::filled(4, 4, Rgba([255, 255, 255, 255])))
    }
}

/// An information provider that serves the same metadata for every
/// location, named after the location, and counts its calls.
#[derive(Debug)]
pub struct StaticProvider {
    subject: StaticSubject,
    areas: Vec<DiagramArea>,
    failure: Option<String>,
    requested: Mutex<Vec<SubjectLocation>>,
    subject_fetches: AtomicUsize,
    area_fetches: AtomicUsize,
}

impl StaticProvider {
    /// Creates a provider with sample metadata: a description, a creation
    /// time, a logging and an execution summary, and one diagram area.
    #[must_use]
    pub fn sample(subject_type: SubjectType) -> Self {
        let (area_type, owner) = match subject_type {
            SubjectType::Process => (AreaType::StepIcon, "step"),
            SubjectType::Workflow => (AreaType::JobEntryIcon, "entry"),
        };
        Self {
            subject: StaticSubject {
                name: None,
                description: Some(format!("sample {}", subject_type.label().to_lowercase())),
                extended_description: None,
                created: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).single(),
                modified: None,
                logging: Some("log: etl.runs".into()),
                last_execution: Some("finished (0 errors)".into()),
                broken_image: false,
            },
            areas: vec![DiagramArea {
                area_type,
                x: 20,
                y: 20,
                width: ICON_SIZE,
                height: ICON_SIZE,
                owner: owner.into(),
            }],
            failure: None,
            requested: Mutex::new(Vec::new()),
            subject_fetches: AtomicUsize::new(0),
            area_fetches: AtomicUsize::new(0),
        }
    }

    /// Makes every fetch fail with `message`.
    #[must_use]
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Makes image drawing fail.
    #[must_use]
    pub fn with_broken_image(mut self) -> Self {
        self.subject.broken_image = true;
        self
    }

    /// Returns the number of subject fetches.
    #[must_use]
    pub fn subject_fetches(&self) -> usize {
        self.subject_fetches.load(Ordering::SeqCst)
    }

    /// Returns the number of diagram area fetches.
    #[must_use]
    pub fn area_fetches(&self) -> usize {
        self.area_fetches.load(Ordering::SeqCst)
    }

    /// Returns the locations passed to `fetch_subject`, in order.
    #[must_use]
    pub fn requested(&self) -> Vec<SubjectLocation> {
        self.requested.lock().clone()
    }
}

impl InformationProvider for StaticProvider {
    fn fetch_subject(&self, location: &SubjectLocation) -> anyhow::Result<Arc<dyn SubjectHandle>> {
        self.subject_fetches.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().push(location.clone());
        if let Some(message) = &self.failure {
            bail!("{message}");
        }
        let mut subject = self.subject.clone();
        subject.name = Some(location.name().to_string());
        Ok(Arc::new(subject))
    }

    fn fetch_diagram_areas(&self, _location: &SubjectLocation) -> anyhow::Result<Vec<DiagramArea>> {
        self.area_fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.failure {
            bail!("{message}");
        }
        Ok(self.areas.clone())
    }
}

/// One call to [`RecordingRenderer::build`].
#[derive(Debug, Clone)]
pub struct RenderCall {
    /// Locations passed, in order.
    pub locations: Vec<SubjectLocation>,
    /// Target document.
    pub target: PathBuf,
    /// Request settings.
    pub request: RenderRequest,
}

/// A document renderer that records its calls.
///
/// When file writing is enabled, rendering writes one line per subject to
/// the target.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    calls: Mutex<Vec<RenderCall>>,
    renders: Arc<AtomicUsize>,
    build_failure: Option<String>,
    render_failure: Option<String>,
    write_files: bool,
}

impl RecordingRenderer {
    /// Creates a renderer that succeeds without writing anything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `build` fail.
    #[must_use]
    pub fn failing_build(mut self, message: impl Into<String>) -> Self {
        self.build_failure = Some(message.into());
        self
    }

    /// Makes `render` fail.
    #[must_use]
    pub fn failing_render(mut self, message: impl Into<String>) -> Self {
        self.render_failure = Some(message.into());
        self
    }

    /// Makes `render` write the target file.
    #[must_use]
    pub fn writing_files(mut self) -> Self {
        self.write_files = true;
        self
    }

    /// Returns the recorded build calls.
    #[must_use]
    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().clone()
    }

    /// Returns the number of build calls.
    #[must_use]
    pub fn build_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Returns the number of completed renders.
    #[must_use]
    pub fn render_count(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

impl DocumentRenderer for RecordingRenderer {
    fn build(
        &self,
        locations: &[SubjectLocation],
        target: &Path,
        request: &RenderRequest,
    ) -> anyhow::Result<Box<dyn RenderJob>> {
        self.calls.lock().push(RenderCall {
            locations: locations.to_vec(),
            target: target.to_path_buf(),
            request: request.clone(),
        });
        if let Some(message) = &self.build_failure {
            bail!("{message}");
        }

        let contents = self.write_files.then(|| {
            locations
                .iter()
                .map(|location| format!("{location}\n"))
                .collect::<String>()
        });
        Ok(Box::new(RecordedJob {
            target: target.to_path_buf(),
            contents,
            failure: self.render_failure.clone(),
            renders: Arc::clone(&self.renders),
        }))
    }
}

struct RecordedJob {
    target: PathBuf,
    contents: Option<String>,
    failure: Option<String>,
    renders: Arc<AtomicUsize>,
}

impl RenderJob for RecordedJob {
    fn render(self: Box<Self>) -> anyhow::Result<()> {
        if let Some(message) = &self.failure {
            bail!("{message}");
        }
        if let Some(contents) = &self.contents {
            std::fs::write(&self.target, contents)?;
        }
        self.renders.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A render engine that records the start hooks it receives.
#[derive(Debug, Default)]
pub struct CountingRenderEngine {
    calls: Mutex<Vec<&'static str>>,
    font_failures: AtomicUsize,
}

impl CountingRenderEngine {
    /// Creates an engine whose hooks all succeed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `times` font starts fail.
    #[must_use]
    pub fn failing_fonts(self, times: usize) -> Self {
        self.font_failures.store(times, Ordering::SeqCst);
        self
    }

    /// Returns the hooks received, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    fn count(&self, hook: &str) -> usize {
        self.calls.lock().iter().filter(|c| **c == hook).count()
    }

    /// Returns how often the resource context was set.
    #[must_use]
    pub fn context_sets(&self) -> usize {
        self.count("context")
    }

    /// Returns how often the resource loader was started.
    #[must_use]
    pub fn loader_starts(&self) -> usize {
        self.count("resource_loader")
    }

    /// Returns how often the core engine was started.
    #[must_use]
    pub fn core_starts(&self) -> usize {
        self.count("core")
    }
}

impl RenderEngine for CountingRenderEngine {
    fn set_resource_context(&self, _context: &ResourceContext) {
        self.calls.lock().push("context");
    }

    fn start_resource_loader(&self) -> anyhow::Result<()> {
        self.calls.lock().push("resource_loader");
        Ok(())
    }

    fn start_fonts(&self) -> anyhow::Result<()> {
        self.calls.lock().push("fonts");
        let remaining = self.font_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.font_failures.store(remaining - 1, Ordering::SeqCst);
            bail!("no fonts available");
        }
        Ok(())
    }

    fn start_core(&self) -> anyhow::Result<()> {
        self.calls.lock().push("core");
        Ok(())
    }
}
