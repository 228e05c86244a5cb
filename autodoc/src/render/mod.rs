//! Document rendering contracts.
//!
//! The rendering engine itself lives outside this crate. The step hands the
//! collected subject locations to a [`DocumentRenderer`], which builds a
//! [`RenderJob`] for a target path; running the job writes the document.
//! Before the first build the engine is started once through
//! [`RenderEngineBootstrap`].

mod bootstrap;

pub use bootstrap::{RenderEngine, RenderEngineBootstrap, ResourceContext};

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::DocumentFormat;
use crate::core::SubjectLocation;

/// Settings passed to the renderer along with the subjects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderRequest {
    /// Output format of the document.
    pub format: DocumentFormat,
    /// Name of the step requesting the document.
    pub step_name: String,
    /// Name of the pipeline running the step, if known.
    pub pipeline_name: Option<String>,
}

impl RenderRequest {
    /// Creates a new request.
    #[must_use]
    pub fn new(format: DocumentFormat, step_name: impl Into<String>) -> Self {
        Self {
            format,
            step_name: step_name.into(),
            pipeline_name: None,
        }
    }

    /// Sets the pipeline name.
    #[must_use]
    pub fn with_pipeline_name(mut self, name: impl Into<String>) -> Self {
        self.pipeline_name = Some(name.into());
        self
    }
}

/// Builds documents describing a batch of subjects.
pub trait DocumentRenderer: Send + Sync {
    /// Prepares a document for `locations`, in the given order, to be
    /// written to `target`.
    fn build(
        &self,
        locations: &[SubjectLocation],
        target: &Path,
        request: &RenderRequest,
    ) -> anyhow::Result<Box<dyn RenderJob>>;
}

/// A prepared document.
pub trait RenderJob: Send {
    /// Writes the document to its target.
    fn render(self: Box<Self>) -> anyhow::Result<()>;
}
