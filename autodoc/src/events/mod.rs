//! Step lifecycle events.
//!
//! A run reports its progress as [`StepEvent`]s delivered to the
//! [`EventSink`] configured in its ports. Sinks never fail the run.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Something that happened during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StepEvent {
    /// The input schema was accepted and the output schema built.
    Initialized {
        /// Run identifier.
        run_id: Uuid,
        /// Output mode label.
        output_type: String,
        /// Whether locations are looked up in a directory index.
        hierarchical: bool,
        /// Output column names.
        output_fields: Vec<String>,
    },
    /// A row was resolved to a subject location.
    SubjectResolved {
        /// Run identifier.
        run_id: Uuid,
        /// Display form of the location.
        location: String,
    },
    /// The consolidated document was written.
    DocumentRendered {
        /// Run identifier.
        run_id: Uuid,
        /// The produced document.
        path: PathBuf,
        /// Number of subjects in the document.
        subjects: usize,
        /// Time spent building and rendering.
        duration_ms: f64,
    },
    /// The run finished normally.
    Completed {
        /// Run identifier.
        run_id: Uuid,
        /// Rows received.
        rows_read: u64,
        /// Rows emitted.
        rows_written: u64,
    },
    /// The run was aborted.
    Failed {
        /// Run identifier.
        run_id: Uuid,
        /// Error message.
        error: String,
    },
}

impl StepEvent {
    /// Dotted event type, e.g. `autodoc.completed`.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::Initialized { .. } => "autodoc.initialized",
            Self::SubjectResolved { .. } => "autodoc.subject_resolved",
            Self::DocumentRendered { .. } => "autodoc.document_rendered",
            Self::Completed { .. } => "autodoc.completed",
            Self::Failed { .. } => "autodoc.failed",
        }
    }

    /// The event as JSON.
    #[must_use]
    pub fn data(&self) -> Option<serde_json::Value> {
        serde_json::to_value(self).ok()
    }
}
