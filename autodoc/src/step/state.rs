//! Run phases and per-run state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::core::RowMeta;
use crate::location::{FilenameAccumulator, LocationResolver};
use crate::projector::MetadataProjector;

/// Lifecycle phase of a run.
///
/// Phases only move forward:
/// `Uninitialized -> Initialized -> Streaming -> Draining -> Terminal`.
/// Any failure moves the run straight to `Terminal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// No row seen yet.
    Uninitialized,
    /// Schemas resolved, waiting for rows.
    Initialized,
    /// At least one row processed.
    Streaming,
    /// End of input reached, finishing.
    Draining,
    /// Done, successfully or not.
    Terminal,
}

impl RunPhase {
    /// Returns true if rows may still be processed.
    #[must_use]
    pub const fn accepts_rows(self) -> bool {
        matches!(self, Self::Uninitialized | Self::Initialized | Self::Streaming)
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::Initialized => "initialized",
            Self::Streaming => "streaming",
            Self::Draining => "draining",
            Self::Terminal => "terminal",
        };
        f.write_str(s)
    }
}

/// Column indexes of the two input fields the step reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputFields {
    /// Index of the subject name column.
    pub filename: usize,
    /// Index of the subject type column.
    pub file_type: usize,
}

/// Mutable state owned by one run.
#[derive(Debug)]
pub(crate) struct RunState {
    pub(crate) phase: RunPhase,
    pub(crate) output_meta: Option<Arc<RowMeta>>,
    pub(crate) input_fields: Option<InputFields>,
    pub(crate) resolver: LocationResolver,
    pub(crate) projector: Option<MetadataProjector>,
    pub(crate) accumulator: FilenameAccumulator,
    pub(crate) rows_read: u64,
    pub(crate) rows_written: u64,
    pub(crate) document: Option<PathBuf>,
}

impl RunState {
    pub(crate) fn new() -> Self {
        Self {
            phase: RunPhase::Uninitialized,
            output_meta: None,
            input_fields: None,
            resolver: LocationResolver::flat(),
            projector: None,
            accumulator: FilenameAccumulator::new(),
            rows_read: 0,
            rows_written: 0,
            document: None,
        }
    }
}
