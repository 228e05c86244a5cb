//! Testing utilities for auto-documentation runs.
//!
//! This module provides:
//! - Recording renderers, static providers and a counting render engine
//! - Input rows and a harness wiring them into step ports

mod fixtures;
mod mocks;

pub use fixtures::{input_meta, subject_row, subject_rows, StepHarness};
pub use mocks::{
    CountingRenderEngine, RecordingRenderer, RenderCall, StaticProvider, StaticSubject,
};
