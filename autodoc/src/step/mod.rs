//! The auto-documentation step.
//!
//! [`AutoDocStep`] is the per-run state machine. It can be driven row by row
//! (`initialize`, `process_row`, `finalize`) or end to end with
//! [`AutoDocStep::run`] over a [`RowInput`] and a [`RowOutput`].

mod ports;
mod rowset;
mod runtime;
mod runtime_tests;
mod state;

pub use ports::StepPorts;
pub use rowset::{
    row_channel, ChannelRowInput, ChannelRowOutput, CollectingRowOutput, RowInput, RowOutput,
    StreamRowInput, VecRowInput,
};
pub use runtime::{AutoDocStep, RunSummary, DOCUMENT_FIELD};
pub use state::{InputFields, RunPhase};
