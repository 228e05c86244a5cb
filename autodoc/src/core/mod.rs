//! Core domain model types.
//!
//! This module contains the fundamental types used throughout the crate:
//! - Subject types and resolved subject locations
//! - Row schemas, rows and cell values
//! - Result files registered by a run

mod result_file;
mod row;
mod subject;
mod value;

pub use result_file::{ResultFile, ResultFileType, ResultFiles, GENERATED_DOCUMENT_COMMENT};
pub use row::{Row, RowMeta, ValueMeta};
pub use subject::{SubjectLocation, SubjectType};
pub use value::{Value, ValueType};
