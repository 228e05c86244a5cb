//! Subject location resolution and collection.

mod accumulator;
mod resolver;

pub use accumulator::FilenameAccumulator;
pub use resolver::{split_repository_path, LocationResolver};
