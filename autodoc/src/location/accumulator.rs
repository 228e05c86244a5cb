//! Ordered buffer of resolved locations for document output.

use crate::core::SubjectLocation;

/// Locations collected across a run, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct FilenameAccumulator {
    locations: Vec<SubjectLocation>,
}

impl FilenameAccumulator {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a location.
    pub fn push(&mut self, location: SubjectLocation) {
        self.locations.push(location);
    }

    /// Returns the collected locations.
    #[must_use]
    pub fn locations(&self) -> &[SubjectLocation] {
        &self.locations
    }

    /// Returns the number of collected locations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Returns true if nothing was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Takes the collected locations, leaving the accumulator empty.
    pub fn take(&mut self) -> Vec<SubjectLocation> {
        std::mem::take(&mut self.locations)
    }
}
