//! Projection of subject metadata into output columns.

mod image;

pub use image::encode_png;

use tracing::debug;

use crate::config::{FieldSelection, MetadataField};
use crate::core::{SubjectLocation, Value, ValueMeta};
use crate::errors::{AutoDocError, ImageSerializationError};
use crate::providers::ProviderTable;

/// Builds the metadata columns appended to each input row.
#[derive(Debug, Clone)]
pub struct MetadataProjector {
    providers: ProviderTable,
    fields: FieldSelection,
}

impl MetadataProjector {
    /// Creates a projector.
    #[must_use]
    pub fn new(providers: ProviderTable, fields: FieldSelection) -> Self {
        Self { providers, fields }
    }

    /// Returns the field selection.
    #[must_use]
    pub fn fields(&self) -> &FieldSelection {
        &self.fields
    }

    /// Descriptors of the columns `project` produces, in order.
    #[must_use]
    pub fn output_fields(&self) -> Vec<ValueMeta> {
        self.fields.enabled().map(MetadataField::value_meta).collect()
    }

    /// Loads the subject at `location` and returns one value per enabled
    /// field, in the fixed field order.
    pub fn project(&self, location: &SubjectLocation) -> Result<Vec<Value>, AutoDocError> {
        let provider = self.providers.for_type(location.subject_type());
        let provider_error = |e| AutoDocError::provider(location.to_string(), e);

        let subject = provider.fetch_subject(location).map_err(provider_error)?;
        let areas = provider
            .fetch_diagram_areas(location)
            .map_err(provider_error)?;

        let mut values = Vec::with_capacity(MetadataField::ALL.len());
        for field in self.fields.enabled() {
            let value = match field {
                MetadataField::Name => subject.name().into(),
                MetadataField::Description => subject.description().into(),
                MetadataField::ExtendedDescription => subject.extended_description().into(),
                MetadataField::Created => subject.created().into(),
                MetadataField::Modified => subject.modified().into(),
                MetadataField::Image => {
                    let image = subject.image().map_err(ImageSerializationError::new)?;
                    Value::Binary(encode_png(&image)?)
                }
                MetadataField::LoggingConfig => subject.logging_configuration().into(),
                MetadataField::LastExecutionResult => subject.last_execution_result().into(),
                MetadataField::ImageAreaList => Value::Structured(
                    serde_json::to_value(&areas).map_err(|e| provider_error(e.into()))?,
                ),
            };
            values.push(value);
        }

        debug!(
            subject = %location,
            columns = values.len(),
            areas = areas.len(),
            "Projected subject metadata"
        );
        Ok(values)
    }
}
