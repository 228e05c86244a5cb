//! Step configuration.

mod variables;

pub use variables::Variables;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::{ValueMeta, ValueType};
use crate::errors::ConfigError;

/// Format of the consolidated document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// Portable Document Format.
    Pdf,
    /// HTML page.
    Html,
    /// Word processor document.
    Doc,
    /// Spreadsheet.
    Xls,
    /// Comma separated values.
    Csv,
}

impl DocumentFormat {
    /// Returns the conventional file extension.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Html => "html",
            Self::Doc => "doc",
            Self::Xls => "xls",
            Self::Csv => "csv",
        }
    }
}

/// What the step produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OutputMode {
    /// One consolidated document at the end of the stream.
    Document(DocumentFormat),
    /// One enriched row per input row.
    Metadata,
}

impl OutputMode {
    /// Returns true for metadata mode.
    #[must_use]
    pub const fn is_metadata(self) -> bool {
        matches!(self, Self::Metadata)
    }
}

impl Default for OutputMode {
    fn default() -> Self {
        Self::Document(DocumentFormat::Pdf)
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Document(DocumentFormat::Pdf) => "PDF",
            Self::Document(DocumentFormat::Html) => "HTML",
            Self::Document(DocumentFormat::Doc) => "DOC",
            Self::Document(DocumentFormat::Xls) => "XLS",
            Self::Document(DocumentFormat::Csv) => "CSV",
            Self::Metadata => "METADATA",
        };
        f.write_str(label)
    }
}

impl FromStr for OutputMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PDF" => Ok(Self::Document(DocumentFormat::Pdf)),
            "HTML" => Ok(Self::Document(DocumentFormat::Html)),
            "DOC" => Ok(Self::Document(DocumentFormat::Doc)),
            "XLS" => Ok(Self::Document(DocumentFormat::Xls)),
            "CSV" => Ok(Self::Document(DocumentFormat::Csv)),
            "METADATA" => Ok(Self::Metadata),
            _ => Err(ConfigError::InvalidOutputType(s.to_string())),
        }
    }
}

impl TryFrom<String> for OutputMode {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OutputMode> for String {
    fn from(mode: OutputMode) -> Self {
        mode.to_string()
    }
}

/// One optional metadata column, in projection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataField {
    /// Subject name.
    Name,
    /// Short description.
    Description,
    /// Extended description.
    ExtendedDescription,
    /// Creation timestamp.
    Created,
    /// Modification timestamp.
    Modified,
    /// Diagram image as PNG.
    Image,
    /// Logging configuration summary.
    LoggingConfig,
    /// Last execution result summary.
    LastExecutionResult,
    /// Diagram area list.
    ImageAreaList,
}

impl MetadataField {
    /// All fields in their fixed projection order.
    pub const ALL: [Self; 9] = [
        Self::Name,
        Self::Description,
        Self::ExtendedDescription,
        Self::Created,
        Self::Modified,
        Self::Image,
        Self::LoggingConfig,
        Self::LastExecutionResult,
        Self::ImageAreaList,
    ];

    /// Output column name.
    #[must_use]
    pub const fn column_name(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::ExtendedDescription => "extended_description",
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Image => "image",
            Self::LoggingConfig => "logging",
            Self::LastExecutionResult => "last_execution_result",
            Self::ImageAreaList => "image_area_list",
        }
    }

    /// Output column type.
    #[must_use]
    pub const fn value_type(self) -> ValueType {
        match self {
            Self::Created | Self::Modified => ValueType::Timestamp,
            Self::Image => ValueType::Binary,
            Self::ImageAreaList => ValueType::Structured,
            _ => ValueType::String,
        }
    }

    /// Output column descriptor.
    #[must_use]
    pub fn value_meta(self) -> ValueMeta {
        ValueMeta::new(self.column_name(), self.value_type())
    }
}

/// Which metadata columns to add in metadata mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct FieldSelection {
    /// Include the subject name.
    pub name: bool,
    /// Include the description.
    pub description: bool,
    /// Include the extended description.
    pub extended_description: bool,
    /// Include the creation timestamp.
    pub created: bool,
    /// Include the modification timestamp.
    pub modified: bool,
    /// Include the diagram image.
    pub image: bool,
    /// Include the logging configuration.
    pub logging_config: bool,
    /// Include the last execution result.
    pub last_execution_result: bool,
    /// Include the diagram area list.
    pub image_area_list: bool,
}

impl Default for FieldSelection {
    fn default() -> Self {
        Self {
            name: true,
            description: true,
            extended_description: true,
            created: true,
            modified: true,
            image: true,
            logging_config: false,
            last_execution_result: false,
            image_area_list: false,
        }
    }
}

impl FieldSelection {
    /// A selection with every field disabled.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            name: false,
            description: false,
            extended_description: false,
            created: false,
            modified: false,
            image: false,
            logging_config: false,
            last_execution_result: false,
            image_area_list: false,
        }
    }

    /// A selection with every field enabled.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            name: true,
            description: true,
            extended_description: true,
            created: true,
            modified: true,
            image: true,
            logging_config: true,
            last_execution_result: true,
            image_area_list: true,
        }
    }

    /// Returns whether a field is enabled.
    #[must_use]
    pub const fn includes(&self, field: MetadataField) -> bool {
        match field {
            MetadataField::Name => self.name,
            MetadataField::Description => self.description,
            MetadataField::ExtendedDescription => self.extended_description,
            MetadataField::Created => self.created,
            MetadataField::Modified => self.modified,
            MetadataField::Image => self.image,
            MetadataField::LoggingConfig => self.logging_config,
            MetadataField::LastExecutionResult => self.last_execution_result,
            MetadataField::ImageAreaList => self.image_area_list,
        }
    }

    /// Enables or disables a field.
    #[must_use]
    pub fn with(mut self, field: MetadataField, enabled: bool) -> Self {
        match field {
            MetadataField::Name => self.name = enabled,
            MetadataField::Description => self.description = enabled,
            MetadataField::ExtendedDescription => self.extended_description = enabled,
            MetadataField::Created => self.created = enabled,
            MetadataField::Modified => self.modified = enabled,
            MetadataField::Image => self.image = enabled,
            MetadataField::LoggingConfig => self.logging_config = enabled,
            MetadataField::LastExecutionResult => self.last_execution_result = enabled,
            MetadataField::ImageAreaList => self.image_area_list = enabled,
        }
        self
    }

    /// Enabled fields in projection order.
    pub fn enabled(&self) -> impl Iterator<Item = MetadataField> + '_ {
        MetadataField::ALL
            .into_iter()
            .filter(move |field| self.includes(*field))
    }
}

/// Configuration of the auto-documentation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoDocConfig {
    /// Name of the step, used in logs and result files.
    #[serde(default = "default_step_name")]
    pub step_name: String,
    /// Target document path; may reference variables.
    #[serde(default = "default_target_filename")]
    pub target_filename: String,
    /// Input field holding the subject name; may reference variables.
    #[serde(default = "default_filename_field")]
    pub filename_field: String,
    /// Input field holding the subject type label; may reference variables.
    #[serde(default = "default_file_type_field")]
    pub file_type_field: String,
    /// Output mode.
    #[serde(default)]
    pub output_type: OutputMode,
    /// Metadata columns to add in metadata mode.
    #[serde(default)]
    pub fields: FieldSelection,
}

fn default_step_name() -> String {
    "Auto Documentation Output".to_string()
}

fn default_target_filename() -> String {
    "${Internal.Pipeline.Filename.Directory}/autodoc.pdf".to_string()
}

fn default_filename_field() -> String {
    "filename".to_string()
}

fn default_file_type_field() -> String {
    "filetype".to_string()
}

impl Default for AutoDocConfig {
    fn default() -> Self {
        Self {
            step_name: default_step_name(),
            target_filename: default_target_filename(),
            filename_field: default_filename_field(),
            file_type_field: default_file_type_field(),
            output_type: OutputMode::default(),
            fields: FieldSelection::default(),
        }
    }
}

impl AutoDocConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the step name.
    #[must_use]
    pub fn with_step_name(mut self, name: impl Into<String>) -> Self {
        self.step_name = name.into();
        self
    }

    /// Sets the target filename.
    #[must_use]
    pub fn with_target_filename(mut self, target: impl Into<String>) -> Self {
        self.target_filename = target.into();
        self
    }

    /// Sets the name and type input fields.
    #[must_use]
    pub fn with_input_fields(
        mut self,
        filename_field: impl Into<String>,
        file_type_field: impl Into<String>,
    ) -> Self {
        self.filename_field = filename_field.into();
        self.file_type_field = file_type_field.into();
        self
    }

    /// Sets the output mode.
    #[must_use]
    pub fn with_output_type(mut self, output_type: OutputMode) -> Self {
        self.output_type = output_type;
        self
    }

    /// Sets the metadata field selection.
    #[must_use]
    pub fn with_fields(mut self, fields: FieldSelection) -> Self {
        self.fields = fields;
        self
    }

    /// Checks settings that do not depend on the input stream.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.filename_field.trim().is_empty() {
            return Err(ConfigError::Invalid("filename field is not set".into()));
        }
        if self.file_type_field.trim().is_empty() {
            return Err(ConfigError::Invalid("file type field is not set".into()));
        }
        if !self.output_type.is_metadata() && self.target_filename.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "target filename is required for document output".into(),
            ));
        }
        Ok(())
    }
}
