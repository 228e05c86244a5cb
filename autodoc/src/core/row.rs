//! Row schemas and rows.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{Value, ValueType};

/// Describes one column of a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueMeta {
    /// Column name.
    pub name: String,
    /// Declared column type.
    pub value_type: ValueType,
}

impl ValueMeta {
    /// Creates a new column descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
        }
    }

    /// Creates a string column descriptor.
    #[must_use]
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::String)
    }
}

/// An ordered set of column descriptors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowMeta {
    fields: Vec<ValueMeta>,
}

impl RowMeta {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a schema from column descriptors.
    #[must_use]
    pub fn from_fields(fields: Vec<ValueMeta>) -> Self {
        Self { fields }
    }

    /// Appends a column.
    #[must_use]
    pub fn with_field(mut self, field: ValueMeta) -> Self {
        self.fields.push(field);
        self
    }

    /// Appends a column in place.
    pub fn push(&mut self, field: ValueMeta) {
        self.fields.push(field);
    }

    /// Returns the position of the named column.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Returns the column at `index`.
    #[must_use]
    pub fn field(&self, index: usize) -> Option<&ValueMeta> {
        self.fields.get(index)
    }

    /// Returns all columns.
    #[must_use]
    pub fn fields(&self) -> &[ValueMeta] {
        &self.fields
    }

    /// Returns the column names in order.
    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the schema has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A row of values described by a shared schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    meta: Arc<RowMeta>,
    values: Vec<Value>,
}

impl Row {
    /// Creates a row. Missing trailing values are filled with nulls.
    #[must_use]
    pub fn new(meta: Arc<RowMeta>, mut values: Vec<Value>) -> Self {
        if values.len() < meta.len() {
            values.resize(meta.len(), Value::Null);
        }
        Self { meta, values }
    }

    /// Returns the row schema.
    #[must_use]
    pub fn meta(&self) -> &Arc<RowMeta> {
        &self.meta
    }

    /// Returns the values.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Returns the value at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Returns the value of the named column.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.meta.index_of(name).and_then(|i| self.values.get(i))
    }

    /// Returns the string at `index`, or `None` if it is null or not a string.
    #[must_use]
    pub fn get_str(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(Value::as_str)
    }

    /// Consumes the row, returning its values.
    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Re-describes the row with a wider schema, appending `extra` values.
    #[must_use]
    pub fn extend(self, meta: Arc<RowMeta>, extra: Vec<Value>) -> Self {
        let mut values = self.values;
        values.extend(extra);
        Self::new(meta, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input_meta() -> Arc<RowMeta> {
        Arc::new(
            RowMeta::new()
                .with_field(ValueMeta::string("filename"))
                .with_field(ValueMeta::string("filetype")),
        )
    }

    #[test]
    fn test_index_of() {
        let meta = input_meta();
        assert_eq!(meta.index_of("filetype"), Some(1));
        assert_eq!(meta.index_of("missing"), None);
    }

    #[test]
    fn test_row_pads_missing_values() {
        let row = Row::new(input_meta(), vec![Value::from("a.ktr")]);
        assert_eq!(row.values().len(), 2);
        assert!(row.get(1).unwrap().is_null());
        assert_eq!(row.get_str(0), Some("a.ktr"));
        assert_eq!(row.get_str(1), None);
    }

    #[test]
    fn test_extend_appends_after_input() {
        let row = Row::new(input_meta(), vec!["a".into(), "Job".into()]);
        let wider = Arc::new((*input_meta()).clone().with_field(ValueMeta::string("name")));
        let out = row.extend(wider, vec![Value::from("A")]);
        assert_eq!(out.get_by_name("name"), Some(&Value::from("A")));
        assert_eq!(out.values().len(), 3);
    }
}
