//! The extracted field map for a single note

use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A string-valued field map extracted from one note.
///
/// Once a record leaves the pipeline it holds exactly the active schema's
/// fields, each mapped to a string value ("" when the note carried nothing
/// for that field). Multiple sub-values within one field are joined with
/// `;` by the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    values: BTreeMap<String, String>,
}

impl Record {
    /// Create an empty record with no fields
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field value, replacing any previous value
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.values.insert(field.into(), value.into());
    }

    /// Get a field value
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    /// Number of fields in this record
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether this record has no fields at all
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over (field, value) pairs in field-name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether every field value is empty after trimming.
    ///
    /// This is the signature of a degraded row: batches that exhaust their
    /// retries come back as all-blank records rather than errors, so callers
    /// inspect this to detect silently-failed notes.
    pub fn is_blank(&self) -> bool {
        self.values.values().all(|v| v.trim().is_empty())
    }

    /// Iterate values in the schema's field order.
    ///
    /// Fields absent from the record yield "" so the output shape is stable
    /// for tabular consumers.
    pub fn in_order<'a>(&'a self, schema: &'a Schema) -> impl Iterator<Item = (&'a str, &'a str)> {
        schema
            .field_names()
            .map(move |name| (name, self.get(name).unwrap_or("")))
    }
}
