//! Coercion of parsed records onto the active schema
//!
//! The parser is deliberately permissive; this module restores the
//! pipeline's shape invariants: exactly N records for N notes, and exactly
//! the schema's fields in every record.

use crate::parser::RawRecord;
use chartex_domain::{Record, Schema};
use serde_json::Value;
use tracing::warn;

/// Force a parsed sequence to exactly `expected` well-formed records.
///
/// Short sequences are padded with canonical empty records; long sequences
/// are truncated to the first `expected`. Each surviving record is coerced
/// to exactly the schema's fields: missing keys become "", extra keys are
/// dropped.
pub fn normalize_records(parsed: Vec<RawRecord>, schema: &Schema, expected: usize) -> Vec<Record> {
    if parsed.len() != expected {
        warn!(
            "Expected {} records, got {}; padding or truncating to match",
            expected,
            parsed.len()
        );
    }

    let mut records: Vec<Record> = parsed
        .into_iter()
        .take(expected)
        .map(|raw| coerce_record(raw, schema))
        .collect();

    while records.len() < expected {
        records.push(schema.empty_record());
    }

    records
}

/// Coerce one parsed map onto the schema's exact field set
fn coerce_record(raw: RawRecord, schema: &Schema) -> Record {
    let mut record = schema.empty_record();
    for field in schema.fields() {
        if let Some(value) = raw.get(&field.name) {
            record.insert(field.name.as_str(), field_text(value));
        }
    }
    record
}

/// Render a JSON value as a field string: strings are trimmed, null maps to
/// "", arrays join their rendered elements with "; ", and anything else is
/// displayed
fn field_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(field_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("; "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::clinical_note()
    }

    fn raw(value: serde_json::Value) -> RawRecord {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_pad_short_sequence() {
        let parsed = vec![
            raw(json!({"Chief_Complaint": "Chest pain"})),
            raw(json!({"Chief_Complaint": "Fever"})),
            raw(json!({"Chief_Complaint": "Headache"})),
        ];
        let records = normalize_records(parsed, &schema(), 5);

        assert_eq!(records.len(), 5);
        assert_eq!(records[0].get("Chief_Complaint"), Some("Chest pain"));
        assert!(records[3].is_blank());
        assert!(records[4].is_blank());
    }

    #[test]
    fn test_truncate_long_sequence() {
        let parsed: Vec<RawRecord> = (0..7)
            .map(|i| raw(json!({"Chief_Complaint": format!("complaint {}", i)})))
            .collect();
        let records = normalize_records(parsed, &schema(), 5);

        assert_eq!(records.len(), 5);
        assert_eq!(records[4].get("Chief_Complaint"), Some("complaint 4"));
    }

    #[test]
    fn test_every_record_gets_exactly_schema_fields() {
        let parsed = vec![raw(json!({
            "Chief_Complaint": "Chest pain",
            "Unexpected_Field": "dropped",
            "confidence": 0.9
        }))];
        let records = normalize_records(parsed, &schema(), 1);
        let schema = schema();

        assert_eq!(records[0].len(), schema.len());
        assert_eq!(records[0].get("Unexpected_Field"), None);
        assert_eq!(records[0].get("Chief_Complaint"), Some("Chest pain"));
        // Missing fields are present as empty strings
        assert_eq!(records[0].get("Plan"), Some(""));
    }

    #[test]
    fn test_value_coercion() {
        let parsed = vec![raw(json!({
            "Chief_Complaint": "  padded  ",
            "Past_Medical_History": ["Diabetes Type 2", "Hypertension"],
            "Physical_Exam": null,
            "Labs_Imaging_Results": 42,
            "Allergies": true
        }))];
        let records = normalize_records(parsed, &schema(), 1);
        let record = &records[0];

        assert_eq!(record.get("Chief_Complaint"), Some("padded"));
        assert_eq!(
            record.get("Past_Medical_History"),
            Some("Diabetes Type 2; Hypertension")
        );
        assert_eq!(record.get("Physical_Exam"), Some(""));
        assert_eq!(record.get("Labs_Imaging_Results"), Some("42"));
        assert_eq!(record.get("Allergies"), Some("true"));
    }

    #[test]
    fn test_nested_object_value_rendered_as_json() {
        let parsed = vec![raw(json!({
            "Physical_Exam": {"BP": "140/90"}
        }))];
        let records = normalize_records(parsed, &schema(), 1);

        assert_eq!(records[0].get("Physical_Exam"), Some(r#"{"BP":"140/90"}"#));
    }

    #[test]
    fn test_empty_parse_yields_all_canonical_empties() {
        let records = normalize_records(Vec::new(), &schema(), 3);

        assert_eq!(records.len(), 3);
        assert!(records.iter().all(Record::is_blank));
    }
}
