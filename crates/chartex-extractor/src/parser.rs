//! Tolerant parsing of completion output into candidate records
//!
//! Models wrap their JSON in markdown fences, wrapper objects, or prose.
//! Parsing runs an ordered chain of strategies: fence strip, strict decode,
//! wrapper-key lookup, single-record detection, first-list-value scan,
//! whole-object wrap, and finally bracket-regex recovery. Every failure
//! path degrades to an empty sequence; this function never errors, so the
//! caller decides whether an empty result means retry or fallback.

use chartex_domain::Schema;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::warn;

/// A parsed candidate record before normalization
pub type RawRecord = Map<String, Value>;

/// Wrapper keys models commonly put around the record array, in priority order
const WRAPPER_KEYS: [&str; 5] = ["results", "features", "data", "notes", "extracted_features"];

/// Parse raw completion text into candidate records.
///
/// Returns an empty vector when nothing record-shaped can be recovered.
pub fn parse_completion(raw: &str, schema: &Schema) -> Vec<RawRecord> {
    let cleaned = strip_code_fence(raw);
    if cleaned.is_empty() {
        return Vec::new();
    }

    match serde_json::from_str::<Value>(cleaned) {
        Ok(value) => records_from_value(value, schema),
        Err(e) => {
            warn!("Strict JSON decode failed ({}), attempting bracket recovery", e);
            bracket_recovery(cleaned, schema)
        }
    }
}

/// Strip a leading/trailing markdown code fence if present
fn strip_code_fence(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

fn records_from_value(value: Value, schema: &Schema) -> Vec<RawRecord> {
    match value {
        Value::Array(items) => collect_objects(items),
        Value::Object(map) => records_from_object(map, schema),
        _ => {
            warn!("Top-level JSON value is neither an array nor an object");
            Vec::new()
        }
    }
}

/// Resolve a top-level mapping into a record sequence
fn records_from_object(mut map: RawRecord, schema: &Schema) -> Vec<RawRecord> {
    // 1. Known wrapper keys, in priority order
    for key in WRAPPER_KEYS {
        match map.get(key) {
            Some(Value::Array(_)) => {
                if let Some(Value::Array(items)) = map.remove(key) {
                    return collect_objects(items);
                }
            }
            Some(Value::Object(_)) => {
                // A wrapper holding a single record
                if let Some(Value::Object(single)) = map.remove(key) {
                    return vec![single];
                }
            }
            _ => {}
        }
    }

    // 2. The mapping itself may be a single record in disguise
    if looks_like_record(&map, schema) {
        return vec![map];
    }

    // 3. First list-typed value anywhere in the mapping
    if let Some(key) = map
        .iter()
        .find_map(|(k, v)| v.is_array().then(|| k.clone()))
    {
        if let Some(Value::Array(items)) = map.remove(&key) {
            return collect_objects(items);
        }
    }

    // 4. Last resort: treat the whole mapping as one record
    vec![map]
}

/// Keep only object entries, warning on anything else
fn collect_objects(items: Vec<Value>) -> Vec<RawRecord> {
    let mut records = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(map) => records.push(map),
            _ => warn!("Skipping non-object entry {} in record array", idx),
        }
    }
    records
}

/// A mapping counts as a single record when at least half of the schema's
/// fields appear among its keys
fn looks_like_record(map: &RawRecord, schema: &Schema) -> bool {
    let matching = schema
        .field_names()
        .filter(|name| map.contains_key(*name))
        .count();
    matching >= schema.len() / 2
}

/// Regex fallback for responses where prose surrounds the JSON: first try
/// the outermost `[...]` span as a list, then the outermost `{...}` span as
/// a mapping with the same wrapper/validity logic as the strict path
fn bracket_recovery(text: &str, schema: &Schema) -> Vec<RawRecord> {
    if let Some(span) = find_span(text, r"(?s)\[.*\]") {
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(&span) {
            return collect_objects(items);
        }
    }

    if let Some(span) = find_span(text, r"(?s)\{.*\}") {
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&span) {
            return records_from_object(map, schema);
        }
    }

    warn!("All parse strategies failed; treating response as unparseable");
    Vec::new()
}

fn find_span(text: &str, pattern: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    re.find(text).map(|m| m.as_str().to_string())
}
