//! Annotation JSON → ordered [`RawRecord`]s.
//!
//! The service is asked for `{"records": [...]}` but does not always answer
//! in that shape: some responses echo the schema wrapper
//! (`{"properties": {"records": [...]}}`), some return a bare array, and
//! single-record pages sometimes come back as the record's fields directly
//! under `properties`. Every shape is normalised here so the reconciler only
//! ever sees a flat list.

use crate::record::{Field, FieldValue, RawRecord};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Envelope key holding the JSON-encoded annotation.
pub const ANNOTATION_KEY: &str = "document_annotation";

/// Extract the ordered record list from a service response.
///
/// Never fails: a missing or malformed annotation yields an empty list.
pub fn extract_records(response: &Value) -> Vec<RawRecord> {
    let annotation = decode_annotation(response);
    let items = locate_records(&annotation);
    let records: Vec<RawRecord> = items
        .iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(record_from_object(map)),
            other => {
                debug!("skipping non-object record entry: {}", other);
                None
            }
        })
        .collect();
    debug!("extracted {} records from annotation", records.len());
    records
}

/// Decode the annotation payload, defaulting to `{}`.
fn decode_annotation(response: &Value) -> Value {
    match response.get(ANNOTATION_KEY) {
        Some(Value::String(raw)) => serde_json::from_str(raw).unwrap_or_else(|e| {
            warn!("malformed {} JSON ({}); treating as empty", ANNOTATION_KEY, e);
            Value::Object(Map::new())
        }),
        Some(v) if v.is_object() || v.is_array() => v.clone(),
        _ => Value::Object(Map::new()),
    }
}

/// Apply the shape rules in order; the first match wins.
fn locate_records(annotation: &Value) -> Vec<Value> {
    let properties = annotation.get("properties");

    let mut records = if let Some(Value::Array(items)) = properties.and_then(|p| p.get("records")) {
        items.clone()
    } else if let Some(Value::Array(items)) = annotation.get("records") {
        items.clone()
    } else if let Value::Array(items) = annotation {
        items.clone()
    } else {
        Vec::new()
    };

    if records.is_empty() {
        if let Some(props) = properties.filter(|p| p.is_object()) {
            if props.get(Field::CustomerReferenceNumber.key()).is_some() {
                records.push(props.clone());
            }
        }
    }

    records
}

fn record_from_object(map: &Map<String, Value>) -> RawRecord {
    let mut record = RawRecord::new();
    for (key, value) in map {
        let Some(field) = Field::from_key(key) else {
            continue;
        };
        let value = match value {
            Value::Null => continue,
            Value::String(s) => FieldValue::Text(s.clone()),
            Value::Number(n) => match n.as_f64() {
                Some(f) => FieldValue::Number(f),
                None => FieldValue::Text(n.to_string()),
            },
            Value::Bool(b) => FieldValue::Text(b.to_string()),
            other => FieldValue::Text(other.to_string()),
        };
        record.set(field, value);
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(annotation: &str) -> Value {
        json!({ ANNOTATION_KEY: annotation })
    }

    #[test]
    fn top_level_records() {
        let response = envelope(r#"{"records": [{"customer_reference_number": "A1"}]}"#);
        let records = extract_records(&response);
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].text(Field::CustomerReferenceNumber).as_deref(),
            Some("A1")
        );
    }

    #[test]
    fn empty_annotation_yields_nothing() {
        assert!(extract_records(&envelope("{}")).is_empty());
    }

    #[test]
    fn properties_records_take_precedence() {
        let response = envelope(
            r#"{"properties": {"records": [{"customer_name": "P"}]},
                "records": [{"customer_name": "T"}]}"#,
        );
        let records = extract_records(&response);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text(Field::CustomerName).as_deref(), Some("P"));
    }

    #[test]
    fn bare_array() {
        let response = envelope(r#"[{"loan_period": 30}, {"loan_period": 15}]"#);
        let records = extract_records(&response);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get(Field::LoanPeriod), Some(&FieldValue::Number(15.0)));
    }

    #[test]
    fn single_record_under_properties() {
        let response = envelope(
            r#"{"properties": {"customer_reference_number": "R9", "customer_name": "Q"}}"#,
        );
        let records = extract_records(&response);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text(Field::CustomerName).as_deref(), Some("Q"));
    }

    #[test]
    fn properties_without_reference_is_ignored() {
        let response = envelope(r#"{"properties": {"customer_name": "Q"}}"#);
        assert!(extract_records(&response).is_empty());
    }

    #[test]
    fn empty_records_array_falls_back_to_properties() {
        let response = envelope(
            r#"{"records": [], "properties": {"customer_reference_number": "R1"}}"#,
        );
        assert_eq!(extract_records(&response).len(), 1);
    }

    #[test]
    fn malformed_or_missing_annotation_is_empty() {
        assert!(extract_records(&envelope("{not json")).is_empty());
        assert!(extract_records(&json!({})).is_empty());
        assert!(extract_records(&json!({ ANNOTATION_KEY: 42 })).is_empty());
    }

    #[test]
    fn nulls_unknown_keys_and_non_objects_are_dropped() {
        let response = envelope(
            r#"{"records": [
                {"customer_reference_number": null, "mystery": "x", "down_payment": "20%"},
                "garbage"
            ]}"#,
        );
        let records = extract_records(&response);
        assert_eq!(records.len(), 1);
        assert!(records[0].get(Field::CustomerReferenceNumber).is_none());
        assert_eq!(records[0].text(Field::DownPayment).as_deref(), Some("20%"));
        assert_eq!(records[0].filled_count(), 1);
    }

    #[test]
    fn decoded_object_annotation_is_accepted() {
        let response = json!({ ANNOTATION_KEY: {"records": [{"customer_name": "Z"}]} });
        assert_eq!(extract_records(&response).len(), 1);
    }
}
