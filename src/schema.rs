//! JSON schema sent to the OCR service as the annotation format.
//!
//! The service fills a `{"records": [...]}` object matching this schema for
//! every image. Descriptions on the numeric fields steer the model towards
//! the bare figure ("20", not "20% of the purchase price").

use crate::config::FieldMode;
use crate::record::Field;
use serde_json::{json, Map, Value};

/// Name the schema is registered under in the request.
pub const SCHEMA_NAME: &str = "document_annotation";

/// Title of the per-record object schema.
pub const RECORD_TITLE: &str = "MortgageDocument";

/// Build the annotation schema for the given field mode.
///
/// ```rust
/// use mortgage_extract::{annotation_schema, FieldMode};
///
/// let schema = annotation_schema(FieldMode::Text);
/// let down = &schema["properties"]["records"]["items"]["properties"]["down_payment"];
/// assert_eq!(down["type"], "string");
/// ```
pub fn annotation_schema(mode: FieldMode) -> Value {
    let mut properties = Map::new();
    for field in Field::ALL {
        properties.insert(field.key().to_string(), field_schema(field, mode));
    }
    let required: Vec<&str> = Field::ALL.iter().map(|f| f.key()).collect();

    let record = json!({
        "title": RECORD_TITLE,
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    });

    json!({
        "type": "object",
        "properties": {
            "records": {
                "type": "array",
                "description": "A list of all records found in the document.",
                "items": record,
            }
        },
        "required": ["records"],
    })
}

fn field_schema(field: Field, mode: FieldMode) -> Value {
    let numeric = field.is_numeric() && mode == FieldMode::Numeric;
    let json_type = if numeric { "number" } else { "string" };
    let mut schema = json!({
        "title": field.title(),
        "type": json_type,
    });
    if let Some(text) = description(field, numeric) {
        schema["description"] = Value::String(text);
    }
    schema
}

fn description(field: Field, numeric: bool) -> Option<String> {
    let subject = match field {
        Field::PurchaseValue => "the purchase value in dollars",
        Field::DownPayment => "the percentage for the down payment",
        Field::LoanPeriod => "the loan period in years",
        Field::AnnualInterest => "the annual interest percentage",
        Field::PurchaseValueReduction => "the purchase value reduction percentage",
        Field::MonthlyPrincipalReduction => "the monthly principal reduction percentage",
        Field::TotalInterestReduction => "the total interest reduction percentage",
        _ => return None,
    };
    Some(if numeric {
        format!("Extract only {subject}, as a number.")
    } else {
        format!("Extract {subject} exactly as written, including any words.")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_properties(schema: &Value) -> &Map<String, Value> {
        schema["properties"]["records"]["items"]["properties"]
            .as_object()
            .expect("record properties")
    }

    #[test]
    fn lists_every_field_as_required() {
        let schema = annotation_schema(FieldMode::Numeric);
        let items = &schema["properties"]["records"]["items"];
        assert_eq!(items["title"], RECORD_TITLE);
        assert_eq!(items["additionalProperties"], false);
        assert_eq!(items["required"].as_array().unwrap().len(), Field::COUNT);
        assert_eq!(item_properties(&schema).len(), Field::COUNT);
        assert_eq!(schema["required"], json!(["records"]));
    }

    #[test]
    fn numeric_mode_types() {
        let schema = annotation_schema(FieldMode::Numeric);
        let props = item_properties(&schema);
        assert_eq!(props["loan_period"]["type"], "number");
        assert_eq!(props["customer_name"]["type"], "string");
        assert_eq!(
            props["down_payment"]["description"],
            "Extract only the percentage for the down payment, as a number."
        );
        assert!(props["customer_name"].get("description").is_none());
    }

    #[test]
    fn text_mode_is_all_strings() {
        let schema = annotation_schema(FieldMode::Text);
        assert!(item_properties(&schema)
            .values()
            .all(|p| p["type"] == "string"));
    }
}
