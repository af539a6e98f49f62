//! Record types shared by every pipeline stage.
//!
//! The document-AI service returns a flat list of field mappings per image.
//! A mapping that carries all twelve [`Field`]s describes one mortgage
//! document; anything less is a slice of one, and the reconciler decides
//! whether it is the head of a new document or the tail of the previous.
//!
//! Three wrappers encode where a record sits in that lifecycle:
//!
//! * [`RawRecord`] — straight out of the extractor, possibly incomplete
//! * [`PartialRecord`] — the single incomplete record carried to the next image
//! * [`CompleteRecord`] — ready for calculation and formatting

use serde::{Deserialize, Serialize};
use std::fmt;

/// The twelve fields requested from the document-AI service, in column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    CustomerReferenceNumber,
    CustomerName,
    CityState,
    PurchaseValue,
    DownPayment,
    LoanPeriod,
    AnnualInterest,
    GuarantorName,
    GuarantorReferenceNumber,
    PurchaseValueReduction,
    MonthlyPrincipalReduction,
    TotalInterestReduction,
}

impl Field {
    /// Number of fields in a record.
    pub const COUNT: usize = 12;

    /// All fields in schema order.
    pub const ALL: [Field; Field::COUNT] = [
        Field::CustomerReferenceNumber,
        Field::CustomerName,
        Field::CityState,
        Field::PurchaseValue,
        Field::DownPayment,
        Field::LoanPeriod,
        Field::AnnualInterest,
        Field::GuarantorName,
        Field::GuarantorReferenceNumber,
        Field::PurchaseValueReduction,
        Field::MonthlyPrincipalReduction,
        Field::TotalInterestReduction,
    ];

    /// JSON key used in the annotation schema and response.
    pub fn key(self) -> &'static str {
        match self {
            Field::CustomerReferenceNumber => "customer_reference_number",
            Field::CustomerName => "customer_name",
            Field::CityState => "city_state",
            Field::PurchaseValue => "purchase_value",
            Field::DownPayment => "down_payment",
            Field::LoanPeriod => "loan_period",
            Field::AnnualInterest => "annual_interest",
            Field::GuarantorName => "guarantor_name",
            Field::GuarantorReferenceNumber => "guarantor_reference_number",
            Field::PurchaseValueReduction => "purchase_value_reduction",
            Field::MonthlyPrincipalReduction => "monthly_principal_reduction",
            Field::TotalInterestReduction => "total_interest_reduction",
        }
    }

    /// Human-readable title, used as the schema `title`.
    pub fn title(self) -> &'static str {
        match self {
            Field::CustomerReferenceNumber => "Customer Reference Number",
            Field::CustomerName => "Customer Name",
            Field::CityState => "City, State",
            Field::PurchaseValue => "Purchase Value",
            Field::DownPayment => "Down Payment",
            Field::LoanPeriod => "Loan Period",
            Field::AnnualInterest => "Annual Interest",
            Field::GuarantorName => "Guarantor Name",
            Field::GuarantorReferenceNumber => "Guarantor Reference Number",
            Field::PurchaseValueReduction => "Purchase Value Reduction",
            Field::MonthlyPrincipalReduction => "Monthly Principal Reduction",
            Field::TotalInterestReduction => "Total Interest Reduction",
        }
    }

    /// Look up a field by its JSON key.
    pub fn from_key(key: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.key() == key)
    }

    /// Whether the field holds an amount, percentage or period rather than text.
    pub fn is_numeric(self) -> bool {
        !matches!(
            self,
            Field::CustomerReferenceNumber
                | Field::CustomerName
                | Field::CityState
                | Field::GuarantorName
                | Field::GuarantorReferenceNumber
        )
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A single extracted value: the service may return text or a JSON number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Blank text counts as empty; numbers (including zero) never do.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Number(_) => false,
            FieldValue::Text(s) => s.trim().is_empty(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

/// One candidate record as extracted from a single image.
///
/// Serialises as a JSON object keyed by [`Field::key`], omitting absent fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    values: [Option<FieldValue>; Field::COUNT],
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter, handy in tests and fixtures.
    pub fn with(mut self, field: Field, value: FieldValue) -> Self {
        self.set(field, value);
        self
    }

    pub fn with_text(self, field: Field, value: impl Into<String>) -> Self {
        self.with(field, FieldValue::Text(value.into()))
    }

    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        self.values[field.index()].as_ref()
    }

    pub fn set(&mut self, field: Field, value: FieldValue) {
        self.values[field.index()] = Some(value);
    }

    /// `true` when the field is absent or blank.
    pub fn is_empty_field(&self, field: Field) -> bool {
        self.get(field).is_none_or(FieldValue::is_empty)
    }

    /// A non-empty customer reference number marks the start of a new document.
    pub fn has_reference(&self) -> bool {
        !self.is_empty_field(Field::CustomerReferenceNumber)
    }

    /// Fields that are still absent or blank, in schema order.
    pub fn missing_fields(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|&f| self.is_empty_field(f))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        Field::ALL.into_iter().all(|f| !self.is_empty_field(f))
    }

    /// Number of non-empty fields.
    pub fn filled_count(&self) -> usize {
        Field::COUNT - self.missing_fields().len()
    }

    /// Fill every empty field of `self` from `other`. Fields already set on
    /// `self` are never overwritten.
    pub fn merge_from(&mut self, other: &RawRecord) {
        for field in Field::ALL {
            if self.is_empty_field(field) && !other.is_empty_field(field) {
                self.values[field.index()] = other.values[field.index()].clone();
            }
        }
    }

    /// Iterate over present values in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &FieldValue)> {
        Field::ALL
            .into_iter()
            .filter_map(move |f| self.get(f).map(|v| (f, v)))
    }

    /// Text rendering of a field; numbers use their shortest decimal form.
    pub fn text(&self, field: Field) -> Option<String> {
        self.get(field).map(|v| v.to_string())
    }
}

impl Serialize for RawRecord {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(None)?;
        for (field, value) in self.iter() {
            map.serialize_entry(field.key(), value)?;
        }
        map.end()
    }
}

/// A record known to be missing fields, carried between images.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartialRecord(RawRecord);

impl PartialRecord {
    pub fn new(record: RawRecord) -> Self {
        Self(record)
    }

    pub fn record(&self) -> &RawRecord {
        &self.0
    }

    pub fn into_raw(self) -> RawRecord {
        self.0
    }

    /// End-of-run flush: emit whatever was gathered, complete or not.
    pub fn flush(self) -> CompleteRecord {
        CompleteRecord(self.0)
    }
}

/// A record ready for calculation and formatting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompleteRecord(RawRecord);

impl CompleteRecord {
    pub(crate) fn new(record: RawRecord) -> Self {
        Self(record)
    }

    pub fn record(&self) -> &RawRecord {
        &self.0
    }

    pub fn into_raw(self) -> RawRecord {
        self.0
    }
}

impl std::ops::Deref for CompleteRecord {
    type Target = RawRecord;

    fn deref(&self) -> &RawRecord {
        &self.0
    }
}
