//! Loan figures derived from a complete record.
//!
//! Every input and output is a [`Figure`]: either a number, or the original
//! text of a field that could not be read as one. Arithmetic on an unparsed
//! figure yields that same text, so a garbled amount shows up in the report
//! where the derived value would have been instead of aborting the run.
//!
//! Percentages are stored as whole numbers (`12` means 12 %) and divided by
//! 100 at the point of use.

use crate::pipeline::words::{parse_currency, parse_quantity, PhraseValue};
use crate::record::{CompleteRecord, Field, FieldValue};
use serde::Serialize;

/// A numeric value, or the text it could not be parsed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Figure {
    Value(f64),
    Unparsed(String),
}

impl Figure {
    pub fn value(&self) -> Option<f64> {
        match self {
            Figure::Value(v) => Some(*v),
            Figure::Unparsed(_) => None,
        }
    }

    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Figure {
        match self {
            Figure::Value(v) => Figure::Value(f(v)),
            unparsed => unparsed,
        }
    }

    /// Combine two figures; the first unparsed operand wins.
    pub fn zip(self, other: &Figure, f: impl FnOnce(f64, f64) -> f64) -> Figure {
        match (self, other) {
            (Figure::Value(a), Figure::Value(b)) => Figure::Value(f(a, *b)),
            (Figure::Value(_), Figure::Unparsed(s)) => Figure::Unparsed(s.clone()),
            (unparsed, _) => unparsed,
        }
    }
}

impl From<PhraseValue> for Figure {
    fn from(v: PhraseValue) -> Self {
        match v {
            PhraseValue::Number(n) => Figure::Value(n),
            PhraseValue::Text(s) => Figure::Unparsed(s),
        }
    }
}

/// The numeric fields of a record, read and ready for arithmetic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericInputs {
    pub purchase_value: Figure,
    pub down_payment_pct: Figure,
    pub loan_period_years: Figure,
    pub annual_interest_pct: Figure,
    pub purchase_value_reduction_pct: Figure,
    pub monthly_principal_reduction_pct: Figure,
    pub total_interest_reduction_pct: Figure,
}

impl NumericInputs {
    /// Read the numeric fields. Absent fields count as zero; text goes
    /// through the phrase converter.
    pub fn from_record(record: &CompleteRecord) -> Self {
        let read = |field: Field| -> Figure {
            match record.get(field) {
                None => Figure::Value(0.0),
                Some(FieldValue::Number(n)) => Figure::Value(*n),
                Some(FieldValue::Text(s)) if s.trim().is_empty() => Figure::Value(0.0),
                Some(FieldValue::Text(s)) if field == Field::PurchaseValue => {
                    parse_currency(s).into()
                }
                Some(FieldValue::Text(s)) => parse_quantity(s).into(),
            }
        };

        Self {
            purchase_value: read(Field::PurchaseValue),
            down_payment_pct: read(Field::DownPayment),
            loan_period_years: read(Field::LoanPeriod),
            annual_interest_pct: read(Field::AnnualInterest),
            purchase_value_reduction_pct: read(Field::PurchaseValueReduction),
            monthly_principal_reduction_pct: read(Field::MonthlyPrincipalReduction),
            total_interest_reduction_pct: read(Field::TotalInterestReduction),
        }
    }
}

/// Derived loan figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanFigures {
    pub final_purchase_value: Figure,
    pub down_payment_value: Figure,
    pub loan_amount: Figure,
    /// Whole years; fractional periods are truncated.
    pub loan_period_years: Figure,
    pub monthly_principal: Figure,
    pub final_monthly_principal: Figure,
    pub total_interest: Figure,
    pub final_total_interest: Figure,
}

impl LoanFigures {
    pub fn compute(inputs: &NumericInputs) -> Self {
        let reduce = |amount: f64, pct: f64| amount * (1.0 - pct / 100.0);

        let final_purchase_value = inputs
            .purchase_value
            .clone()
            .zip(&inputs.purchase_value_reduction_pct, reduce);
        let down_payment_value = final_purchase_value
            .clone()
            .zip(&inputs.down_payment_pct, |v, pct| v * pct / 100.0);
        let loan_amount = final_purchase_value
            .clone()
            .zip(&down_payment_value, |v, down| v - down);
        let years = inputs.loan_period_years.clone().map(f64::trunc);
        let monthly_principal = loan_amount.clone().zip(&years, |loan, y| {
            if y > 0.0 {
                loan / (y * 12.0)
            } else {
                0.0
            }
        });
        let final_monthly_principal = monthly_principal
            .clone()
            .zip(&inputs.monthly_principal_reduction_pct, reduce);
        let total_interest = loan_amount
            .clone()
            .zip(&inputs.annual_interest_pct, |loan, pct| loan * pct / 100.0)
            .zip(&years, |v, y| v * y);
        let final_total_interest = total_interest
            .clone()
            .zip(&inputs.total_interest_reduction_pct, reduce);

        Self {
            final_purchase_value,
            down_payment_value,
            loan_amount,
            loan_period_years: years,
            monthly_principal,
            final_monthly_principal,
            total_interest,
            final_total_interest,
        }
    }
}

/// Split `"City, ST"` on the first comma into trimmed parts. Without a comma
/// the state is empty.
pub fn split_city_state(city_state: &str) -> (String, String) {
    match city_state.split_once(',') {
        Some((city, state)) => (city.trim().to_string(), state.trim().to_string()),
        None => (city_state.trim().to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RawRecord;

    fn record(values: &[(Field, FieldValue)]) -> CompleteRecord {
        let raw = values
            .iter()
            .fold(RawRecord::new(), |r, (f, v)| r.with(*f, v.clone()));
        CompleteRecord::new(raw)
    }

    fn num(n: f64) -> FieldValue {
        FieldValue::Number(n)
    }

    fn approx(figure: &Figure, expected: f64) {
        let v = figure.value().expect("expected a numeric figure");
        assert!((v - expected).abs() < 1e-6, "got {v}, expected {expected}");
    }

    fn sample() -> CompleteRecord {
        record(&[
            (Field::PurchaseValue, num(300_000.0)),
            (Field::DownPayment, num(20.0)),
            (Field::LoanPeriod, num(30.0)),
            (Field::AnnualInterest, num(5.0)),
            (Field::PurchaseValueReduction, num(10.0)),
            (Field::MonthlyPrincipalReduction, num(50.0)),
            (Field::TotalInterestReduction, num(25.0)),
        ])
    }

    #[test]
    fn computes_loan_figures() {
        let figures = LoanFigures::compute(&NumericInputs::from_record(&sample()));
        approx(&figures.final_purchase_value, 270_000.0);
        approx(&figures.down_payment_value, 54_000.0);
        approx(&figures.loan_amount, 216_000.0);
        approx(&figures.monthly_principal, 600.0);
        approx(&figures.final_monthly_principal, 300.0);
        approx(&figures.total_interest, 324_000.0);
        approx(&figures.final_total_interest, 243_000.0);
    }

    #[test]
    fn zero_period_means_zero_principal() {
        let r = record(&[
            (Field::PurchaseValue, num(100_000.0)),
            (Field::LoanPeriod, num(0.0)),
        ]);
        let figures = LoanFigures::compute(&NumericInputs::from_record(&r));
        approx(&figures.loan_amount, 100_000.0);
        approx(&figures.monthly_principal, 0.0);
        approx(&figures.total_interest, 0.0);
    }

    #[test]
    fn fractional_period_is_truncated() {
        let r = record(&[
            (Field::PurchaseValue, num(120_000.0)),
            (Field::LoanPeriod, num(10.9)),
        ]);
        let figures = LoanFigures::compute(&NumericInputs::from_record(&r));
        approx(&figures.loan_period_years, 10.0);
        approx(&figures.monthly_principal, 1_000.0);
    }

    #[test]
    fn text_inputs_are_converted() {
        let r = record(&[
            (Field::PurchaseValue, FieldValue::Text("$ 1 , 500.00".into())),
            (Field::DownPayment, FieldValue::Text("TWENTY PERCENT".into())),
            (Field::LoanPeriod, FieldValue::Text("FIVE YEARS".into())),
            (Field::AnnualInterest, FieldValue::Text("FOURTEEN POINT SEVENTY FOUR".into())),
        ]);
        let inputs = NumericInputs::from_record(&r);
        approx(&inputs.purchase_value, 1_500.0);
        approx(&inputs.down_payment_pct, 20.0);
        approx(&inputs.loan_period_years, 5.0);
        approx(&inputs.annual_interest_pct, 14.74);
    }

    #[test]
    fn unparsed_input_propagates_text() {
        let r = record(&[
            (Field::PurchaseValue, FieldValue::Text("SEE ATTACHED".into())),
            (Field::LoanPeriod, num(10.0)),
        ]);
        let figures = LoanFigures::compute(&NumericInputs::from_record(&r));
        let expected = Figure::Unparsed("SEE ATTACHED".into());
        assert_eq!(figures.final_purchase_value, expected);
        assert_eq!(figures.loan_amount, expected);
        assert_eq!(figures.final_total_interest, expected);
        approx(&figures.loan_period_years, 10.0);
    }

    #[test]
    fn zip_prefers_first_unparsed() {
        let a = Figure::Unparsed("a".into());
        let b = Figure::Unparsed("b".into());
        assert_eq!(a.clone().zip(&b, |x, y| x + y), a);
        assert_eq!(Figure::Value(1.0).zip(&b, |x, y| x + y), b);
    }

    #[test]
    fn splits_city_state() {
        assert_eq!(split_city_state(" Austin , TX "), ("Austin".into(), "TX".into()));
        assert_eq!(split_city_state("Austin"), ("Austin".into(), String::new()));
        assert_eq!(
            split_city_state("Salt Lake City, UT, USA"),
            ("Salt Lake City".into(), "UT, USA".into())
        );
    }
}
