//! Render a complete record and its figures as one report row.

use crate::pipeline::calculate::{split_city_state, Figure, LoanFigures, NumericInputs};
use crate::pipeline::tax::TaxRate;
use crate::record::{CompleteRecord, Field};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Report column headers, in output order.
pub const COLUMNS: [&str; 10] = [
    "Customer Reference Number",
    "Customer Name",
    "City, State",
    "Purchase Value and Down Payment",
    "Loan Period and Annual Interest",
    "Guarantor Name",
    "Guarantor Reference Number",
    "Loan amount and principal",
    "Total Interest for Loan Period and Property tax for Loan Period",
    "Property Insurance per month and PMI per annum",
];

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// One output row, already rendered to display strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedRow {
    pub customer_reference_number: String,
    pub customer_name: String,
    pub city_state: String,
    pub purchase_value_and_down_payment: String,
    pub loan_period_and_annual_interest: String,
    pub guarantor_name: String,
    pub guarantor_reference_number: String,
    pub loan_amount_and_principal: String,
    pub total_interest_and_property_tax: String,
    pub property_insurance_and_pmi: String,
}

impl FormattedRow {
    /// Build a row from a record, its computed figures and the property-tax
    /// rate looked up for its city.
    pub fn render(
        record: &CompleteRecord,
        inputs: &NumericInputs,
        figures: &LoanFigures,
        property_tax: &TaxRate,
        insurance_and_pmi: &str,
    ) -> Self {
        let text = |field: Field| record.text(field).unwrap_or_default();

        let down_payment = match &inputs.down_payment_pct {
            Figure::Value(v) => format!("{} %", v.trunc() as i64),
            Figure::Unparsed(s) => s.clone(),
        };
        let years = match &figures.loan_period_years {
            Figure::Value(v) => format!("{} YEARS", *v as i64),
            Figure::Unparsed(s) => s.clone(),
        };

        Self {
            customer_reference_number: normalise_name(&text(Field::CustomerReferenceNumber)),
            customer_name: normalise_name(&text(Field::CustomerName)),
            city_state: text(Field::CityState).to_uppercase().replace(',', " , "),
            purchase_value_and_down_payment: format!(
                "{} AND {}",
                format_figure(&figures.final_purchase_value),
                down_payment
            ),
            loan_period_and_annual_interest: format!(
                "{} AND {}",
                years,
                format_percent(&inputs.annual_interest_pct)
            ),
            guarantor_name: normalise_name(&text(Field::GuarantorName)),
            guarantor_reference_number: normalise_name(&text(Field::GuarantorReferenceNumber)),
            loan_amount_and_principal: format!(
                "{} AND {}",
                format_figure(&figures.loan_amount),
                format_figure(&figures.final_monthly_principal)
            ),
            total_interest_and_property_tax: format!(
                "{} AND {}",
                format_figure(&figures.final_total_interest),
                format_tax(property_tax)
            ),
            property_insurance_and_pmi: insurance_and_pmi.to_string(),
        }
    }

    /// Cell values in [`COLUMNS`] order.
    pub fn cells(&self) -> [&str; 10] {
        [
            self.customer_reference_number.as_str(),
            self.customer_name.as_str(),
            self.city_state.as_str(),
            self.purchase_value_and_down_payment.as_str(),
            self.loan_period_and_annual_interest.as_str(),
            self.guarantor_name.as_str(),
            self.guarantor_reference_number.as_str(),
            self.loan_amount_and_principal.as_str(),
            self.total_interest_and_property_tax.as_str(),
            self.property_insurance_and_pmi.as_str(),
        ]
    }
}

/// City and state of a record, for the property-tax lookup.
pub fn city_and_state(record: &CompleteRecord) -> (String, String) {
    split_city_state(&record.text(Field::CityState).unwrap_or_default())
}

/// Uppercase and collapse internal whitespace.
pub fn normalise_name(name: &str) -> String {
    RE_WHITESPACE
        .replace_all(name.trim(), " ")
        .to_uppercase()
}

/// `$ 1 , 234 , 567.89`: two decimals, groups of three joined by ` , `.
pub fn format_currency(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let digits: Vec<char> = int_part.chars().collect();
    let groups: Vec<String> = digits
        .rchunks(3)
        .rev()
        .map(|chunk| chunk.iter().collect())
        .collect();

    let sign = if value < 0.0 && fixed.bytes().any(|b| b != b'0' && b != b'.') {
        "-"
    } else {
        ""
    };
    format!("$ {}{}.{}", sign, groups.join(" , "), frac_part)
}

/// Currency for numbers; unparsed figures print their original text.
pub fn format_figure(figure: &Figure) -> String {
    match figure {
        Figure::Value(v) => format_currency(*v),
        Figure::Unparsed(s) => s.clone(),
    }
}

/// `14.74%` for a whole-number percentage of `14.74`.
pub fn format_percent(figure: &Figure) -> String {
    match figure {
        Figure::Value(v) => format!("{v:.2}%"),
        Figure::Unparsed(s) => s.clone(),
    }
}

fn format_tax(rate: &TaxRate) -> String {
    match rate {
        TaxRate::Rate(v) => format_currency(*v),
        TaxRate::NotAvailable => "NA".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FieldValue, RawRecord};

    #[test]
    fn currency_grouping() {
        assert_eq!(format_currency(1500.0), "$ 1 , 500.00");
        assert_eq!(format_currency(0.0), "$ 0.00");
        assert_eq!(format_currency(999.999), "$ 1 , 000.00");
        assert_eq!(format_currency(76_273_957.85), "$ 76 , 273 , 957.85");
        assert_eq!(format_currency(-1234.5), "$ -1 , 234.50");
        assert_eq!(format_currency(-0.001), "$ 0.00");
    }

    #[test]
    fn names_are_normalised() {
        assert_eq!(normalise_name("  jane   q\tdoe "), "JANE Q DOE");
        assert_eq!(normalise_name("ab 12  34"), "AB 12 34");
    }

    #[test]
    fn percent_formatting() {
        assert_eq!(format_percent(&Figure::Value(14.74)), "14.74%");
        assert_eq!(format_percent(&Figure::Value(5.0)), "5.00%");
        assert_eq!(format_percent(&Figure::Unparsed("N/A".into())), "N/A");
    }

    #[test]
    fn renders_full_row() {
        let raw = RawRecord::new()
            .with_text(Field::CustomerReferenceNumber, "ab 123")
            .with_text(Field::CustomerName, "jane  doe")
            .with_text(Field::CityState, "Austin, TX")
            .with(Field::PurchaseValue, FieldValue::Number(300_000.0))
            .with(Field::DownPayment, FieldValue::Number(20.0))
            .with(Field::LoanPeriod, FieldValue::Number(30.0))
            .with(Field::AnnualInterest, FieldValue::Number(5.0))
            .with_text(Field::GuarantorName, "john smith")
            .with_text(Field::GuarantorReferenceNumber, "g 9")
            .with(Field::PurchaseValueReduction, FieldValue::Number(10.0))
            .with(Field::MonthlyPrincipalReduction, FieldValue::Number(50.0))
            .with(Field::TotalInterestReduction, FieldValue::Number(25.0));
        let record = CompleteRecord::new(raw);
        let inputs = NumericInputs::from_record(&record);
        let figures = LoanFigures::compute(&inputs);

        let row = FormattedRow::render(&record, &inputs, &figures, &TaxRate::NotAvailable, "X");

        assert_eq!(row.customer_reference_number, "AB 123");
        assert_eq!(row.customer_name, "JANE DOE");
        assert_eq!(row.city_state, "AUSTIN ,  TX");
        assert_eq!(row.purchase_value_and_down_payment, "$ 270 , 000.00 AND 20 %");
        assert_eq!(row.loan_period_and_annual_interest, "30 YEARS AND 5.00%");
        assert_eq!(row.guarantor_name, "JOHN SMITH");
        assert_eq!(row.loan_amount_and_principal, "$ 216 , 000.00 AND $ 300.00");
        assert_eq!(row.total_interest_and_property_tax, "$ 243 , 000.00 AND NA");
        assert_eq!(row.property_insurance_and_pmi, "X");
        assert_eq!(row.cells().len(), COLUMNS.len());
    }

    #[test]
    fn missing_fields_render_empty() {
        let record = CompleteRecord::new(RawRecord::new());
        let inputs = NumericInputs::from_record(&record);
        let figures = LoanFigures::compute(&inputs);
        let row = FormattedRow::render(&record, &inputs, &figures, &TaxRate::Rate(1.0), "");
        assert_eq!(row.customer_name, "");
        assert_eq!(row.purchase_value_and_down_payment, "$ 0.00 AND 0 %");
        assert_eq!(row.total_interest_and_property_tax, "$ 0.00 AND $ 1.00");
    }

    #[test]
    fn city_and_state_from_record() {
        let record = CompleteRecord::new(RawRecord::new().with_text(Field::CityState, "DeFoor, GA"));
        assert_eq!(city_and_state(&record), ("DeFoor".into(), "GA".into()));
    }
}
