//! Report writers: spreadsheet and comma-joined text.
//!
//! Both writers go through a temp file in the destination folder that is
//! renamed into place once fully written, so an interrupted run never
//! leaves a truncated `output.xlsx` behind.

use crate::config::OutputFormat;
use crate::error::ExtractError;
use crate::pipeline::format::{FormattedRow, COLUMNS};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Write `rows` into `output_dir` in the given format and return the path.
///
/// The folder is created if missing.
pub fn write_report(
    rows: &[FormattedRow],
    output_dir: &Path,
    format: OutputFormat,
) -> Result<PathBuf, ExtractError> {
    let path = output_dir.join(format.file_name());
    let io_error = |source| ExtractError::OutputWriteFailed {
        path: path.clone(),
        source,
    };

    std::fs::create_dir_all(output_dir).map_err(io_error)?;
    let mut tmp = NamedTempFile::new_in(output_dir).map_err(io_error)?;

    match format {
        OutputFormat::Xlsx => {
            let bytes = xlsx_bytes(rows).map_err(|e| ExtractError::SpreadsheetFailed {
                path: path.clone(),
                detail: e.to_string(),
            })?;
            tmp.write_all(&bytes).map_err(io_error)?;
        }
        OutputFormat::Text => {
            tmp.write_all(text_report(rows).as_bytes()).map_err(io_error)?;
        }
    }

    tmp.persist(&path).map_err(|e| io_error(e.error))?;
    debug!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(path)
}

/// One header row in bold, then one row per record.
pub fn xlsx_bytes(rows: &[FormattedRow]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();

    for (col, title) in COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *title, &bold)?;
    }
    for (i, row) in rows.iter().enumerate() {
        let r = i as u32 + 1;
        for (col, cell) in row.cells().iter().enumerate() {
            worksheet.write_string(r, col as u16, *cell)?;
        }
    }
    worksheet.autofit();

    workbook.save_to_buffer()
}

/// Header line, then one line per record, cells joined by `", "`.
pub fn text_report(rows: &[FormattedRow]) -> String {
    let mut out = COLUMNS.join(", ");
    out.push('\n');
    for row in rows {
        out.push_str(&row.cells().join(", "));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn row(name: &str) -> FormattedRow {
        FormattedRow {
            customer_reference_number: "R1".into(),
            customer_name: name.into(),
            city_state: "AUSTIN ,  TX".into(),
            purchase_value_and_down_payment: "$ 270 , 000.00 AND 20 %".into(),
            loan_period_and_annual_interest: "30 YEARS AND 5.00%".into(),
            guarantor_name: "JOHN SMITH".into(),
            guarantor_reference_number: "G9".into(),
            loan_amount_and_principal: "$ 216 , 000.00 AND $ 300.00".into(),
            total_interest_and_property_tax: "$ 243 , 000.00 AND NA".into(),
            property_insurance_and_pmi: "$ 76 , 273 , 957.85 AND NA".into(),
        }
    }

    #[test]
    fn text_report_has_header_and_rows() {
        let text = text_report(&[row("JANE DOE"), row("BOB")]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Customer Reference Number, Customer Name, City, State"));
        assert!(lines[1].starts_with("R1, JANE DOE, AUSTIN ,  TX, "));
        assert!(lines[2].contains("BOB"));
    }

    #[test]
    fn writes_text_file_creating_folder() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("reports").join("march");
        let path = write_report(&[row("A")], &out, OutputFormat::Text).unwrap();
        assert_eq!(path, out.join("output.txt"));
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn writes_xlsx_file() {
        let dir = TempDir::new().unwrap();
        let path = write_report(&[row("A")], dir.path(), OutputFormat::Xlsx).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        // xlsx is a zip container
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        write_report(&[row("A")], dir.path(), OutputFormat::Text).unwrap();
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
