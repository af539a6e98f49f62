//! Eager (whole-folder) extraction entry points.
//!
//! ## Why eager vs. streaming?
//!
//! This module provides the simpler API: process every image, then return.
//! It collects every record into memory before returning. Use
//! [`crate::stream::process_stream`] instead when you want records as soon
//! as they are final, for example to show them while a long batch runs.
//!
//! ## Why sequential?
//!
//! A record cut off at the bottom of one image is finished at the top of the
//! next, so image N+1 cannot be reconciled before image N is done. The
//! carried [`PartialRecord`] is a plain local threaded through the loop.

use crate::config::ExtractionConfig;
use crate::error::{ExtractError, ImageError};
use crate::output::{ExtractedRecord, ImageResult, RunOutput, RunStats};
use crate::pipeline::calculate::{LoanFigures, NumericInputs};
use crate::pipeline::format::{city_and_state, FormattedRow};
use crate::pipeline::ocr::{DocumentAiClient, MistralOcrClient};
use crate::pipeline::tax::{PropertyTaxLookup, WikipediaTaxLookup};
use crate::pipeline::{encode, extract, input, reconcile, report};
use crate::record::{CompleteRecord, PartialRecord, RawRecord};
use crate::schema::annotation_schema;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Extract every record from the images in `input_dir`.
///
/// # Returns
/// `Ok(RunOutput)` even if some images failed (check `output.images` or
/// `output.stats.failed_images`), and even if no records were found.
///
/// # Errors
/// Returns `Err(ExtractError)` only for fatal errors, checked in this order:
/// - Input folder missing or not a directory
/// - No OCR client and no API key
pub async fn process_folder(
    input_dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<RunOutput, ExtractError> {
    let total_start = Instant::now();
    let input_dir = input_dir.as_ref();
    info!("Starting extraction: {}", input_dir.display());

    // ── Step 1: Scan input folder ────────────────────────────────────────
    let images = input::scan_folder(input_dir)?;
    let total = images.len();
    info!("Found {} images", total);

    // ── Step 2: Resolve collaborators ────────────────────────────────────
    let client = resolve_client(config)?;
    let tax_lookup = resolve_tax_lookup(config)?;
    let schema = annotation_schema(config.field_mode);

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(total);
    }

    // ── Step 3: OCR + reconcile, one image at a time ─────────────────────
    let ocr_start = Instant::now();
    let mut carry: Option<PartialRecord> = None;
    let mut complete: Vec<CompleteRecord> = Vec::new();
    let mut results: Vec<ImageResult> = Vec::with_capacity(total);

    for (i, path) in images.iter().enumerate() {
        let (result, records) = run_image(&client, i + 1, total, path, &schema, config).await;

        if result.error.is_none() {
            let step = reconcile::reconcile(carry.take(), records);
            complete.extend(step.complete);
            carry = step.carry;
        }
        let succeeded = result.error.is_none();
        results.push(result);

        if succeeded {
            pace(config).await;
        }
    }
    let ocr_duration_ms = ocr_start.elapsed().as_millis() as u64;

    // ── Step 4: Flush the final carry ────────────────────────────────────
    if let Some(last) = reconcile::flush(carry) {
        debug!("Flushing final carried record");
        complete.push(last);
    }

    // ── Step 5: Calculate, look up tax, format ───────────────────────────
    let mut records = Vec::with_capacity(complete.len());
    for record in complete {
        records.push(finish_record(record, tax_lookup.as_ref(), config).await);
    }

    // ── Step 6: Stats ────────────────────────────────────────────────────
    let processed = results.iter().filter(|r| r.error.is_none()).count();
    let stats = RunStats {
        total_images: total,
        processed_images: processed,
        failed_images: total - processed,
        records: records.len(),
        incomplete_records: records
            .iter()
            .filter(|r| !r.record.is_complete())
            .count(),
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        ocr_duration_ms,
        output_path: None,
    };

    info!(
        "Extraction complete: {}/{} images, {} records, {}ms total",
        processed, total, stats.records, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(total, processed);
    }

    Ok(RunOutput {
        records,
        images: results,
        stats,
    })
}

/// Extract records and write the report into `output_dir`.
///
/// Writes `output.xlsx` or `output.txt` depending on
/// [`ExtractionConfig::output_format`]. When no records were found nothing
/// is written and `stats.output_path` is `None`.
pub async fn process_to_file(
    input_dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<RunStats, ExtractError> {
    let output = process_folder(input_dir, config).await?;
    let mut stats = output.stats.clone();

    if output.records.is_empty() {
        warn!("Could not process the data: no records extracted, nothing written");
        return Ok(stats);
    }

    let rows = output.rows();
    let output_dir = output_dir.as_ref().to_path_buf();
    let format = config.output_format;
    let path = tokio::task::spawn_blocking(move || report::write_report(&rows, &output_dir, format))
        .await
        .map_err(|e| ExtractError::Internal(format!("report writer task failed: {e}")))??;

    info!("Report written to {}", path.display());
    stats.output_path = Some(path);
    Ok(stats)
}

/// Synchronous wrapper around [`process_folder`].
///
/// Creates a temporary tokio runtime internally.
pub fn process_sync(
    input_dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<RunOutput, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(process_folder(input_dir, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Resolve the OCR client, from most-specific to least-specific:
///
/// 1. **Pre-built client** (`config.client`), used as-is.
/// 2. **Explicit key** (`config.api_key`).
/// 3. **Environment** (the variable named by `config.api_key_env`).
pub(crate) fn resolve_client(
    config: &ExtractionConfig,
) -> Result<Arc<dyn DocumentAiClient>, ExtractError> {
    if let Some(ref client) = config.client {
        return Ok(Arc::clone(client));
    }

    let api_key = config
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .or_else(|| {
            std::env::var(&config.api_key_env)
                .ok()
                .filter(|k| !k.trim().is_empty())
        })
        .ok_or_else(|| ExtractError::MissingCredential {
            env_var: config.api_key_env.clone(),
        })?;

    let client = MistralOcrClient::new(
        &config.endpoint,
        &config.model,
        api_key,
        config.api_timeout_secs,
    )
    .map_err(|e| ExtractError::Internal(format!("Failed to build HTTP client: {e}")))?;
    Ok(Arc::new(client))
}

pub(crate) fn resolve_tax_lookup(
    config: &ExtractionConfig,
) -> Result<Arc<dyn PropertyTaxLookup>, ExtractError> {
    if let Some(ref lookup) = config.tax_lookup {
        return Ok(Arc::clone(lookup));
    }
    let lookup = WikipediaTaxLookup::new(config.api_timeout_secs)
        .map_err(|e| ExtractError::Internal(format!("Failed to build HTTP client: {e}")))?;
    Ok(Arc::new(lookup))
}

/// Run one image through read → encode → OCR → extract, firing progress
/// events around it.
///
/// Always returns an `ImageResult`; a failure leaves the record list empty
/// so one bad scan doesn't abort the batch.
pub(crate) async fn run_image(
    client: &Arc<dyn DocumentAiClient>,
    index: usize,
    total: usize,
    path: &Path,
    schema: &Value,
    config: &ExtractionConfig,
) -> (ImageResult, Vec<RawRecord>) {
    let start = Instant::now();
    let file_name = input::file_name(path);
    info!("[{}/{}] Processing {}", index, total, file_name);

    if let Some(ref cb) = config.progress_callback {
        cb.on_image_start(index, total, &file_name);
    }

    let outcome = annotate_image(client, &file_name, path, schema).await;
    let duration_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(records) => {
            debug!("{}: {} records in {}ms", file_name, records.len(), duration_ms);
            if let Some(ref cb) = config.progress_callback {
                cb.on_image_complete(index, total, &file_name, records.len());
            }
            let result = ImageResult {
                index,
                file_name,
                records_found: records.len(),
                duration_ms,
                error: None,
            };
            (result, records)
        }
        Err(e) => {
            warn!("Skipping {}: {}", file_name, e);
            if let Some(ref cb) = config.progress_callback {
                cb.on_image_error(index, total, &file_name, &e.to_string());
            }
            let result = ImageResult {
                index,
                file_name,
                records_found: 0,
                duration_ms,
                error: Some(e),
            };
            (result, Vec::new())
        }
    }
}

async fn annotate_image(
    client: &Arc<dyn DocumentAiClient>,
    file_name: &str,
    path: &Path,
    schema: &Value,
) -> Result<Vec<RawRecord>, ImageError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ImageError::ReadFailed {
            file: file_name.to_string(),
            detail: e.to_string(),
        })?;
    let image = encode::encode_image(file_name, &bytes)?;
    let response = client.annotate(&image, schema).await?;
    Ok(extract::extract_records(&response))
}

/// Calculate, look up the property tax, and format one record.
pub(crate) async fn finish_record(
    record: CompleteRecord,
    tax_lookup: &dyn PropertyTaxLookup,
    config: &ExtractionConfig,
) -> ExtractedRecord {
    let inputs = NumericInputs::from_record(&record);
    let figures = LoanFigures::compute(&inputs);
    let (city, state) = city_and_state(&record);
    let tax = tax_lookup.lookup(&city, &state).await;
    let row = FormattedRow::render(&record, &inputs, &figures, &tax, &config.insurance_and_pmi);
    ExtractedRecord {
        record,
        figures,
        row,
    }
}

/// Fixed delay after a successful OCR call.
pub(crate) async fn pace(config: &ExtractionConfig) {
    if config.pacing_ms > 0 {
        tokio::time::sleep(Duration::from_millis(config.pacing_ms)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::tax::{FixedTaxLookup, TaxRate};
    use crate::record::{Field, FieldValue};

    #[test]
    fn explicit_key_beats_env() {
        let config = ExtractionConfig::builder()
            .api_key("k")
            .api_key_env("MORTGAGE_EXTRACT_TEST_UNSET_VAR")
            .build()
            .unwrap();
        assert!(resolve_client(&config).is_ok());
    }

    #[test]
    fn missing_key_is_fatal() {
        let config = ExtractionConfig::builder()
            .api_key_env("MORTGAGE_EXTRACT_TEST_UNSET_VAR")
            .build()
            .unwrap();
        match resolve_client(&config) {
            Err(ExtractError::MissingCredential { env_var }) => {
                assert_eq!(env_var, "MORTGAGE_EXTRACT_TEST_UNSET_VAR")
            }
            other => panic!("expected MissingCredential, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn finish_record_uses_tax_lookup() {
        let raw = RawRecord::new()
            .with_text(Field::CityState, "Austin, TX")
            .with(Field::PurchaseValue, FieldValue::Number(1000.0));
        let config = ExtractionConfig::default();
        let lookup = FixedTaxLookup(TaxRate::Rate(2.5));
        let done = finish_record(CompleteRecord::new(raw), &lookup, &config).await;
        assert!(done.row.total_interest_and_property_tax.ends_with("AND $ 2.50"));
        assert_eq!(done.row.purchase_value_and_down_payment, "$ 1 , 000.00 AND 0 %");
    }
}
