//! Result types returned by the `process*` entry points.

use crate::error::ImageError;
use crate::pipeline::calculate::LoanFigures;
use crate::pipeline::format::FormattedRow;
use crate::record::CompleteRecord;
use serde::Serialize;
use std::path::PathBuf;

/// Outcome of one image. Never an `Err`: failures are stored in `error`.
#[derive(Debug, Clone, Serialize)]
pub struct ImageResult {
    /// 1-indexed position in sorted order.
    pub index: usize,
    pub file_name: String,
    /// Raw records the service reported, before reconciliation.
    pub records_found: usize,
    pub duration_ms: u64,
    pub error: Option<ImageError>,
}

/// A finished record with everything derived from it.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedRecord {
    pub record: CompleteRecord,
    pub figures: LoanFigures,
    pub row: FormattedRow,
}

/// Counters for a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    pub total_images: usize,
    pub processed_images: usize,
    pub failed_images: usize,
    pub records: usize,
    /// Records emitted while still missing fields.
    pub incomplete_records: usize,
    pub total_duration_ms: u64,
    pub ocr_duration_ms: u64,
    /// Report written by `process_to_file`, if any.
    pub output_path: Option<PathBuf>,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    /// In output order: file name order, then position within the page.
    pub records: Vec<ExtractedRecord>,
    pub images: Vec<ImageResult>,
    pub stats: RunStats,
}

impl RunOutput {
    /// Formatted rows in output order.
    pub fn rows(&self) -> Vec<FormattedRow> {
        self.records.iter().map(|r| r.row.clone()).collect()
    }

    /// Image failures, in image order.
    pub fn errors(&self) -> impl Iterator<Item = &ImageError> {
        self.images.iter().filter_map(|i| i.error.as_ref())
    }
}
