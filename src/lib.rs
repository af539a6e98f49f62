//! # mortgage-extract
//!
//! Extract mortgage-document records from scanned page images using a
//! document-AI OCR service, and compute the loan figures for each.
//!
//! ## Why this crate?
//!
//! Mortgage ledgers are scanned a page at a time, and a record often starts
//! at the bottom of one page and finishes at the top of the next. The OCR
//! service sees each image alone and reports the two halves as separate
//! records. This crate stitches them back together, reads amounts that were
//! typed out in words ("FOURTEEN POINT SEVENTY FOUR"), and produces one
//! report row per mortgage.
//!
//! ## Pipeline Overview
//!
//! ```text
//! folder of .png / .jpg
//!  │
//!  ├─ 1. Input      list images, sorted by file name
//!  ├─ 2. Encode     bytes → base64 data URL
//!  ├─ 3. OCR        one schema-annotated call per image (sequential, paced)
//!  ├─ 4. Extract    annotation JSON → raw records
//!  ├─ 5. Reconcile  merge fragments, carry the trailing partial forward
//!  ├─ 6. Calculate  loan amount, principal, interest
//!  ├─ 7. Format     currency / percent / name rendering, property tax
//!  └─ 8. Report     output.xlsx or output.txt
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mortgage_extract::{process_to_file, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key read from AZURE_API_KEY
//!     let config = ExtractionConfig::default();
//!     let stats = process_to_file("scans/", "reports/", &config).await?;
//!     eprintln!("{} records from {}/{} images",
//!         stats.records, stats.processed_images, stats.total_images);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `mortgage-extract` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! mortgage-extract = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod progress;
pub mod record;
pub mod schema;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder, FieldMode, OutputFormat};
pub use error::{ExtractError, ImageError};
pub use output::{ExtractedRecord, ImageResult, RunOutput, RunStats};
pub use pipeline::calculate::{Figure, LoanFigures, NumericInputs};
pub use pipeline::encode::EncodedImage;
pub use pipeline::format::FormattedRow;
pub use pipeline::ocr::{DocumentAiClient, MistralOcrClient};
pub use pipeline::tax::{FixedTaxLookup, PropertyTaxLookup, TaxRate, WikipediaTaxLookup};
pub use pipeline::words::PhraseValue;
pub use process::{process_folder, process_sync, process_to_file};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use record::{CompleteRecord, Field, FieldValue, PartialRecord, RawRecord};
pub use schema::annotation_schema;
pub use stream::{process_stream, RecordStream};
