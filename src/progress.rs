//! Progress-callback trait for per-image extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the run works through the input folder.
//!
//! # Example
//!
//! ```rust
//! use mortgage_extract::{ExtractionConfig, ExtractionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct RecordCounter {
//!     records: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for RecordCounter {
//!     fn on_image_complete(&self, index: usize, total: usize, file_name: &str, records: usize) {
//!         self.records.fetch_add(records, Ordering::SeqCst);
//!         eprintln!("[{}/{}] {}: {} records", index, total, file_name, records);
//!     }
//! }
//!
//! let counter = Arc::new(RecordCounter { records: AtomicUsize::new(0) });
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the orchestrator as it processes each image.
///
/// Images are processed one at a time, so calls never overlap, but the
/// trait is `Send + Sync` because the run itself may be driven from any
/// tokio worker. All methods default to no-ops.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once after the folder scan, before the first OCR call.
    fn on_run_start(&self, total_images: usize) {
        let _ = total_images;
    }

    /// Called just before an image is read and sent to the service.
    ///
    /// # Arguments
    /// * `index`     — 1-indexed position in sorted order
    /// * `total`     — images in the run
    /// * `file_name` — the image's file name
    fn on_image_start(&self, index: usize, total: usize, file_name: &str) {
        let _ = (index, total, file_name);
    }

    /// Called when an image's records have been extracted and reconciled.
    ///
    /// `records` is the number of raw records the service reported for this
    /// image, before merging.
    fn on_image_complete(&self, index: usize, total: usize, file_name: &str, records: usize) {
        let _ = (index, total, file_name, records);
    }

    /// Called when an image is skipped because of an [`crate::ImageError`].
    fn on_image_error(&self, index: usize, total: usize, file_name: &str, error: &str) {
        let _ = (index, total, file_name, error);
    }

    /// Called once after every image has been attempted.
    fn on_run_complete(&self, total_images: usize, success_count: usize) {
        let _ = (total_images, success_count);
    }
}

/// A callback that ignores every event.
///
/// Leaving `progress_callback` unset has the same effect; this type is for
/// callers that must hand over a concrete value.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;
