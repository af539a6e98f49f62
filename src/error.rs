//! Error types for the mortgage-extract library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ExtractError`] — **Fatal**: the run cannot proceed at all (input
//!   folder missing, no API credential, report cannot be written). Returned
//!   as `Err(ExtractError)` from the top-level `process*` functions.
//!
//! * [`ImageError`] — **Non-fatal**: a single image failed (unreadable file,
//!   HTTP error from the OCR service) but the rest of the run is fine. Stored
//!   inside [`crate::output::ImageResult`] so callers can inspect partial
//!   success rather than losing the whole batch to one bad scan.
//!
//! A failed image contributes no records and leaves the cross-image carry
//! untouched, so a record split across a failed page still merges with
//! whatever comes next.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the mortgage-extract library.
///
/// Image-level failures use [`ImageError`] and are stored in
/// [`crate::output::ImageResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input folder was not found at the given path.
    #[error("Input folder not found: '{path}'\nCheck the path exists and is readable.")]
    InputFolderNotFound { path: PathBuf },

    /// The input path exists but is a file.
    #[error("Input path is not a directory: '{path}'")]
    NotADirectory { path: PathBuf },

    /// The folder listing could not be read.
    #[error("Failed to read input folder '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── OCR service errors ────────────────────────────────────────────────
    /// No API key was configured and the environment variable is unset.
    #[error("No API key for the OCR service.\nSet {env_var} or pass an explicit key.")]
    MissingCredential { env_var: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the report file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The spreadsheet writer rejected the workbook.
    #[error("Failed to build spreadsheet '{path}': {detail}")]
    SpreadsheetFailed { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single image.
///
/// The run continues; the image simply contributes no records.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum ImageError {
    /// The file could not be read from disk.
    #[error("{file}: read failed: {detail}")]
    ReadFailed { file: String, detail: String },

    /// The bytes are not a PNG or JPEG image.
    #[error("{file}: not a supported image ({detail})")]
    NotAnImage { file: String, detail: String },

    /// Transport failure talking to the OCR service.
    #[error("{file}: OCR request failed: {detail}")]
    RequestFailed { file: String, detail: String },

    /// The OCR service answered with a non-success status.
    #[error("{file}: OCR service returned HTTP {status}: {body}")]
    HttpStatus {
        file: String,
        status: u16,
        body: String,
    },

    /// The OCR call exceeded the configured timeout.
    #[error("{file}: OCR call timed out after {secs}s")]
    Timeout { file: String, secs: u64 },

    /// The response body was not JSON.
    #[error("{file}: invalid OCR response: {detail}")]
    InvalidResponse { file: String, detail: String },
}

impl ImageError {
    /// Name of the image the error belongs to.
    pub fn file(&self) -> &str {
        match self {
            ImageError::ReadFailed { file, .. }
            | ImageError::NotAnImage { file, .. }
            | ImageError::RequestFailed { file, .. }
            | ImageError::HttpStatus { file, .. }
            | ImageError::Timeout { file, .. }
            | ImageError::InvalidResponse { file, .. } => file,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_names_env_var() {
        let e = ExtractError::MissingCredential {
            env_var: "AZURE_API_KEY".into(),
        };
        assert!(e.to_string().contains("AZURE_API_KEY"));
    }

    #[test]
    fn http_status_display() {
        let e = ImageError::HttpStatus {
            file: "page_01.png".into(),
            status: 429,
            body: "slow down".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("page_01.png"), "got: {msg}");
        assert!(msg.contains("429"));
        assert_eq!(e.file(), "page_01.png");
    }

    #[test]
    fn timeout_display() {
        let e = ImageError::Timeout {
            file: "a.jpg".into(),
            secs: 60,
        };
        assert!(e.to_string().contains("60s"));
    }

    #[test]
    fn image_error_serialises() {
        let e = ImageError::NotAnImage {
            file: "notes.png".into(),
            detail: "unknown format".into(),
        };
        let json = serde_json::to_string(&e).unwrap();
        let back: ImageError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
    }
}
