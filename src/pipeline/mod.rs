//! Pipeline stages for mortgage-document extraction.
//!
//! Each submodule implements exactly one transformation step. Only [`ocr`]
//! and [`tax`] touch the network and only [`input`] and [`report`] touch the
//! filesystem; everything between is pure and tested without either.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ encode ──▶ ocr ──▶ extract ──▶ reconcile ──▶ calculate ──▶ format ──▶ report
//! (scan)   (base64)   (HTTP)   (JSON)      (carry)       (figures)    (+ tax)     (xlsx/txt)
//! ```
//!
//! 1. [`input`]     — list `.png/.jpg/.jpeg` files in file-name order
//! 2. [`encode`]    — sniff the image format and base64-wrap the bytes
//! 3. [`ocr`]       — one schema-annotated document-AI call per image
//! 4. [`extract`]   — normalise the annotation JSON into raw records
//! 5. [`reconcile`] — merge continuation fragments across image boundaries
//! 6. [`calculate`] — read amounts (via [`words`]) and derive loan figures
//! 7. [`format`]    — render report cells; [`tax`] supplies the property tax
//! 8. [`report`]    — write the spreadsheet or text file atomically

pub mod calculate;
pub mod encode;
pub mod extract;
pub mod format;
pub mod input;
pub mod ocr;
pub mod reconcile;
pub mod report;
pub mod tax;
pub mod words;
