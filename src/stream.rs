//! Streaming extraction API: emit records as soon as they are final.
//!
//! ## Why stream?
//!
//! With a two-second pause between calls, a folder of a few hundred scans
//! takes many minutes. A stream lets callers show or persist each record the
//! moment reconciliation lets go of it instead of waiting for the batch.
//!
//! Unlike the eager [`crate::process::process_folder`], [`process_stream`]
//! yields `CompleteRecord` items in output order. Image failures are yielded
//! in place as `Err(ImageError)` and the stream carries on. The record
//! carried across the last image is emitted just before the stream ends.

use crate::config::ExtractionConfig;
use crate::error::{ExtractError, ImageError};
use crate::pipeline::ocr::DocumentAiClient;
use crate::pipeline::{input, reconcile};
use crate::process::{pace, resolve_client, run_image};
use crate::record::{CompleteRecord, PartialRecord};
use crate::schema::annotation_schema;
use futures::stream;
use serde_json::Value;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::{debug, info};

/// A boxed stream of reconciled records.
pub type RecordStream = Pin<Box<dyn Stream<Item = Result<CompleteRecord, ImageError>> + Send>>;

/// Extract records from `input_dir`, streaming them as they are finalised.
///
/// # Returns
/// - `Ok(RecordStream)` — a stream of `Result<CompleteRecord, ImageError>`
/// - `Err(ExtractError)` — fatal error (folder missing, no credential)
///
/// # Example
/// ```rust,no_run
/// use mortgage_extract::{process_stream, ExtractionConfig};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ExtractionConfig::default();
/// let mut records = process_stream("scans/", &config).await?;
/// while let Some(item) = records.next().await {
///     match item {
///         Ok(r) => println!("{:?}", r.text(mortgage_extract::Field::CustomerName)),
///         Err(e) => eprintln!("skipped: {e}"),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub async fn process_stream(
    input_dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<RecordStream, ExtractError> {
    let input_dir = input_dir.as_ref();
    info!("Starting streaming extraction: {}", input_dir.display());

    let images = input::scan_folder(input_dir)?;
    let client = resolve_client(config)?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(images.len());
    }

    let state = StreamState {
        total: images.len(),
        images: images.into_iter().enumerate().collect(),
        client,
        schema: annotation_schema(config.field_mode),
        config: config.clone(),
        carry: None,
        pending: VecDeque::new(),
        paced: false,
        succeeded: 0,
        finished: false,
    };

    let s = stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                return Some((item, st));
            }
            if st.finished {
                return None;
            }
            st.advance().await;
        }
    });

    Ok(Box::pin(s))
}

struct StreamState {
    total: usize,
    images: VecDeque<(usize, PathBuf)>,
    client: Arc<dyn DocumentAiClient>,
    schema: Value,
    config: ExtractionConfig,
    carry: Option<PartialRecord>,
    pending: VecDeque<Result<CompleteRecord, ImageError>>,
    /// The previous image succeeded; pause before the next call.
    paced: bool,
    succeeded: usize,
    finished: bool,
}

impl StreamState {
    /// Process the next image, or flush the carry when none are left.
    async fn advance(&mut self) {
        let Some((i, path)) = self.images.pop_front() else {
            if let Some(last) = reconcile::flush(self.carry.take()) {
                debug!("Flushing final carried record");
                self.pending.push_back(Ok(last));
            }
            if let Some(ref cb) = self.config.progress_callback {
                cb.on_run_complete(self.total, self.succeeded);
            }
            self.finished = true;
            return;
        };

        if self.paced {
            pace(&self.config).await;
        }

        let (result, records) = run_image(
            &self.client,
            i + 1,
            self.total,
            &path,
            &self.schema,
            &self.config,
        )
        .await;

        match result.error {
            Some(e) => {
                self.paced = false;
                self.pending.push_back(Err(e));
            }
            None => {
                self.paced = true;
                self.succeeded += 1;
                let step = reconcile::reconcile(self.carry.take(), records);
                self.pending.extend(step.complete.into_iter().map(Ok));
                self.carry = step.carry;
            }
        }
    }
}
