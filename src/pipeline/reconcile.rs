//! Cross-page record reconciliation.
//!
//! A ledger page rarely ends on a record boundary: the last document on one
//! image is often finished at the top of the next. The OCR service sees each
//! image in isolation, so it reports the head and the tail as two separate
//! records. This module stitches them back together.
//!
//! ## Continuation signal
//!
//! A record without a customer reference number is taken to be the tail of
//! the record before it. The reference number is printed at the start of
//! every document, making it the most reliable "new record" marker OCR can
//! give us. Two genuinely separate records that both lack one are merged;
//! nothing in the page distinguishes that case.
//!
//! ## The carry
//!
//! After merging, the last record of an image may still be incomplete. It is
//! held back as a [`PartialRecord`] and placed in front of the next image's
//! records. [`reconcile`] takes the carry in and hands the new one back, so
//! the state lives with the caller rather than in this module:
//!
//! ```text
//! carry₀ = None
//! for image in images:
//!     (complete, carryₙ₊₁) = reconcile(carryₙ, extract(image))
//! emit carry_last.flush()
//! ```

use crate::record::{CompleteRecord, PartialRecord, RawRecord};
use tracing::debug;

/// Output of one [`reconcile`] step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciled {
    /// Records ready for formatting, in discovery order.
    pub complete: Vec<CompleteRecord>,
    /// Incomplete trailing record to feed into the next step.
    pub carry: Option<PartialRecord>,
}

/// Merge one image's records with the record carried from the previous image.
///
/// Continuation fragments are folded into the record before them (filling
/// only empty fields), and a trailing record that is still incomplete becomes
/// the new carry. Never fails; ambiguous input is passed through as
/// independent records.
pub fn reconcile(carry: Option<PartialRecord>, records: Vec<RawRecord>) -> Reconciled {
    let incoming = records.len();
    let sequence = carry.map(PartialRecord::into_raw).into_iter().chain(records);

    let mut merged: Vec<RawRecord> = Vec::with_capacity(incoming + 1);
    for record in sequence {
        match merged.last_mut() {
            Some(previous) if !record.has_reference() => previous.merge_from(&record),
            _ => merged.push(record),
        }
    }

    let carry = match merged.last() {
        Some(last) if !last.is_complete() => merged.pop().map(PartialRecord::new),
        _ => None,
    };

    debug!(
        "reconciled {} incoming records into {} complete, carry={}",
        incoming,
        merged.len(),
        carry.is_some()
    );

    Reconciled {
        complete: merged.into_iter().map(CompleteRecord::new).collect(),
        carry,
    }
}

/// End-of-run: emit the final carry, complete or not.
pub fn flush(carry: Option<PartialRecord>) -> Option<CompleteRecord> {
    carry.map(PartialRecord::flush)
}
