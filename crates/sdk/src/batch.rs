//! Decoding of batch-scan responses.
//!
//! The service streams one JSON object per scanned URL, separated by `\n`,
//! with no enclosing array. Each object is either a full [`ScanResponse`] or a
//! `{ url, error }` record for a URL that could not be scanned.
//!
//! Per-item failures are not call failures. [`decode_batch`] drops them and
//! returns only the successes; [`decode_batch_report`] keeps them so callers
//! can detect a partially failed batch. A line that is not valid JSON fails
//! the whole decode in both cases.

use serde_json::Value;
use tracing::debug;

use crate::{BatchItemFailure, ClientError, ScanResponse};

/// Successes and per-item failures of one batch, each in input order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchReport {
    pub successes: Vec<ScanResponse>,
    pub failures: Vec<BatchItemFailure>,
}

impl BatchReport {
    /// Returns `true` if any item failed.
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

enum BatchItem {
    Success(ScanResponse),
    Failure(BatchItemFailure),
}

/// Decodes a batch body into its successful scans, dropping per-item
/// failures.
///
/// # Errors
///
/// [`ClientError::DecodeFailure`] if any non-empty line is not valid JSON or
/// a success line lacks required [`ScanResponse`] fields.
pub fn decode_batch(body: &str) -> Result<Vec<ScanResponse>, ClientError> {
    let mut successes = Vec::new();
    for item in items(body) {
        match item? {
            BatchItem::Success(scan) => successes.push(scan),
            BatchItem::Failure(failure) => {
                debug!(url = %failure.url, error = %failure.error, "Dropping failed batch item");
            }
        }
    }
    Ok(successes)
}

/// Decodes a batch body, keeping per-item failures alongside the successes.
///
/// # Errors
///
/// Same as [`decode_batch`].
pub fn decode_batch_report(body: &str) -> Result<BatchReport, ClientError> {
    let mut report = BatchReport::default();
    for item in items(body) {
        match item? {
            BatchItem::Success(scan) => report.successes.push(scan),
            BatchItem::Failure(failure) => report.failures.push(failure),
        }
    }
    Ok(report)
}

fn items(body: &str) -> impl Iterator<Item = Result<BatchItem, ClientError>> + '_ {
    body.trim()
        .split('\n')
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| classify(index + 1, line))
}

fn classify(line_number: usize, line: &str) -> Result<BatchItem, ClientError> {
    let context = || format!("batch line {line_number}");
    let value: Value = serde_json::from_str(line).map_err(|e| ClientError::decode(context(), e))?;

    if let Some(error) = item_error(&value) {
        let url = value
            .get("url")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Ok(BatchItem::Failure(BatchItemFailure { url, error }));
    }

    serde_json::from_value(value)
        .map(BatchItem::Success)
        .map_err(|e| ClientError::decode(context(), e))
}

/// Returns the item's error text when the `error` member is present and
/// non-empty (`null`, `""` and `false` count as absent).
fn item_error(value: &Value) -> Option<String> {
    match value.get("error")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}
