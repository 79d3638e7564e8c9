//! Span parsing.
//!
//! Turns raw log records into [`ParsedSpan`]s. A record whose body cannot be
//! decoded yields a [`SpanParseError`] for that record only; callers keep
//! going with the rest of the batch.

use crate::models::{RawLogRecord, Span};
use serde_json::Value;
use thiserror::Error;

/// Maximum number of characters of an unparsable body kept for display.
pub const RAW_PREVIEW_CHARS: usize = 500;

/// Errors that can occur while parsing a single record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpanParseError {
    /// The record body is not valid JSON.
    #[error("Invalid span JSON: {reason}")]
    InvalidJson {
        /// Decoder message.
        reason: String,
        /// The first characters of the body.
        raw: String,
    },

    /// The record body is valid JSON but not an object.
    #[error("Span payload is not a JSON object")]
    NotAnObject {
        /// The first characters of the body.
        raw: String,
    },
}

impl SpanParseError {
    /// Returns the truncated raw body the error was produced from.
    #[must_use]
    pub fn raw_preview(&self) -> &str {
        match self {
            Self::InvalidJson { raw, .. } | Self::NotAnObject { raw } => raw,
        }
    }
}

/// A successfully parsed record.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSpan {
    /// The record's `@timestamp`, as the service formatted it.
    pub timestamp: Option<String>,
    /// The normalized span.
    pub span: Span,
    /// The decoded body, unmodified. This is what gets exported.
    pub payload: Value,
}

/// Outcome of parsing one record.
pub type ParseResult = Result<ParsedSpan, SpanParseError>;

/// Parses one raw record.
///
/// A record without `@message` is treated as an empty object.
///
/// # Errors
///
/// Returns a [`SpanParseError`] if the body is not a JSON object.
///
/// # Example
///
/// ```
/// use shared::models::RawLogRecord;
/// use shared::parse::parse_record;
///
/// let record = RawLogRecord::from_message(
///     "2024-01-01 00:00:00.000",
///     r#"{"traceId":"t1","spanId":"s1","name":"checkout"}"#,
/// );
///
/// let parsed = parse_record(&record).unwrap();
/// assert_eq!(parsed.span.name, "checkout");
///
/// let broken = RawLogRecord::from_message("2024-01-01 00:00:00.000", "{not json");
/// assert_eq!(parse_record(&broken).unwrap_err().raw_preview(), "{not json");
/// ```
pub fn parse_record(record: &RawLogRecord) -> ParseResult {
    let raw = record.message().unwrap_or("{}");

    let payload: Value = serde_json::from_str(raw).map_err(|e| SpanParseError::InvalidJson {
        reason: e.to_string(),
        raw: truncate_chars(raw, RAW_PREVIEW_CHARS).to_string(),
    })?;

    let span = Span::from_payload(&payload).ok_or_else(|| SpanParseError::NotAnObject {
        raw: truncate_chars(raw, RAW_PREVIEW_CHARS).to_string(),
    })?;

    Ok(ParsedSpan {
        timestamp: record.timestamp().map(str::to_string),
        span,
        payload,
    })
}

/// Parses every record, keeping input order and one outcome per record.
#[must_use]
pub fn parse_records(records: &[RawLogRecord]) -> Vec<ParseResult> {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let result = parse_record(record);
            if let Err(ref e) = result {
                tracing::warn!(record = i + 1, error = %e, "Skipping unparsable span record");
            }
            result
        })
        .collect()
}

/// Returns at most the first `max` characters of `text`.
#[must_use]
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
