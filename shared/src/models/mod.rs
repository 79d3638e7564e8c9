//! Data models for session span retrieval.
//!
//! This module contains the raw log records returned by the query service and
//! the normalized span structure reconstructed from them.

pub mod record;
pub mod span;

pub use record::{RawLogRecord, ResultField, MESSAGE_FIELD, TIMESTAMP_FIELD};
pub use span::{Span, SpanEvent, SpanKind, SpanLink, SpanStatus, StatusCode};
