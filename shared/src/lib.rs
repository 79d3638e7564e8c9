//! Sessiontrace Shared Library
//!
//! This crate retrieves the spans of one session from a log-query service,
//! rebuilds structured spans from the log text, prints a report and writes a
//! JSON export.
//!
//! # Modules
//!
//! - [`models`] - Raw log records and the normalized span model
//! - [`parse`] - Record to span parsing
//! - [`query`] - Query construction and query lifecycle types
//! - [`client`] - Log-query service clients
//! - [`poll`] - Poll policy and the poll-until-terminal loop
//! - [`render`] - Plain-text report
//! - [`export`] - JSON export
//! - [`config`] - Run configuration
//! - [`driver`] - The end-to-end pipeline
//!
//! # Example
//!
//! ```
//! use shared::models::RawLogRecord;
//! use shared::parse::parse_records;
//! use shared::render::render_report;
//!
//! let records = vec![
//!     RawLogRecord::from_message("2024-01-01 00:00:00.000", r#"{"name":"a","durationNano":1500000}"#),
//!     RawLogRecord::from_message("2024-01-01 00:00:01.000", "not json"),
//! ];
//!
//! let mut out = Vec::new();
//! render_report(&mut out, &parse_records(&records)).unwrap();
//! let report = String::from_utf8(out).unwrap();
//!
//! assert!(report.contains("Duration: 1.50 ms"));
//! assert!(report.contains("Span 2: Unable to parse span data"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod client;
pub mod config;
pub mod driver;
pub mod export;
pub mod models;
pub mod parse;
pub mod poll;
pub mod query;
pub mod render;

/// Re-export common dependencies for convenience.
pub use chrono;
pub use serde;
pub use serde_json;
