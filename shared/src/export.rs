//! JSON export of a session's spans.
//!
//! The document is written to a temporary file in the destination directory
//! and persisted over the final path, so a failed write never leaves a
//! truncated export behind.

use crate::parse::ParseResult;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Errors that can occur while writing an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The file could not be written or moved into place.
    #[error("Failed to write export to {}: {source}", path.display())]
    Io {
        /// Destination path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The document could not be serialized.
    #[error("Failed to serialize export: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The exported document.
///
/// `span_count` is the number of records the query returned, including
/// records that failed to parse; `spans` holds only the parsed payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    /// The session the spans belong to.
    pub session_id: String,
    /// When the export was produced (RFC 3339, UTC).
    pub query_time: String,
    /// Number of records retrieved.
    pub span_count: usize,
    /// Decoded span payloads, in query order.
    pub spans: Vec<Value>,
}

impl ExportDocument {
    /// Builds a document from parse outcomes, dropping failed records.
    #[must_use]
    pub fn from_results(
        session_id: impl Into<String>,
        query_time: DateTime<Utc>,
        results: &[ParseResult],
    ) -> Self {
        Self {
            session_id: session_id.into(),
            query_time: query_time.to_rfc3339_opts(SecondsFormat::Micros, true),
            span_count: results.len(),
            spans: results
                .iter()
                .filter_map(|r| r.as_ref().ok())
                .map(|parsed| parsed.payload.clone())
                .collect(),
        }
    }
}

/// File name of the export for a session.
#[must_use]
pub fn export_file_name(session_id: &str) -> String {
    format!("session_{session_id}_full.json")
}

/// Writes `document` to `path` as 2-space indented JSON.
///
/// # Errors
///
/// Returns an error if the file cannot be created, written, or renamed.
pub fn export(document: &ExportDocument, path: &Path) -> Result<(), ExportError> {
    let io_err = |source: std::io::Error| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    // Dropping the temporary file on any error below removes it.
    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    {
        let mut writer = BufWriter::new(&mut tmp);
        serde_json::to_writer_pretty(&mut writer, document)?;
        writer.write_all(b"\n").map_err(io_err)?;
        writer.flush().map_err(io_err)?;
    }
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;

    tracing::info!(path = %path.display(), spans = document.spans.len(), "Wrote export");
    Ok(())
}

/// Reads an export back from disk.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not an export document.
pub fn read_export(path: &Path) -> Result<ExportDocument, ExportError> {
    let content = fs::read_to_string(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawLogRecord;
    use crate::parse::parse_records;
    use chrono::TimeZone;
    use serde_json::json;

    fn results(messages: &[&str]) -> Vec<ParseResult> {
        let records: Vec<RawLogRecord> = messages
            .iter()
            .map(|m| RawLogRecord::from_message("2024-01-01 00:00:00.000", *m))
            .collect();
        parse_records(&records)
    }

    fn query_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap()
    }

    #[test]
    fn test_document_counts_all_records_but_keeps_parsed_spans() {
        let doc = ExportDocument::from_results(
            "s-1",
            query_time(),
            &results(&[r#"{"name":"a"}"#, "garbage", r#"{"name":"c"}"#]),
        );

        assert_eq!(doc.span_count, 3);
        assert_eq!(doc.spans, vec![json!({"name": "a"}), json!({"name": "c"})]);
        assert_eq!(doc.query_time, "2024-05-01T08:30:00.000000Z");
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name("abc-123"), "session_abc-123_full.json");
    }

    #[test]
    fn test_export_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(export_file_name("s-1"));
        let long = "v".repeat(400);
        let body = json!({
            "traceId": "t",
            "spanId": "s",
            "name": "n",
            "durationNano": 1_500_000,
            "attributes": {"z": long, "a": 1}
        })
        .to_string();
        let doc = ExportDocument::from_results("s-1", query_time(), &results(&[body.as_str()]));

        export(&doc, &path).unwrap();
        let read = read_export(&path).unwrap();

        assert_eq!(read, doc);
        assert_eq!(read.spans[0]["attributes"]["z"].as_str().unwrap().len(), 400);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_export_keeps_large_integers_exact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.json");
        let body = r#"{"name":"n","attributes":{"big":123456789012345678901234567890,"neg":-98765432109876543210}}"#;
        let doc = ExportDocument::from_results("s", query_time(), &results(&[body]));

        export(&doc, &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();

        assert!(text.contains("\"big\": 123456789012345678901234567890"));
        assert!(text.contains("\"neg\": -98765432109876543210"));
        assert_eq!(read_export(&path).unwrap(), doc);
    }

    #[test]
    fn test_export_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        fs::write(&path, "stale").unwrap();
        let doc = ExportDocument::from_results("s", query_time(), &results(&[r#"{"name":"a"}"#]));

        export(&doc, &path).unwrap();

        assert_eq!(read_export(&path).unwrap(), doc);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_export_uses_two_space_indent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let doc = ExportDocument::from_results("s", query_time(), &results(&[r#"{"name":"a"}"#]));

        export(&doc, &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();

        assert!(text.starts_with("{\n  \"session_id\": \"s\",\n  \"query_time\""));
        assert!(text.contains("\n  \"spans\": [\n    {\n      \"name\": \"a\"\n    }\n  ]"));
    }

    #[test]
    fn test_export_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.json");
        let doc = ExportDocument::from_results("s", query_time(), &[]);

        let err = export(&doc, &path).unwrap_err();

        assert!(matches!(err, ExportError::Io { .. }));
        assert!(!path.exists());
    }
}
