//! Plain-text span report.
//!
//! Long attribute values are shortened here, and only here; the parsed
//! payloads themselves are never modified.

use crate::models::Span;
use crate::parse::{truncate_chars, ParseResult};
use serde_json::{Map, Value};
use std::io::{self, Write};

/// Display limit for span attribute values.
pub const ATTRIBUTE_DISPLAY_CHARS: usize = 200;

/// Display limit for event attribute values.
pub const EVENT_ATTRIBUTE_DISPLAY_CHARS: usize = 150;

const RULE_WIDTH: usize = 120;
const ELLIPSIS: &str = "...";

/// Writes the full report: a count line, then one section per record
/// between two rules.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn render_report<W: Write>(out: &mut W, results: &[ParseResult]) -> io::Result<()> {
    writeln!(out, "Found {} spans\n", results.len())?;
    rule(out)?;

    for (i, result) in results.iter().enumerate() {
        render_record(out, i + 1, result)?;
    }

    rule(out)
}

/// Writes the section for record number `index` (1-based).
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn render_record<W: Write>(out: &mut W, index: usize, result: &ParseResult) -> io::Result<()> {
    match result {
        Ok(parsed) => {
            writeln!(out)?;
            rule(out)?;
            writeln!(out, "SPAN {index}")?;
            rule(out)?;
            writeln!(
                out,
                "Timestamp: {}",
                parsed.timestamp.as_deref().unwrap_or("-")
            )?;
            render_span(out, &parsed.span)?;
            writeln!(out)
        }
        Err(e) => {
            writeln!(out, "\nSpan {index}: Unable to parse span data")?;
            writeln!(out, "Raw: {}", e.raw_preview())
        }
    }
}

fn render_span<W: Write>(out: &mut W, span: &Span) -> io::Result<()> {
    writeln!(out, "Trace ID: {}", span.trace_id)?;
    writeln!(out, "Span ID: {}", span.span_id)?;
    if let Some(ref parent) = span.parent_span_id {
        writeln!(out, "Parent Span ID: {parent}")?;
    }
    writeln!(out, "Name: {}", span.name)?;
    match span.kind {
        Some(ref kind) => writeln!(out, "Kind: {kind}")?,
        None => writeln!(out, "Kind: -")?,
    }

    // A zero duration is treated as not recorded.
    if let Some(ms) = span.duration_ms().filter(|ms| *ms > 0.0) {
        writeln!(out, "Duration: {ms:.2} ms")?;
    }

    match span.status.message {
        Some(ref message) => writeln!(out, "Status: {} ({message})", span.status.code)?,
        None => writeln!(out, "Status: {}", span.status.code)?,
    }

    if !span.attributes.is_empty() {
        writeln!(out, "\nAttributes:")?;
        render_map(out, "  • ", &span.attributes, Some(ATTRIBUTE_DISPLAY_CHARS))?;
    }

    if !span.resource.is_empty() {
        writeln!(out, "\nResource:")?;
        render_map(out, "  • ", &span.resource, None)?;
    }

    if !span.events.is_empty() {
        writeln!(out, "\nEvents ({}):", span.events.len())?;
        for event in &span.events {
            writeln!(out, "  • {}", event.name.as_deref().unwrap_or("-"))?;
            render_map(
                out,
                "      ",
                &event.attributes,
                Some(EVENT_ATTRIBUTE_DISPLAY_CHARS),
            )?;
        }
    }

    if !span.links.is_empty() {
        writeln!(out, "\nLinks ({}):", span.links.len())?;
        for link in &span.links {
            writeln!(
                out,
                "  • Trace: {}, Span: {}",
                link.trace_id.as_deref().unwrap_or("-"),
                link.span_id.as_deref().unwrap_or("-")
            )?;
        }
    }

    Ok(())
}

fn render_map<W: Write>(
    out: &mut W,
    prefix: &str,
    map: &Map<String, Value>,
    limit: Option<usize>,
) -> io::Result<()> {
    for (key, value) in map {
        let text = display_value(value);
        match limit {
            Some(max) => writeln!(out, "{prefix}{key}: {}", shorten(&text, max))?,
            None => writeln!(out, "{prefix}{key}: {text}")?,
        }
    }
    Ok(())
}

/// Strings are shown without quotes; everything else as compact JSON.
#[must_use]
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Cuts `text` to `max` characters and marks the cut with `...`.
#[must_use]
pub fn shorten(text: &str, max: usize) -> String {
    let kept = truncate_chars(text, max);
    if kept.len() == text.len() {
        text.to_string()
    } else {
        format!("{kept}{ELLIPSIS}")
    }
}

fn rule<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))
}
