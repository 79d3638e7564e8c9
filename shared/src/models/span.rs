//! Span data model.
//!
//! Spans arrive as JSON documents embedded in log records. The exporter that
//! wrote them follows the OpenTelemetry JSON conventions loosely, so every
//! field except the identifiers and the name may be missing, and several
//! fields come in more than one shape (numbers as strings, enum values with or
//! without their `SPAN_KIND_` / `STATUS_CODE_` prefixes).
//!
//! [`Span::from_payload`] is the single place where those shapes are
//! normalized and where every default is decided.

use serde_json::{Map, Value};

/// Kind of span.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SpanKind {
    /// The kind was explicitly unspecified.
    Unspecified,
    /// An internal operation.
    Internal,
    /// The span represents a server handling a request.
    Server,
    /// The span represents a client making a request.
    Client,
    /// The span represents a producer sending a message.
    Producer,
    /// The span represents a consumer receiving a message.
    Consumer,
    /// A kind this crate does not know, kept verbatim.
    Other(String),
}

impl SpanKind {
    /// Normalizes a JSON kind value.
    ///
    /// Accepts `"SERVER"`, `"SPAN_KIND_SERVER"`, `"server"` and the numeric
    /// OTLP enum values.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Number(n) => match n.as_u64() {
                Some(0) => Self::Unspecified,
                Some(1) => Self::Internal,
                Some(2) => Self::Server,
                Some(3) => Self::Client,
                Some(4) => Self::Producer,
                Some(5) => Self::Consumer,
                _ => Self::Other(n.to_string()),
            },
            Value::String(s) => {
                let upper = s.to_ascii_uppercase();
                match upper.strip_prefix("SPAN_KIND_").unwrap_or(upper.as_str()) {
                    "UNSPECIFIED" => Self::Unspecified,
                    "INTERNAL" => Self::Internal,
                    "SERVER" => Self::Server,
                    "CLIENT" => Self::Client,
                    "PRODUCER" => Self::Producer,
                    "CONSUMER" => Self::Consumer,
                    _ => Self::Other(s.clone()),
                }
            }
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for SpanKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unspecified => write!(f, "UNSPECIFIED"),
            Self::Internal => write!(f, "INTERNAL"),
            Self::Server => write!(f, "SERVER"),
            Self::Client => write!(f, "CLIENT"),
            Self::Producer => write!(f, "PRODUCER"),
            Self::Consumer => write!(f, "CONSUMER"),
            Self::Other(raw) => write!(f, "{raw}"),
        }
    }
}

/// Status code of a span.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum StatusCode {
    /// No status was recorded.
    #[default]
    Unset,
    /// The operation completed successfully.
    Ok,
    /// The operation failed.
    Error,
    /// A code this crate does not know, kept verbatim.
    Other(String),
}

impl StatusCode {
    /// Normalizes a JSON status code value (`"ERROR"`, `"STATUS_CODE_ERROR"`, `2`).
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Number(n) => match n.as_u64() {
                Some(0) => Self::Unset,
                Some(1) => Self::Ok,
                Some(2) => Self::Error,
                _ => Self::Other(n.to_string()),
            },
            Value::String(s) => {
                let upper = s.to_ascii_uppercase();
                match upper.strip_prefix("STATUS_CODE_").unwrap_or(upper.as_str()) {
                    "UNSET" => Self::Unset,
                    "OK" => Self::Ok,
                    "ERROR" => Self::Error,
                    _ => Self::Other(s.clone()),
                }
            }
            Value::Null => Self::Unset,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unset => write!(f, "UNSET"),
            Self::Ok => write!(f, "OK"),
            Self::Error => write!(f, "ERROR"),
            Self::Other(raw) => write!(f, "{raw}"),
        }
    }
}

/// Status of a span.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpanStatus {
    /// The status code, `UNSET` when absent.
    pub code: StatusCode,
    /// Optional human-readable status message.
    pub message: Option<String>,
}

/// An event within a span.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpanEvent {
    /// The name of the event, if it had one.
    pub name: Option<String>,
    /// Attributes attached to the event, in document order.
    pub attributes: Map<String, Value>,
}

/// A link from a span to another span, possibly in another trace.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpanLink {
    /// Trace ID of the linked span.
    pub trace_id: Option<String>,
    /// Span ID of the linked span.
    pub span_id: Option<String>,
}

/// A span representing a unit of work in a distributed trace.
///
/// Built from a decoded JSON payload with [`Span::from_payload`]; never
/// mutated afterwards.
///
/// # Example
///
/// ```
/// use shared::models::{Span, SpanKind, StatusCode};
///
/// let payload = serde_json::json!({
///     "traceId": "trace-123",
///     "spanId": "span-456",
///     "name": "HTTP GET /api/users",
///     "kind": "SERVER",
///     "durationNano": 1_500_000,
/// });
///
/// let span = Span::from_payload(&payload).unwrap();
/// assert_eq!(span.kind, Some(SpanKind::Server));
/// assert_eq!(span.status.code, StatusCode::Unset);
/// assert_eq!(span.duration_ms(), Some(1.5));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Span {
    /// Identifier of the trace this span belongs to (empty when absent).
    pub trace_id: String,
    /// Identifier of this span (empty when absent).
    pub span_id: String,
    /// The parent span ID (None for root spans).
    pub parent_span_id: Option<String>,
    /// The name/operation of this span (empty when absent).
    pub name: String,
    /// The kind of span.
    pub kind: Option<SpanKind>,
    /// Duration of the span in nanoseconds.
    pub duration_nano: Option<u64>,
    /// The status of the span.
    pub status: SpanStatus,
    /// Span attributes, in document order.
    pub attributes: Map<String, Value>,
    /// Resource attributes of the emitting process, in document order.
    pub resource: Map<String, Value>,
    /// Events recorded during the span.
    pub events: Vec<SpanEvent>,
    /// Links to other spans.
    pub links: Vec<SpanLink>,
}

impl Span {
    /// Builds a span from a decoded JSON payload.
    ///
    /// Returns `None` if the payload is not a JSON object. Any other shape is
    /// accepted: missing or mistyped nested fields become empty.
    #[must_use]
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let obj = payload.as_object()?;

        let status = obj.get("status").and_then(Value::as_object);

        Some(Self {
            trace_id: text_field(obj, "traceId").unwrap_or_default(),
            span_id: text_field(obj, "spanId").unwrap_or_default(),
            parent_span_id: text_field(obj, "parentSpanId").filter(|id| !id.is_empty()),
            name: text_field(obj, "name").unwrap_or_default(),
            kind: obj
                .get("kind")
                .filter(|v| !v.is_null())
                .map(SpanKind::from_value),
            duration_nano: obj.get("durationNano").and_then(nanos),
            status: SpanStatus {
                code: status
                    .and_then(|s| s.get("code"))
                    .map(StatusCode::from_value)
                    .unwrap_or_default(),
                message: status
                    .and_then(|s| text_field(s, "message"))
                    .filter(|m| !m.is_empty()),
            },
            attributes: object_field(obj, "attributes"),
            resource: resource_field(obj),
            events: array_field(obj, "events")
                .filter_map(Value::as_object)
                .map(|event| SpanEvent {
                    name: text_field(event, "name"),
                    attributes: object_field(event, "attributes"),
                })
                .collect(),
            links: array_field(obj, "links")
                .filter_map(Value::as_object)
                .map(|link| SpanLink {
                    trace_id: text_field(link, "traceId"),
                    span_id: text_field(link, "spanId"),
                })
                .collect(),
        })
    }

    /// Returns the duration in milliseconds, if one was recorded.
    #[must_use]
    pub fn duration_ms(&self) -> Option<f64> {
        self.duration_nano.map(|ns| ns as f64 / 1_000_000.0)
    }

    /// Returns true if this is a root span (no parent).
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_span_id.is_none()
    }
}

/// Reads a field as text. Strings are taken as-is, other scalars are
/// rendered as JSON, `null` counts as absent.
fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn object_field(obj: &Map<String, Value>, key: &str) -> Map<String, Value> {
    obj.get(key)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

/// Resources show up either flat (`{"service.name": ..}`) or wrapped as
/// `{"attributes": {..}}`; both end up as a flat map.
fn resource_field(obj: &Map<String, Value>) -> Map<String, Value> {
    let resource = object_field(obj, "resource");
    match resource.get("attributes") {
        Some(Value::Object(attrs)) if resource.len() == 1 => attrs.clone(),
        _ => resource,
    }
}

fn array_field<'a>(obj: &'a Map<String, Value>, key: &str) -> impl Iterator<Item = &'a Value> {
    obj.get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter())
        .into_iter()
        .flatten()
}

/// int64 values are often encoded as strings in OTLP JSON.
fn nanos(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_payload_full() {
        let payload = json!({
            "traceId": "trace-123",
            "spanId": "span-456",
            "parentSpanId": "span-123",
            "name": "GET /api",
            "kind": "SPAN_KIND_SERVER",
            "durationNano": "2500000",
            "status": {"code": "ERROR", "message": "boom"},
            "attributes": {"http.method": "GET", "http.status_code": 500},
            "resource": {"service.name": "api"},
            "events": [{"name": "exception", "attributes": {"exception.type": "Io"}}],
            "links": [{"traceId": "trace-999", "spanId": "span-1"}]
        });

        let span = Span::from_payload(&payload).unwrap();

        assert_eq!(span.trace_id, "trace-123");
        assert_eq!(span.span_id, "span-456");
        assert_eq!(span.parent_span_id.as_deref(), Some("span-123"));
        assert!(!span.is_root());
        assert_eq!(span.name, "GET /api");
        assert_eq!(span.kind, Some(SpanKind::Server));
        assert_eq!(span.duration_nano, Some(2_500_000));
        assert_eq!(span.status.code, StatusCode::Error);
        assert_eq!(span.status.message.as_deref(), Some("boom"));
        assert_eq!(span.attributes.get("http.status_code"), Some(&json!(500)));
        assert_eq!(span.resource.get("service.name"), Some(&json!("api")));
        assert_eq!(span.events.len(), 1);
        assert_eq!(span.events[0].name.as_deref(), Some("exception"));
        assert_eq!(span.links[0].trace_id.as_deref(), Some("trace-999"));
    }

    #[test]
    fn test_from_payload_defaults() {
        let span = Span::from_payload(&json!({
            "traceId": "t",
            "spanId": "s",
            "name": "n"
        }))
        .unwrap();

        assert_eq!(span.kind, None);
        assert_eq!(span.duration_nano, None);
        assert_eq!(span.status, SpanStatus::default());
        assert_eq!(span.status.code.to_string(), "UNSET");
        assert!(span.attributes.is_empty());
        assert!(span.resource.is_empty());
        assert!(span.events.is_empty());
        assert!(span.links.is_empty());
        assert!(span.is_root());
    }

    #[test]
    fn test_from_payload_mistyped_nested_fields_are_empty() {
        let span = Span::from_payload(&json!({
            "traceId": "t",
            "spanId": "s",
            "name": "n",
            "attributes": "not-a-map",
            "events": {"name": "not-a-list"},
            "links": null,
            "status": "OK"
        }))
        .unwrap();

        assert!(span.attributes.is_empty());
        assert!(span.events.is_empty());
        assert!(span.links.is_empty());
        assert_eq!(span.status.code, StatusCode::Unset);
    }

    #[test]
    fn test_from_payload_rejects_non_object() {
        assert!(Span::from_payload(&json!([1, 2, 3])).is_none());
        assert!(Span::from_payload(&json!("span")).is_none());
    }

    #[test]
    fn test_attribute_order_is_preserved() {
        let span = Span::from_payload(&json!({
            "attributes": {"zeta": 1, "alpha": 2, "mid": 3}
        }))
        .unwrap();

        let keys: Vec<&str> = span.attributes.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_wrapped_resource_is_flattened() {
        let span = Span::from_payload(&json!({
            "resource": {"attributes": {"service.name": "checkout"}}
        }))
        .unwrap();

        assert_eq!(span.resource.get("service.name"), Some(&json!("checkout")));
    }

    #[test]
    fn test_duration_ms() {
        let span = Span::from_payload(&json!({"durationNano": 1_500_000})).unwrap();
        assert_eq!(span.duration_ms(), Some(1.5));
    }

    #[test]
    fn test_span_kind_forms() {
        assert_eq!(SpanKind::from_value(&json!("CLIENT")), SpanKind::Client);
        assert_eq!(SpanKind::from_value(&json!("producer")), SpanKind::Producer);
        assert_eq!(SpanKind::from_value(&json!(5)), SpanKind::Consumer);
        assert_eq!(
            SpanKind::from_value(&json!("WORKER")),
            SpanKind::Other("WORKER".to_string())
        );
    }

    #[test]
    fn test_span_kind_display() {
        assert_eq!(SpanKind::Server.to_string(), "SERVER");
        assert_eq!(SpanKind::Internal.to_string(), "INTERNAL");
        assert_eq!(SpanKind::Other("custom".into()).to_string(), "custom");
    }

    #[test]
    fn test_status_code_forms() {
        assert_eq!(StatusCode::from_value(&json!("STATUS_CODE_OK")), StatusCode::Ok);
        assert_eq!(StatusCode::from_value(&json!(2)), StatusCode::Error);
        assert_eq!(StatusCode::from_value(&Value::Null), StatusCode::Unset);
    }
}
