//! Raw log records as returned by the log-query service.

use serde::{Deserialize, Serialize};

/// Name of the field holding the record timestamp.
pub const TIMESTAMP_FIELD: &str = "@timestamp";

/// Name of the field holding the record body.
pub const MESSAGE_FIELD: &str = "@message";

/// A single `field = value` cell of a query result row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultField {
    /// The field name (e.g. `@timestamp`).
    pub field: String,
    /// The field value, always text on the wire.
    pub value: String,
}

impl ResultField {
    /// Creates a new result field.
    #[must_use]
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// One result row of a log query, in the order the service returned its fields.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawLogRecord {
    fields: Vec<ResultField>,
}

impl RawLogRecord {
    /// Creates a record from its fields.
    #[must_use]
    pub fn new(fields: Vec<ResultField>) -> Self {
        Self { fields }
    }

    /// Convenience constructor for the two fields every span record carries.
    #[must_use]
    pub fn from_message(timestamp: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(vec![
            ResultField::new(TIMESTAMP_FIELD, timestamp),
            ResultField::new(MESSAGE_FIELD, message),
        ])
    }

    /// Returns the value of a field. If a field repeats, the last one wins.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|f| f.field == field)
            .map(|f| f.value.as_str())
    }

    /// Returns the `@timestamp` field.
    #[must_use]
    pub fn timestamp(&self) -> Option<&str> {
        self.get(TIMESTAMP_FIELD)
    }

    /// Returns the `@message` field.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.get(MESSAGE_FIELD)
    }

    /// Returns all fields in service order.
    #[must_use]
    pub fn fields(&self) -> &[ResultField] {
        &self.fields
    }
}
