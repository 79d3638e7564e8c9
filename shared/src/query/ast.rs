//! Abstract syntax for the Logs Insights pipeline queries this crate submits.

/// An equality filter on a (possibly dotted) field path against a string
/// literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    /// The field path, e.g. `attributes.session.id`.
    pub field: String,
    /// The value the field must equal, unescaped.
    pub value: String,
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = \"", self.field)?;
        for c in self.value.chars() {
            match c {
                '"' => write!(f, "\\\"")?,
                '\\' => write!(f, "\\\\")?,
                other => write!(f, "{other}")?,
            }
        }
        write!(f, "\"")
    }
}

/// A Logs Insights query: field selection, an optional filter, an optional
/// ascending sort and an optional result cap, rendered as `|`-separated
/// stages.
///
/// # Example
///
/// ```
/// use shared::query::InsightsQuery;
///
/// let query = InsightsQuery::new(["@timestamp", "@message"])
///     .with_filter("attributes.session.id", "abc")
///     .with_sort_ascending("@timestamp")
///     .with_limit(10);
///
/// assert_eq!(
///     query.to_string(),
///     "fields @timestamp, @message\n\
///      | filter attributes.session.id = \"abc\"\n\
///      | sort @timestamp asc\n\
///      | limit 10"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsightsQuery {
    /// Fields selected by the query.
    pub fields: Vec<String>,
    /// Optional filter stage.
    pub filter: Option<Condition>,
    /// Field of the optional ascending sort stage.
    pub sort: Option<String>,
    /// Optional limit stage.
    pub limit: Option<u32>,
}

impl InsightsQuery {
    /// Creates a query selecting the given fields.
    #[must_use]
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            filter: None,
            sort: None,
            limit: None,
        }
    }

    /// Sets an equality filter.
    #[must_use]
    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter = Some(Condition {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Sorts results by `field`, oldest or smallest first.
    #[must_use]
    pub fn with_sort_ascending(mut self, field: impl Into<String>) -> Self {
        self.sort = Some(field.into());
        self
    }

    /// Sets the result cap.
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl std::fmt::Display for InsightsQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fields {}", self.fields.join(", "))?;

        if let Some(ref filter) = self.filter {
            write!(f, "\n| filter {filter}")?;
        }

        if let Some(ref field) = self.sort {
            write!(f, "\n| sort {field} asc")?;
        }

        if let Some(limit) = self.limit {
            write!(f, "\n| limit {limit}")?;
        }

        Ok(())
    }
}
