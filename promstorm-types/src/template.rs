//! Query templates and per-entity substitution.

use core::fmt;

/// Label matched by the placeholder filter.
pub const PLACEHOLDER_LABEL: &str = "instance";

/// Sentinel value the placeholder filter matches on.
pub const PLACEHOLDER_VALUE: &str = "host-0";

/// The exact filter text that gets replaced in every template.
pub const PLACEHOLDER_FILTER: &str = r#"instance="host-0""#;

/// A query string parametrized by the `instance="host-0"` filter.
///
/// Templates are opaque: nothing checks that they are valid PromQL. A
/// template without the placeholder is legal and renders unchanged for
/// every entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryTemplate(String);

impl QueryTemplate {
    /// Wrap a query string.
    pub fn new(query: impl Into<String>) -> Self {
        Self(query.into())
    }

    /// The raw template text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the template contains the placeholder filter at all.
    pub fn is_parametrized(&self) -> bool {
        self.0.contains(PLACEHOLDER_FILTER)
    }

    /// Replace every occurrence of the placeholder filter with a filter on `entity`.
    ///
    /// The entity is inserted verbatim, without escaping.
    pub fn render(&self, entity: &str) -> String {
        self.0.replace(
            PLACEHOLDER_FILTER,
            &format!(r#"{}="{}""#, PLACEHOLDER_LABEL, entity),
        )
    }
}

impl fmt::Display for QueryTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for QueryTemplate {
    fn from(query: String) -> Self {
        Self(query)
    }
}

impl From<&str> for QueryTemplate {
    fn from(query: &str) -> Self {
        Self(query.to_string())
    }
}
