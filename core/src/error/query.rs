use std::fmt;

use crate::task::QueryParams;

/// Longest query prefix kept on an error.
pub const MAX_QUERY_CHARS: usize = 1000;

/// The data store rejected or failed a query.
///
/// The display form is what the mothership receives as the task's result.
#[derive(Debug, Clone)]
pub struct QueryExecutionError {
    query: String,
    params: Option<QueryParams>,
    message: String,
}

impl QueryExecutionError {
    pub fn new(query: &str, params: Option<&QueryParams>, message: impl Into<String>) -> Self {
        Self {
            query: truncate_chars(query, MAX_QUERY_CHARS),
            params: params.cloned(),
            message: message.into(),
        }
    }

    /// Query text, cut to [`MAX_QUERY_CHARS`].
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn params(&self) -> Option<&QueryParams> {
        self.params.as_ref()
    }

    /// Driver-level failure text.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for QueryExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unable to complete SQL: {} ", self.query)?;
        match &self.params {
            Some(p) => write!(f, "{}", serde_json::Value::Object(p.clone()))?,
            None => f.write_str("None")?,
        }
        write!(f, " {}", self.message)
    }
}

impl std::error::Error for QueryExecutionError {}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn long_query_is_truncated() {
        let query = "x".repeat(MAX_QUERY_CHARS + 500);
        let err = QueryExecutionError::new(&query, None, "syntax error");
        assert_eq!(err.query().chars().count(), MAX_QUERY_CHARS);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let query = "é".repeat(MAX_QUERY_CHARS + 1);
        let err = QueryExecutionError::new(&query, None, "x");
        assert_eq!(err.query().chars().count(), MAX_QUERY_CHARS);
    }

    #[test]
    fn display_includes_query_params_and_driver_text() {
        let mut params = QueryParams::new();
        params.insert("id".to_string(), json!(7));
        let err = QueryExecutionError::new("SELECT ?", Some(&params), "TABLE_NOT_FOUND");
        assert_eq!(
            err.to_string(),
            r#"Unable to complete SQL: SELECT ? {"id":7} TABLE_NOT_FOUND"#
        );
    }

    #[test]
    fn display_without_params() {
        let err = QueryExecutionError::new("SELECT 1", None, "boom");
        assert_eq!(err.to_string(), "Unable to complete SQL: SELECT 1 None boom");
    }
}
