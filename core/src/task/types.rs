use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One result-set row: column name to scalar value, in column order.
pub type Record = Map<String, Value>;

/// Bound query parameters, in the order they are substituted.
pub type QueryParams = Map<String, Value>;

/// One unit of work handed out by the mothership.
///
/// Lives for a single cycle. `id` is echoed unchanged in the report so the
/// mothership can match the result to its request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub query: String,
}

impl Task {
    pub fn new(id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            query: query.into(),
        }
    }
}

/// Outcome of running a task's query.
///
/// Serialized untagged so the report carries either the row array or the
/// error text directly under `result`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskResult {
    Rows(Vec<Record>),
    Error(String),
}

impl TaskResult {
    /// True when there is nothing worth reporting.
    pub fn is_empty(&self) -> bool {
        match self {
            TaskResult::Rows(rows) => rows.is_empty(),
            TaskResult::Error(msg) => msg.trim().is_empty(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, TaskResult::Error(_))
    }

    pub fn row_count(&self) -> usize {
        match self {
            TaskResult::Rows(rows) => rows.len(),
            TaskResult::Error(_) => 0,
        }
    }
}
