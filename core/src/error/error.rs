use thiserror::Error;

use super::http::{FetchError, PostError};

/// Startup failures. The only error kind that ends the process.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("unsupported data store kind: {0}")]
    UnsupportedStoreKind(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("failed to load configuration: {0}")]
    Load(String),
}

/// Failures that end a cycle early. Query failures never appear here; they
/// are turned into a reported result inside the cycle.
#[derive(Error, Debug)]
pub enum CycleError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("report for task {task_id} failed: {source}")]
    Post {
        task_id: String,
        #[source]
        source: PostError,
    },
}

impl CycleError {
    pub fn stage(&self) -> &'static str {
        match self {
            CycleError::Fetch(_) => "fetch",
            CycleError::Post { .. } => "post",
        }
    }
}
