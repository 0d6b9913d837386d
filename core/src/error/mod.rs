#[allow(clippy::module_inception)]
pub mod error;
pub mod http;
pub mod query;

pub use error::{ConfigurationError, CycleError};
pub use http::{FetchError, HttpErrorKind, PostError};
pub use query::{QueryExecutionError, MAX_QUERY_CHARS};
