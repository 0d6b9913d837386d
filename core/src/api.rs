//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `dbagent_core::api` instead of reaching into internal modules.

pub use crate::agent::{Agent, CycleOutcome, CyclePhase, ExecutionStatus};
pub use crate::config::{
    load_default, AppConfig, DataStoreConfig, DataStoreKind, LoggingConfig, MothershipConfig,
    RunnerConfig,
};
pub use crate::delegate::QueryDelegate;
pub use crate::error::{
    ConfigurationError, CycleError, FetchError, HttpErrorKind, PostError, QueryExecutionError,
};
pub use crate::mothership::{MothershipClient, PostOutcome};
pub use crate::runner::{run, RunSummary, Schedule};
pub use crate::task::{QueryParams, Record, Task, TaskResult};
