use async_trait::async_trait;

use crate::error::{FetchError, PostError};
use crate::task::{Task, TaskResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOutcome {
    /// Report delivered; carries the HTTP status.
    Sent { status: u16 },
    /// Empty result, no request made.
    Skipped,
}

#[async_trait]
pub trait MothershipClient: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(None)` means the mothership has nothing queued.
    async fn fetch_task(&self) -> Result<Option<Task>, FetchError>;

    async fn post_result(&self, task_id: &str, result: &TaskResult)
        -> Result<PostOutcome, PostError>;
}
