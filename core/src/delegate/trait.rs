use async_trait::async_trait;

use crate::error::QueryExecutionError;
use crate::task::{QueryParams, Record};

/// Runs SQL against the backing store and hands rows back as records.
///
/// Implementations acquire whatever session they need per call and release
/// it on every exit path.
#[async_trait]
pub trait QueryDelegate: Send + Sync {
    fn name(&self) -> &str;

    /// Runs `prescript` first (result discarded) when given, then `query`
    /// with `params` bound by the store itself.
    async fn execute(
        &self,
        query: &str,
        params: Option<&QueryParams>,
        prescript: Option<&str>,
    ) -> Result<Vec<Record>, QueryExecutionError>;
}
