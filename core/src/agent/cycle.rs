use tracing::Instrument;

use crate::delegate::QueryDelegate;
use crate::error::CycleError;
use crate::mothership::{MothershipClient, PostOutcome};
use crate::task::{Task, TaskResult};

use super::types::{CycleOutcome, CyclePhase, ExecutionStatus};

/// Drives one fetch, execute, report pass at a time.
///
/// Holds no task state: the fetched [`Task`] is a local of `run_cycle` and is
/// dropped when the cycle ends, so a report can only ever carry the id that
/// was fetched in the same cycle.
pub struct Agent {
    mothership: Box<dyn MothershipClient>,
    delegate: Box<dyn QueryDelegate>,
}

impl Agent {
    pub fn new(mothership: Box<dyn MothershipClient>, delegate: Box<dyn QueryDelegate>) -> Self {
        Self {
            mothership,
            delegate,
        }
    }

    pub async fn run_cycle(&self) -> Result<CycleOutcome, CycleError> {
        let cycle_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!(
            target: "dbagent.cycle",
            "cycle",
            cycle_id = %cycle_id,
            task_id = tracing::field::Empty
        );
        self.cycle_inner().instrument(span).await
    }

    async fn cycle_inner(&self) -> Result<CycleOutcome, CycleError> {
        let mut phase = CyclePhase::Idle;

        advance(&mut phase, CyclePhase::Fetching);
        tracing::debug!(
            target: "dbagent.cycle",
            stage = "fetch.in",
            mothership = self.mothership.name()
        );
        let task = match self.mothership.fetch_task().await {
            Ok(Some(task)) => task,
            Ok(None) => {
                advance(&mut phase, CyclePhase::NoTask);
                tracing::debug!(target: "dbagent.cycle", stage = "fetch.out", "no task queued");
                advance(&mut phase, CyclePhase::Idle);
                return Ok(CycleOutcome::NoTask);
            }
            Err(err) => {
                advance(&mut phase, CyclePhase::Idle);
                return Err(CycleError::Fetch(err));
            }
        };
        tracing::Span::current().record("task_id", task.id.as_str());
        tracing::info!(
            target: "dbagent.cycle",
            stage = "fetch.out",
            query_len = task.query.len(),
            "task received"
        );

        advance(&mut phase, CyclePhase::Executing);
        let result = self.execute(&task).await;

        advance(&mut phase, CyclePhase::Reporting);
        let outcome = self.report(task, result).await;
        advance(&mut phase, CyclePhase::Idle);
        outcome
    }

    async fn execute(&self, task: &Task) -> TaskResult {
        tracing::debug!(
            target: "dbagent.cycle",
            stage = "execute.in",
            delegate = self.delegate.name(),
            query = %task.query
        );
        match self.delegate.execute(&task.query, None, None).await {
            Ok(rows) => {
                tracing::info!(
                    target: "dbagent.cycle",
                    stage = "execute.out",
                    rows = rows.len(),
                    "query succeeded"
                );
                TaskResult::Rows(rows)
            }
            Err(err) => {
                tracing::warn!(
                    target: "dbagent.cycle",
                    stage = "execute.out",
                    error = %err,
                    "query failed; reporting failure"
                );
                TaskResult::Error(err.to_string())
            }
        }
    }

    async fn report(&self, task: Task, result: TaskResult) -> Result<CycleOutcome, CycleError> {
        let execution = match &result {
            TaskResult::Rows(rows) => ExecutionStatus::Succeeded { rows: rows.len() },
            TaskResult::Error(_) => ExecutionStatus::Failed,
        };
        tracing::debug!(
            target: "dbagent.cycle",
            stage = "post.in",
            rows = result.row_count(),
            failed = result.is_error()
        );
        match self.mothership.post_result(&task.id, &result).await {
            Ok(PostOutcome::Sent { status }) => {
                tracing::debug!(target: "dbagent.cycle", stage = "post.out", status = status);
                Ok(CycleOutcome::Reported {
                    task_id: task.id,
                    status,
                    execution,
                })
            }
            Ok(PostOutcome::Skipped) => {
                tracing::debug!(
                    target: "dbagent.cycle",
                    stage = "post.out",
                    "empty result, report skipped"
                );
                Ok(CycleOutcome::NothingToReport { task_id: task.id })
            }
            Err(source) => Err(CycleError::Post {
                task_id: task.id,
                source,
            }),
        }
    }
}

fn advance(phase: &mut CyclePhase, next: CyclePhase) {
    debug_assert!(
        phase.can_transition_to(next),
        "illegal cycle transition {phase} -> {next}"
    );
    tracing::trace!(target: "dbagent.cycle", from = %phase, to = %next, "phase");
    *phase = next;
}
