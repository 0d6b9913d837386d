use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::agent::{Agent, CycleOutcome, ExecutionStatus};
use crate::error::CycleError;

use super::types::{RunSummary, Schedule};

/// Runs cycles on `schedule` until the budget elapses or `shutdown` resolves.
///
/// Every per-cycle failure is logged and counted; none of them stops the
/// loop. `shutdown` is only observed between cycles.
pub async fn run<S>(agent: &Agent, schedule: Schedule, shutdown: S) -> RunSummary
where
    S: Future<Output = ()>,
{
    let start = Instant::now();
    let deadline = schedule.budget.map(|b| start + b);
    let mut ticker = time::interval_at(start, schedule.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let budget_elapsed = async move {
        match deadline {
            Some(d) => time::sleep_until(d).await,
            None => futures::future::pending::<()>().await,
        }
    };
    tokio::pin!(shutdown);
    tokio::pin!(budget_elapsed);

    tracing::info!(
        target: "dbagent.runner",
        interval_ms = schedule.interval.as_millis() as u64,
        budget_secs = schedule.budget.map(|b| b.as_secs()),
        "runner started"
    );

    let mut summary = RunSummary::default();
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                tracing::info!(target: "dbagent.runner", "shutdown requested");
                break;
            }
            _ = &mut budget_elapsed => break,
            _ = ticker.tick() => {}
        }

        summary.cycles += 1;
        match AssertUnwindSafe(agent.run_cycle()).catch_unwind().await {
            Ok(result) => record(&mut summary, result),
            Err(panic) => {
                summary.panicked += 1;
                tracing::error!(
                    target: "dbagent.runner",
                    cycle = summary.cycles,
                    panic = panic_message(&*panic),
                    "cycle panicked; continuing"
                );
            }
        }
    }

    tracing::info!(
        target: "dbagent.runner",
        cycles = summary.cycles,
        reported = summary.reported,
        fetch_failures = summary.fetch_failures,
        post_failures = summary.post_failures,
        "runner finished"
    );
    summary
}

fn record(summary: &mut RunSummary, result: Result<CycleOutcome, CycleError>) {
    match result {
        Ok(CycleOutcome::NoTask) => summary.no_task += 1,
        Ok(CycleOutcome::Reported {
            task_id,
            status,
            execution,
        }) => {
            summary.reported += 1;
            if execution == ExecutionStatus::Failed {
                summary.failed_queries += 1;
            }
            tracing::info!(
                target: "dbagent.runner",
                task_id = %task_id,
                status = status,
                execution = ?execution,
                "result reported"
            );
        }
        Ok(CycleOutcome::NothingToReport { task_id }) => {
            summary.nothing_to_report += 1;
            tracing::info!(
                target: "dbagent.runner",
                task_id = %task_id,
                "query returned nothing to report"
            );
        }
        Err(CycleError::Fetch(err)) => {
            summary.fetch_failures += 1;
            tracing::warn!(
                target: "dbagent.runner",
                timeout = err.is_timeout(),
                error = %err,
                "fetch failed; cycle abandoned"
            );
        }
        Err(CycleError::Post { task_id, source }) => {
            summary.post_failures += 1;
            tracing::warn!(
                target: "dbagent.runner",
                task_id = %task_id,
                error = %source,
                "report failed; result dropped"
            );
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}
