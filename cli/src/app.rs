use dbagent_core::api::{run, AppConfig, Schedule};
use dbagent_plugins::factory;

use crate::cli::{resolve_duration, Args};
use crate::error::CliError;

/// Builds the agent from `cfg` and runs it for the requested budget.
pub async fn run_app(args: Args, cfg: AppConfig) -> Result<i32, CliError> {
    let duration_secs =
        resolve_duration(args.duration.as_deref(), cfg.runner.default_duration_secs);

    tracing::info!(
        target: "dbagent.cli",
        mothership = %cfg.mothership.base_url(),
        store = %cfg.datastore.kind,
        duration_secs,
        interval_ms = cfg.runner.interval_ms,
        "starting agent"
    );

    let agent = factory::build_agent(&cfg).await.map_err(|e| {
        tracing::error!(target: "dbagent.cli", error = %e, "cannot start agent");
        CliError::Config(e)
    })?;

    let schedule = Schedule::from_config(&cfg.runner, duration_secs);
    let summary = run(&agent, schedule, shutdown_signal()).await;

    tracing::info!(
        target: "dbagent.cli",
        cycles = summary.cycles,
        reported = summary.reported,
        failed_queries = summary.failed_queries,
        no_task = summary.no_task,
        fetch_failures = summary.fetch_failures,
        post_failures = summary.post_failures,
        panicked = summary.panicked,
        "agent stopped"
    );
    Ok(0)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(target: "dbagent.cli", error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
}
