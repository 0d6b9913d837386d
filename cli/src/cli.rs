use clap::Parser;

/// Polls the mothership for SQL tasks, runs them, and reports the results.
#[derive(Parser, Debug)]
#[command(name = "dbagent", version)]
pub struct Args {
    /// Total run time in seconds. Falls back to `runner.default_duration_secs`
    /// when missing or not a whole number.
    #[arg(value_name = "DURATION")]
    pub duration: Option<String>,
}

/// Picks the run budget. An unparsable value is logged and ignored.
pub fn resolve_duration(raw: Option<&str>, default_secs: u64) -> u64 {
    let Some(raw) = raw else {
        return default_secs;
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) => secs,
        Err(e) => {
            tracing::warn!(
                target: "dbagent.cli",
                value = %raw,
                error = %e,
                default_secs,
                "invalid duration argument; using default"
            );
            default_secs
        }
    }
}
