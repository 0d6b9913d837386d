use anyhow::Context;
use clap::Parser;
use dbagent_cli::{app, cli, error, logging};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            e.exit_code()
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, error::CliError> {
    let args = cli::Args::parse();
    let cfg = dbagent_core::config::load_default()?;
    logging::init_tracing(&cfg.logging)
        .map_err(anyhow::Error::msg)
        .context("init tracing")?;

    app::run_app(args, cfg).await
}
