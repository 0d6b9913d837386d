use dbagent_core::api::ConfigurationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(#[from] ConfigurationError),
    #[error("startup failed: {0:#}")]
    Startup(#[from] anyhow::Error),
}

impl CliError {
    // 0: success (budget elapsed or ctrl-c)
    // 11: config error
    // 50: any other startup failure
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 11,
            CliError::Startup(_) => 50,
        }
    }
}
