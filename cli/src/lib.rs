//! dbagent-cli library - exposes modules for unit tests

pub mod app;
pub mod cli;
pub mod error;
pub mod logging;
