pub mod agent;
pub mod api;
pub mod config;
pub mod delegate;
pub mod error;
pub mod mothership;
pub mod runner;
pub mod task;
