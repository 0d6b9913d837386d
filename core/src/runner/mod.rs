mod run;
pub mod types;

pub use run::run;
pub use types::{RunSummary, Schedule};
