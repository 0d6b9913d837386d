mod cycle;
mod types;

pub use cycle::Agent;
pub use types::{CycleOutcome, CyclePhase, ExecutionStatus};
