use std::fmt;

/// Where a cycle is in `Idle -> Fetching -> (NoTask | Executing -> Reporting) -> Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Idle,
    Fetching,
    NoTask,
    Executing,
    Reporting,
}

impl CyclePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            CyclePhase::Idle => "idle",
            CyclePhase::Fetching => "fetching",
            CyclePhase::NoTask => "no_task",
            CyclePhase::Executing => "executing",
            CyclePhase::Reporting => "reporting",
        }
    }

    /// Whether `self -> next` is an edge of the cycle state machine.
    pub fn can_transition_to(self, next: CyclePhase) -> bool {
        use CyclePhase::*;
        matches!(
            (self, next),
            (Idle, Fetching)
                | (Fetching, Idle)
                | (Fetching, NoTask)
                | (Fetching, Executing)
                | (NoTask, Idle)
                | (Executing, Reporting)
                | (Reporting, Idle)
        )
    }
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    Succeeded { rows: usize },
    Failed,
}

/// How a cycle that did not error ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    NoTask,
    Reported {
        task_id: String,
        status: u16,
        execution: ExecutionStatus,
    },
    /// The query produced nothing to report, so no post was made.
    NothingToReport { task_id: String },
}

impl CycleOutcome {
    pub fn task_id(&self) -> Option<&str> {
        match self {
            CycleOutcome::NoTask => None,
            CycleOutcome::Reported { task_id, .. } | CycleOutcome::NothingToReport { task_id } => {
                Some(task_id)
            }
        }
    }
}
