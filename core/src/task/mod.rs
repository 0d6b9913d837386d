mod types;

pub use types::{QueryParams, Record, Task, TaskResult};
