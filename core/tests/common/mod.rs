#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dbagent_core::api::{
    FetchError, HttpErrorKind, MothershipClient, PostError, PostOutcome, QueryDelegate,
    QueryExecutionError, QueryParams, Record, Task, TaskResult,
};

pub fn record(pairs: &[(&str, serde_json::Value)]) -> Record {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

pub fn fetch_timeout() -> FetchError {
    FetchError::Transport {
        kind: HttpErrorKind::Timeout,
        url: "http://mothership/command".to_string(),
        message: "operation timed out".to_string(),
    }
}

#[derive(Default)]
struct MothershipState {
    fetches: VecDeque<Result<Option<Task>, FetchError>>,
    fetch_calls: usize,
    posts: Vec<(String, TaskResult)>,
    skipped_posts: usize,
    fail_posts: bool,
}

/// Mothership that replays scripted fetch results and records reports.
/// Once the script runs out every fetch returns "no task".
#[derive(Clone, Default)]
pub struct ScriptedMothership {
    state: Arc<Mutex<MothershipState>>,
}

impl ScriptedMothership {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_task(&self, id: &str, query: &str) -> &Self {
        self.push(Ok(Some(Task::new(id, query))))
    }

    pub fn push_no_task(&self) -> &Self {
        self.push(Ok(None))
    }

    pub fn push_error(&self, err: FetchError) -> &Self {
        self.push(Err(err))
    }

    fn push(&self, r: Result<Option<Task>, FetchError>) -> &Self {
        self.state.lock().unwrap().fetches.push_back(r);
        self
    }

    pub fn fail_posts(&self) {
        self.state.lock().unwrap().fail_posts = true;
    }

    pub fn fetch_calls(&self) -> usize {
        self.state.lock().unwrap().fetch_calls
    }

    pub fn posts(&self) -> Vec<(String, TaskResult)> {
        self.state.lock().unwrap().posts.clone()
    }

    pub fn skipped_posts(&self) -> usize {
        self.state.lock().unwrap().skipped_posts
    }
}

#[async_trait]
impl MothershipClient for ScriptedMothership {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch_task(&self) -> Result<Option<Task>, FetchError> {
        let mut st = self.state.lock().unwrap();
        st.fetch_calls += 1;
        st.fetches.pop_front().unwrap_or(Ok(None))
    }

    async fn post_result(
        &self,
        task_id: &str,
        result: &TaskResult,
    ) -> Result<PostOutcome, PostError> {
        let mut st = self.state.lock().unwrap();
        if result.is_empty() {
            st.skipped_posts += 1;
            return Ok(PostOutcome::Skipped);
        }
        st.posts.push((task_id.to_string(), result.clone()));
        if st.fail_posts {
            return Err(PostError::Transport {
                kind: HttpErrorKind::Connect,
                url: "http://mothership/post".to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok(PostOutcome::Sent { status: 200 })
    }
}

#[derive(Default)]
struct DelegateState {
    answers: HashMap<String, Result<Vec<Record>, String>>,
    executed: Vec<String>,
}

/// Delegate answering from a fixed query table. Unknown queries fail.
#[derive(Clone, Default)]
pub struct TableDelegate {
    state: Arc<Mutex<DelegateState>>,
}

impl TableDelegate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(&self, query: &str, rows: Vec<Record>) -> &Self {
        self.state
            .lock()
            .unwrap()
            .answers
            .insert(query.to_string(), Ok(rows));
        self
    }

    pub fn fail(&self, query: &str, message: &str) -> &Self {
        self.state
            .lock()
            .unwrap()
            .answers
            .insert(query.to_string(), Err(message.to_string()));
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.state.lock().unwrap().executed.clone()
    }
}

#[async_trait]
impl QueryDelegate for TableDelegate {
    fn name(&self) -> &str {
        "table"
    }

    async fn execute(
        &self,
        query: &str,
        params: Option<&QueryParams>,
        _prescript: Option<&str>,
    ) -> Result<Vec<Record>, QueryExecutionError> {
        let mut st = self.state.lock().unwrap();
        st.executed.push(query.to_string());
        match st.answers.get(query) {
            Some(Ok(rows)) => Ok(rows.clone()),
            Some(Err(msg)) => Err(QueryExecutionError::new(query, params, msg.clone())),
            None => Err(QueryExecutionError::new(query, params, "no such table")),
        }
    }
}

/// Delegate that panics on every call.
pub struct PanickingDelegate;

#[async_trait]
impl QueryDelegate for PanickingDelegate {
    fn name(&self) -> &str {
        "panicking"
    }

    async fn execute(
        &self,
        _query: &str,
        _params: Option<&QueryParams>,
        _prescript: Option<&str>,
    ) -> Result<Vec<Record>, QueryExecutionError> {
        panic!("driver blew up");
    }
}
