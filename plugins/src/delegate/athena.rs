//! Query delegate backed by Amazon Athena.
//!
//! A query execution plays the role of the session: it is started, polled to
//! a terminal state, and its result pages are read. Any exit that leaves an
//! execution running (poll failure, timeout) stops it before returning.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::timeout::TimeoutConfig;
use aws_sdk_athena::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_athena::error::DisplayErrorContext;
use aws_sdk_athena::types::{QueryExecutionContext, QueryExecutionState, ResultConfiguration};
use aws_sdk_athena::Client;
use dbagent_core::api::{
    ConfigurationError, DataStoreConfig, DataStoreKind, QueryDelegate, QueryExecutionError,
    QueryParams, Record,
};
use tokio::time::Instant;

use super::convert::{render_params, rows_to_records, Column};

const CREDENTIALS_SOURCE: &str = "dbagent-config";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

fn sdk_message<E>(err: E) -> String
where
    E: std::error::Error,
{
    DisplayErrorContext(&err).to_string()
}

/// Awaits one SDK call, giving up at `deadline`.
async fn within<T, E, F>(deadline: Instant, op: &str, call: F) -> Result<T, String>
where
    E: std::error::Error,
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout_at(deadline, call).await {
        Ok(res) => res.map_err(sdk_message),
        Err(_) => Err(format!("{op} did not answer before the deadline")),
    }
}

/// Why waiting on an execution ended without success.
enum WaitError {
    /// Athena finished the execution as failed or cancelled.
    Terminal(String),
    /// We stopped watching while it may still be running.
    Abandoned(String),
}

pub struct AthenaDelegate {
    client: Client,
    database: String,
    output_location: Option<String>,
    workgroup: Option<String>,
    poll_interval: Duration,
    query_timeout: Duration,
}

impl AthenaDelegate {
    /// Builds a delegate on an existing client. Settings are validated the
    /// same way as [`AthenaDelegate::from_config`].
    pub fn new(client: Client, cfg: &DataStoreConfig) -> Result<Self, ConfigurationError> {
        validate(cfg)?;
        let output_location = Some(cfg.s3_staging_dir.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Ok(Self {
            client,
            database: cfg.dbname.trim().to_string(),
            output_location,
            workgroup: cfg.workgroup().map(str::to_string),
            poll_interval: cfg.poll_interval(),
            query_timeout: cfg.query_timeout(),
        })
    }

    /// Resolves credentials and region and builds the Athena client.
    ///
    /// Static credentials are used when both key halves are configured;
    /// otherwise the standard AWS provider chain applies.
    pub async fn from_config(cfg: &DataStoreConfig) -> Result<Self, ConfigurationError> {
        validate(cfg)?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region_name.trim().to_string()))
            .timeout_config(
                TimeoutConfig::builder()
                    .connect_timeout(CONNECT_TIMEOUT)
                    .operation_timeout(cfg.query_timeout())
                    .build(),
            );
        if let Some((key_id, secret)) = cfg.static_credentials() {
            loader = loader.credentials_provider(Credentials::new(
                key_id,
                secret,
                None,
                None,
                CREDENTIALS_SOURCE,
            ));
        }
        if let Some(endpoint) = cfg.endpoint_url() {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        tracing::info!(
            target: "dbagent.athena",
            region = %cfg.region_name,
            database = %cfg.dbname,
            workgroup = ?cfg.workgroup(),
            static_credentials = cfg.static_credentials().is_some(),
            "athena delegate configured"
        );
        Self::new(Client::new(&sdk_config), cfg)
    }

    async fn start(&self, sql: &str, params: Option<Vec<String>>) -> Result<String, String> {
        let mut req = self
            .client
            .start_query_execution()
            .query_string(sql)
            .query_execution_context(
                QueryExecutionContext::builder()
                    .database(&self.database)
                    .build(),
            );
        if let Some(location) = &self.output_location {
            req = req.result_configuration(
                ResultConfiguration::builder()
                    .output_location(location)
                    .build(),
            );
        }
        if let Some(workgroup) = &self.workgroup {
            req = req.work_group(workgroup);
        }
        if let Some(params) = params.filter(|p| !p.is_empty()) {
            req = req.set_execution_parameters(Some(params));
        }

        let deadline = Instant::now() + self.query_timeout;
        let out = within(deadline, "StartQueryExecution", req.send()).await?;
        out.query_execution_id()
            .map(str::to_string)
            .ok_or_else(|| "StartQueryExecution returned no execution id".to_string())
    }

    async fn wait(&self, id: &str) -> Result<(), WaitError> {
        let deadline = Instant::now() + self.query_timeout;
        loop {
            let call = self.client.get_query_execution().query_execution_id(id).send();
            let out = within(Instant::now() + self.query_timeout, "GetQueryExecution", call)
                .await
                .map_err(WaitError::Abandoned)?;
            let status = out.query_execution().and_then(|q| q.status());
            match status.and_then(|s| s.state()) {
                Some(QueryExecutionState::Succeeded) => return Ok(()),
                Some(state @ (QueryExecutionState::Failed | QueryExecutionState::Cancelled)) => {
                    let reason = status
                        .and_then(|s| s.state_change_reason())
                        .unwrap_or("no reason given");
                    return Err(WaitError::Terminal(format!(
                        "query execution {id} {}: {reason}",
                        state.as_str()
                    )));
                }
                _ => {}
            }

            if Instant::now() >= deadline {
                return Err(WaitError::Abandoned(format!(
                    "query execution {id} did not finish within {}ms",
                    self.query_timeout.as_millis()
                )));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn stop(&self, id: &str) {
        let deadline = Instant::now() + self.query_timeout;
        let call = self.client.stop_query_execution().query_execution_id(id).send();
        match within(deadline, "StopQueryExecution", call).await {
            Ok(_) => tracing::debug!(target: "dbagent.athena", execution_id = %id, "execution stopped"),
            Err(e) => tracing::warn!(
                target: "dbagent.athena",
                execution_id = %id,
                error = %e,
                "failed to stop execution"
            ),
        }
    }

    /// Starts `sql` and waits for it. Returns the execution id on success.
    async fn run_to_completion(
        &self,
        sql: &str,
        params: Option<Vec<String>>,
    ) -> Result<String, String> {
        let id = self.start(sql, params).await?;
        tracing::debug!(target: "dbagent.athena", stage = "athena.started", execution_id = %id);
        match self.wait(&id).await {
            Ok(()) => Ok(id),
            Err(WaitError::Terminal(msg)) => Err(msg),
            Err(WaitError::Abandoned(msg)) => {
                self.stop(&id).await;
                Err(msg)
            }
        }
    }

    async fn fetch_records(&self, id: &str) -> Result<Vec<Record>, String> {
        let mut records = Vec::new();
        let mut columns: Option<Vec<Column>> = None;
        let mut next_token: Option<String> = None;
        let mut first_page = true;
        let deadline = Instant::now() + self.query_timeout;

        loop {
            let call = self
                .client
                .get_query_results()
                .query_execution_id(id)
                .set_next_token(next_token.take())
                .send();
            let out = within(deadline, "GetQueryResults", call).await?;

            if let Some(result_set) = out.result_set() {
                let cols = columns.get_or_insert_with(|| {
                    result_set
                        .result_set_metadata()
                        .map(|m| {
                            m.column_info()
                                .iter()
                                .map(|c| Column::new(c.name(), c.r#type()))
                                .collect()
                        })
                        .unwrap_or_default()
                });
                let rows = result_set
                    .rows()
                    .iter()
                    .map(|row| {
                        row.data()
                            .iter()
                            .map(|d| d.var_char_value().map(str::to_string))
                            .collect()
                    })
                    .collect();
                records.extend(rows_to_records(cols, rows, first_page));
            }
            first_page = false;

            match out.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }
        Ok(records)
    }
}

fn validate(cfg: &DataStoreConfig) -> Result<(), ConfigurationError> {
    match cfg.kind()? {
        DataStoreKind::Athena => {}
    }
    if cfg.region_name.trim().is_empty() {
        return Err(ConfigurationError::Invalid(
            "datastore.region_name must be set".to_string(),
        ));
    }
    if cfg.dbname.trim().is_empty() {
        return Err(ConfigurationError::Invalid(
            "datastore.dbname must be set".to_string(),
        ));
    }
    let staging = cfg.s3_staging_dir.trim();
    if staging.is_empty() && cfg.workgroup().is_none() {
        return Err(ConfigurationError::Invalid(
            "datastore.s3_staging_dir or datastore.workgroup must be set".to_string(),
        ));
    }
    if !staging.is_empty() && !staging.starts_with("s3://") {
        return Err(ConfigurationError::Invalid(format!(
            "datastore.s3_staging_dir must be an s3:// url, got {staging:?}"
        )));
    }
    Ok(())
}

#[async_trait]
impl QueryDelegate for AthenaDelegate {
    fn name(&self) -> &str {
        "athena"
    }

    async fn execute(
        &self,
        query: &str,
        params: Option<&QueryParams>,
        prescript: Option<&str>,
    ) -> Result<Vec<Record>, QueryExecutionError> {
        let fail = |message: String| {
            let err = QueryExecutionError::new(query, params, message);
            tracing::error!(target: "dbagent.athena", error = %err, "query failed");
            err
        };

        if let Some(prescript) = prescript.filter(|p| !p.trim().is_empty()) {
            self.run_to_completion(prescript, None)
                .await
                .map_err(|m| fail(format!("prescript failed: {m}")))?;
        }

        let bound = params.map(render_params).transpose().map_err(&fail)?;
        tracing::debug!(
            target: "dbagent.athena",
            stage = "athena.execute.in",
            query_len = query.len(),
            params = bound.as_ref().map_or(0, Vec::len)
        );

        let id = self.run_to_completion(query, bound).await.map_err(&fail)?;
        let records = self.fetch_records(&id).await.map_err(&fail)?;
        tracing::debug!(
            target: "dbagent.athena",
            stage = "athena.execute.out",
            execution_id = %id,
            rows = records.len()
        );
        Ok(records)
    }
}
