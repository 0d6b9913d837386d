use async_trait::async_trait;
use dbagent_core::api::{
    FetchError, HttpErrorKind, MothershipClient, MothershipConfig, PostError, PostOutcome, Task,
    TaskResult,
};
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde_json::Value;

const BODY_PREVIEW_LIMIT: usize = 512;
const ERROR_BODY_LIMIT: usize = 4 * BODY_PREVIEW_LIMIT;

fn classify(err: &reqwest::Error) -> HttpErrorKind {
    if err.is_timeout() {
        HttpErrorKind::Timeout
    } else if err.is_connect() {
        HttpErrorKind::Connect
    } else if err.is_request() {
        HttpErrorKind::Request
    } else if err.is_body() {
        HttpErrorKind::Body
    } else if err.is_decode() {
        HttpErrorKind::Decode
    } else {
        HttpErrorKind::Unknown
    }
}

fn fetch_transport(err: reqwest::Error, url: &str) -> FetchError {
    FetchError::Transport {
        kind: classify(&err),
        url: url.to_string(),
        message: err.to_string(),
    }
}

fn post_transport(err: reqwest::Error, url: &str) -> PostError {
    PostError::Transport {
        kind: classify(&err),
        url: url.to_string(),
        message: err.to_string(),
    }
}

fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }

    let mut out = String::new();
    let mut truncated = false;
    for (idx, ch) in trimmed.chars().enumerate() {
        if idx >= BODY_PREVIEW_LIMIT {
            truncated = true;
            break;
        }
        out.push(ch);
    }

    if truncated {
        out.push_str("...");
    }

    out
}

/// Reads at most `limit` bytes. `Ok(None)` when the body is longer.
async fn read_bounded(
    mut resp: reqwest::Response,
    limit: usize,
) -> Result<Option<Vec<u8>>, reqwest::Error> {
    if resp.content_length().is_some_and(|len| len as usize > limit) {
        return Ok(None);
    }
    let mut buf = Vec::new();
    while let Some(chunk) = resp.chunk().await? {
        if buf.len() + chunk.len() > limit {
            return Ok(None);
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(Some(buf))
}

/// Reads the first `limit` bytes for an error preview; the rest is dropped.
async fn read_prefix(mut resp: reqwest::Response, limit: usize) -> String {
    let mut buf = Vec::new();
    let mut cut = false;
    loop {
        match resp.chunk().await {
            Ok(Some(chunk)) => {
                let room = limit.saturating_sub(buf.len());
                if chunk.len() > room {
                    buf.extend_from_slice(&chunk[..room]);
                    cut = true;
                    break;
                }
                buf.extend_from_slice(&chunk);
            }
            Ok(None) => break,
            Err(err) => return format!("<unreadable body: {err}>"),
        }
    }
    let mut preview = preview_body(&String::from_utf8_lossy(&buf));
    if cut && !preview.ends_with("...") {
        preview.push_str("...");
    }
    preview
}

/// Turns a `/command` body into a task. Null or blank `dbquery` means the
/// mothership has nothing queued.
fn parse_task(body: &str) -> Result<Option<Task>, FetchError> {
    let value: Value = serde_json::from_str(body).map_err(|err| FetchError::Decode {
        message: err.to_string(),
        body: preview_body(body),
    })?;
    let obj = value
        .as_object()
        .ok_or_else(|| FetchError::Malformed("expected a JSON object".to_string()))?;

    let uuid = obj.get("uuid").ok_or(FetchError::MissingField("uuid"))?;
    let dbquery = obj
        .get("dbquery")
        .ok_or(FetchError::MissingField("dbquery"))?;

    let query = match dbquery {
        Value::Null => return Ok(None),
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => s.clone(),
        other => {
            return Err(FetchError::Malformed(format!(
                "`dbquery` must be a string, got {other}"
            )))
        }
    };
    let id = match uuid {
        Value::String(s) if !s.is_empty() => s.clone(),
        other => {
            return Err(FetchError::Malformed(format!(
                "`uuid` must be a non-empty string, got {other}"
            )))
        }
    };
    Ok(Some(Task::new(id, query)))
}

#[derive(Serialize)]
struct ReportPayload<'a> {
    uuid: &'a str,
    result: &'a TaskResult,
}

/// Talks to the mothership over plain HTTP: `GET /command`, `POST /post`.
#[derive(Clone)]
pub struct HttpMothershipClient {
    http: reqwest::Client,
    max_response_bytes: usize,
    url_command: String,
    url_post: String,
}

impl HttpMothershipClient {
    pub fn new(base_url: &str, timeout_ms: u64, max_response_bytes: usize) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .build()?;
        let normalized = base_url.trim_end_matches('/');
        Ok(Self {
            http,
            max_response_bytes,
            url_command: format!("{}/command", normalized),
            url_post: format!("{}/post", normalized),
        })
    }

    pub fn from_config(cfg: &MothershipConfig) -> anyhow::Result<Self> {
        Self::new(&cfg.base_url(), cfg.timeout_ms, cfg.max_response_bytes)
    }
}

#[async_trait]
impl MothershipClient for HttpMothershipClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_task(&self) -> Result<Option<Task>, FetchError> {
        let url = &self.url_command;
        tracing::debug!(target: "dbagent.mothership", stage = "fetch.http.in", url = %url);
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| fetch_transport(err, url))?;
        let status = resp.status();
        if !status.is_success() {
            let body = read_prefix(resp, ERROR_BODY_LIMIT).await;
            tracing::debug!(
                target: "dbagent.mothership",
                stage = "fetch.http.out",
                status = %status,
                body = %body
            );
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.clone(),
                body,
            });
        }

        let body = read_bounded(resp, self.max_response_bytes)
            .await
            .map_err(|err| fetch_transport(err, url))?
            .ok_or_else(|| FetchError::BodyTooLarge {
                url: url.clone(),
                limit: self.max_response_bytes,
            })?;
        let text = String::from_utf8_lossy(&body);
        tracing::debug!(
            target: "dbagent.mothership",
            stage = "fetch.http.out",
            status = %status,
            body = %preview_body(&text)
        );
        parse_task(&text)
    }

    async fn post_result(
        &self,
        task_id: &str,
        result: &TaskResult,
    ) -> Result<PostOutcome, PostError> {
        if result.is_empty() {
            tracing::debug!(
                target: "dbagent.mothership",
                stage = "post.http.skip",
                task_id = %task_id
            );
            return Ok(PostOutcome::Skipped);
        }

        let url = &self.url_post;
        let payload = serde_json::to_vec(&ReportPayload {
            uuid: task_id,
            result,
        })
        .map_err(|err| PostError::Encode(err.to_string()))?;
        tracing::debug!(
            target: "dbagent.mothership",
            stage = "post.http.in",
            url = %url,
            task_id = %task_id,
            bytes = payload.len()
        );

        let resp = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|err| post_transport(err, url))?;
        let status = resp.status();
        let body = read_prefix(resp, ERROR_BODY_LIMIT).await;
        tracing::debug!(
            target: "dbagent.mothership",
            stage = "post.http.out",
            status = %status,
            body = %body
        );

        if !status.is_success() {
            return Err(PostError::Status {
                status: status.as_u16(),
                url: url.clone(),
                body,
            });
        }
        Ok(PostOutcome::Sent {
            status: status.as_u16(),
        })
    }
}
