//! Job-scoped tool calling client
//!
//! Used from inside a sandboxed job worker to invoke orchestrator-mediated tools over
//! `POST {orchestrator}/worker/{job_id}/tools/call`. Connection details are injected
//! by the orchestrator through the environment:
//!
//! * `IRONCLAW_ORCHESTRATOR_URL` - base URL of the orchestrator API
//! * `IRONCLAW_JOB_ID` - identifier of the current job
//! * `IRONCLAW_WORKER_TOKEN` - bearer token scoped to that job
//!
//! Failures are never retried here.

use std::{collections::BTreeMap, env, time::Duration};

use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

pub const ORCHESTRATOR_URL_ENV: &str = "IRONCLAW_ORCHESTRATOR_URL";
pub const JOB_ID_ENV: &str = "IRONCLAW_JOB_ID";
pub const WORKER_TOKEN_ENV: &str = "IRONCLAW_WORKER_TOKEN";

pub const MAX_TIMEOUT_SECS: u64 = 300;
const DEFAULT_TRANSPORT_TIMEOUT_SECS: u64 = 60;
const TRANSPORT_GRACE_SECS: u64 = 5;
const SHELL_TIMEOUT_SECS: u64 = 60;
const HTTP_GET_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ToolClientError {
    #[error(
        "Missing required environment variable: {0}. The tool client must run inside a job container."
    )]
    MissingEnv(&'static str),
    #[error("Connection to orchestrator failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("Tool call failed: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("Tool '{tool}' failed: {message}")]
    ToolFailed { tool: String, message: String },
    #[error("invalid tool call response: {0}")]
    InvalidResponse(#[source] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCredentials {
    pub orchestrator_url: String,
    pub job_id: String,
    pub token: String,
}

impl WorkerCredentials {
    pub fn new(
        orchestrator_url: impl Into<String>,
        job_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            orchestrator_url: orchestrator_url.into().trim_end_matches('/').to_string(),
            job_id: job_id.into(),
            token: token.into(),
        }
    }

    pub fn from_env() -> Result<Self, ToolClientError> {
        let orchestrator_url = required_env(ORCHESTRATOR_URL_ENV)?;
        let job_id = required_env(JOB_ID_ENV)?;
        let token = required_env(WORKER_TOKEN_ENV)?;
        Ok(Self::new(orchestrator_url, job_id, token))
    }

    pub fn tools_call_url(&self) -> String {
        format!("{}/worker/{}/tools/call", self.orchestrator_url, self.job_id)
    }
}

fn required_env(name: &'static str) -> Result<String, ToolClientError> {
    env::var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or(ToolClientError::MissingEnv(name))
}

#[derive(Debug, Serialize)]
pub struct ToolCallRequest<'a> {
    pub tool_name: &'a str,
    pub parameters: &'a Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ToolCallResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    output: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Clamps a requested tool timeout to the orchestrator's upper bound.
pub fn clamp_timeout(timeout_secs: Option<u64>) -> Option<u64> {
    timeout_secs.map(|secs| secs.min(MAX_TIMEOUT_SECS))
}

/// Client-side deadline for one call: the tool timeout (absent or zero means 60 s)
/// plus a fixed grace period.
pub fn transport_timeout(timeout_secs: Option<u64>) -> Duration {
    let tool_secs = timeout_secs
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_TRANSPORT_TIMEOUT_SECS);
    Duration::from_secs(tool_secs + TRANSPORT_GRACE_SECS)
}

#[derive(Debug, Clone)]
pub struct ToolClient {
    http: reqwest::Client,
    credentials: WorkerCredentials,
}

impl ToolClient {
    pub fn new(credentials: WorkerCredentials) -> Self {
        Self {
            http: reqwest::Client::new(),
            credentials,
        }
    }

    /// Reads all connection parameters up front, failing before any network attempt.
    pub fn from_env() -> Result<Self, ToolClientError> {
        WorkerCredentials::from_env().map(Self::new)
    }

    pub fn credentials(&self) -> &WorkerCredentials {
        &self.credentials
    }

    /// Calls `name` with `params` and returns the tool output as text.
    ///
    /// `timeout_secs` is clamped to [`MAX_TIMEOUT_SECS`] before it is sent. The HTTP
    /// deadline comes from the clamped value via [`transport_timeout`], so `Some(0)`
    /// waits as long as `None`.
    pub async fn call_tool(
        &self,
        name: &str,
        params: Value,
        timeout_secs: Option<u64>,
    ) -> Result<String, ToolClientError> {
        let timeout_secs = clamp_timeout(timeout_secs);
        let parameters = if params.is_null() {
            Value::Object(Map::new())
        } else {
            params
        };
        let body = ToolCallRequest {
            tool_name: name,
            parameters: &parameters,
            timeout_secs,
        };

        debug!(tool = %name, timeout_secs = ?timeout_secs, "calling orchestrator tool");
        let response = self
            .http
            .post(self.credentials.tools_call_url())
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(&self.credentials.token)
            .timeout(transport_timeout(timeout_secs))
            .json(&body)
            .send()
            .await
            .map_err(ToolClientError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(err) => {
                    warn!(
                        tool = %name,
                        status = status.as_u16(),
                        error = %err,
                        "failed to read rejection body"
                    );
                    String::new()
                }
            };
            return Err(ToolClientError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let result: ToolCallResponse = response
            .json()
            .await
            .map_err(ToolClientError::InvalidResponse)?;

        if !result.success {
            return Err(ToolClientError::ToolFailed {
                tool: name.to_string(),
                message: result.error.unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        Ok(match result.output {
            Some(Value::String(text)) => text,
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        })
    }

    /// Runs `command` through the `shell` tool; `None` uses a 60 s timeout.
    pub async fn shell(
        &self,
        command: &str,
        timeout_secs: Option<u64>,
    ) -> Result<String, ToolClientError> {
        self.call_tool(
            "shell",
            json!({ "command": command }),
            Some(timeout_secs.unwrap_or(SHELL_TIMEOUT_SECS)),
        )
        .await
    }

    pub async fn read_file(&self, path: &str) -> Result<String, ToolClientError> {
        self.call_tool("read_file", json!({ "path": path }), None)
            .await
    }

    pub async fn write_file(&self, path: &str, content: &str) -> Result<String, ToolClientError> {
        self.call_tool(
            "write_file",
            json!({ "path": path, "content": content }),
            None,
        )
        .await
    }

    /// Fetches `url` through the `http` tool; `None` uses a 30 s timeout.
    pub async fn http_get(
        &self,
        url: &str,
        headers: Option<&BTreeMap<String, String>>,
        timeout_secs: Option<u64>,
    ) -> Result<String, ToolClientError> {
        let mut params = json!({ "url": url, "method": "GET" });
        if let Some(headers) = headers.filter(|headers| !headers.is_empty()) {
            params["headers"] = json!(headers);
        }
        self.call_tool(
            "http",
            params,
            Some(timeout_secs.unwrap_or(HTTP_GET_TIMEOUT_SECS)),
        )
            .await
    }
}
