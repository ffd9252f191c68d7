//! HTTP-to-stdio bridge
//!
//! Each inbound JSON-RPC payload becomes exactly one backend process: the request is
//! written as a single newline-terminated line, stdin is closed, and the single JSON
//! document the backend prints before exiting becomes the HTTP response.
//!
//! Outcomes are classified in priority order:
//!
//! * internal failure (bad inbound JSON, spawn or pipe errors, non-zero exit) → 500, `-32603`
//! * parse failure (exit 0 but stdout is not JSON) → 500, `-32700`
//! * success → 200 with the backend's JSON passed through untouched

pub mod process;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::{
    errors::BridgeError,
    mcp::{
        audit::redact_params,
        rpc::{inbound_request_id, json_rpc_error, request_method},
    },
    registry::BackendDescriptor,
};

pub use process::{ProcessOutcome, ProcessRunner, TokioProcessRunner};

/// HTTP status and JSON body produced for one bridged request.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeReply {
    pub status: StatusCode,
    pub body: Value,
}

impl BridgeReply {
    fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    fn failure(id: Option<Value>, err: &BridgeError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: json_rpc_error(id, err.code(), &err.to_string()),
        }
    }
}

impl IntoResponse for BridgeReply {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[derive(Clone)]
pub struct Bridge {
    backend: Arc<BackendDescriptor>,
    runner: Arc<dyn ProcessRunner>,
}

impl Bridge {
    pub fn new(backend: Arc<BackendDescriptor>, runner: Arc<dyn ProcessRunner>) -> Self {
        Self { backend, runner }
    }

    pub fn backend(&self) -> &BackendDescriptor {
        &self.backend
    }

    pub async fn handle(&self, raw_body: &[u8]) -> BridgeReply {
        let request: Value = match serde_json::from_slice(raw_body) {
            Ok(value) => value,
            Err(err) => return self.reject(None, BridgeError::InvalidRequest(err)),
        };

        let request_id = inbound_request_id(&request);
        info!(
            backend = %self.backend.name,
            method = request_method(&request).unwrap_or("<none>"),
            params = %redact_params(request.get("params")),
            "forwarding request to backend"
        );

        match self.forward(&request).await {
            Ok(response) => BridgeReply::ok(response),
            Err(err) => self.reject(request_id, err),
        }
    }

    async fn forward(&self, request: &Value) -> Result<Value, BridgeError> {
        let mut line = serde_json::to_vec(request).map_err(BridgeError::InvalidRequest)?;
        line.push(b'\n');

        let outcome = self.runner.run(&self.backend, line).await?;
        info!(
            backend = %self.backend.name,
            exit_code = ?outcome.exit_code,
            stdout_bytes = outcome.stdout.len(),
            stderr_bytes = outcome.stderr.len(),
            "backend exited"
        );

        if !outcome.success() {
            return Err(BridgeError::process_failed(
                outcome.exit_code,
                &outcome.stderr,
            ));
        }

        serde_json::from_slice(&outcome.stdout).map_err(|err| {
            warn!(
                backend = %self.backend.name,
                raw_stdout = %String::from_utf8_lossy(&outcome.stdout),
                "backend output is not valid JSON"
            );
            BridgeError::MalformedResponse(err)
        })
    }

    fn reject(&self, id: Option<Value>, err: BridgeError) -> BridgeReply {
        error!(
            backend = %self.backend.name,
            kind = err.kind(),
            code = err.code(),
            error = %err,
            "bridged request failed"
        );
        BridgeReply::failure(id, &err)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;

    struct ScriptedRunner {
        outcome: Result<ProcessOutcome, fn() -> BridgeError>,
        calls: AtomicUsize,
        last_input: Mutex<Vec<u8>>,
    }

    impl ScriptedRunner {
        fn exits(exit_code: Option<i32>, stdout: &str, stderr: &str) -> Arc<Self> {
            Arc::new(Self {
                outcome: Ok(ProcessOutcome {
                    exit_code,
                    stdout: stdout.as_bytes().to_vec(),
                    stderr: stderr.as_bytes().to_vec(),
                }),
                calls: AtomicUsize::new(0),
                last_input: Mutex::new(Vec::new()),
            })
        }

        fn fails(error: fn() -> BridgeError) -> Arc<Self> {
            Arc::new(Self {
                outcome: Err(error),
                calls: AtomicUsize::new(0),
                last_input: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ProcessRunner for ScriptedRunner {
        async fn run(
            &self,
            _backend: &BackendDescriptor,
            input: Vec<u8>,
        ) -> Result<ProcessOutcome, BridgeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_input.lock().expect("input lock") = input;
            match &self.outcome {
                Ok(outcome) => Ok(outcome.clone()),
                Err(make_error) => Err(make_error()),
            }
        }
    }

    fn bridge(runner: Arc<ScriptedRunner>) -> Bridge {
        Bridge::new(Arc::new(BackendDescriptor::new("test", "backend")), runner)
    }

    #[tokio::test]
    async fn success_passes_backend_json_through() {
        let runner = ScriptedRunner::exits(
            Some(0),
            "{\"jsonrpc\":\"2.0\",\"id\":9,\"error\":{\"code\":-32601,\"message\":\"nope\"}}\n",
            "",
        );

        let reply = bridge(runner.clone())
            .handle(br#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#)
            .await;

        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["id"], 9);
        assert_eq!(reply.body["error"]["code"], -32601);
        assert_eq!(runner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn request_is_written_as_single_terminated_line() {
        let runner = ScriptedRunner::exits(Some(0), "{}", "");

        bridge(runner.clone())
            .handle(b"{\n  \"jsonrpc\": \"2.0\",\n  \"id\": 1,\n  \"method\": \"ping\"\n}")
            .await;

        let input = runner.last_input.lock().expect("input lock").clone();
        let text = String::from_utf8(input).expect("utf8 input");
        assert!(text.ends_with('\n'));
        assert_eq!(text.matches('\n').count(), 1);
        let echoed: Value = serde_json::from_str(text.trim_end()).expect("valid json line");
        assert_eq!(echoed, json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}));
    }

    #[tokio::test]
    async fn non_zero_exit_reports_stderr_with_inbound_id() {
        let runner = ScriptedRunner::exits(Some(1), "", "ModuleNotFoundError: mcp\n");

        let reply = bridge(runner)
            .handle(br#"{"jsonrpc":"2.0","id":"abc","method":"initialize"}"#)
            .await;

        assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(reply.body["id"], "abc");
        assert_eq!(reply.body["error"]["code"], -32603);
        assert_eq!(reply.body["error"]["message"], "ModuleNotFoundError: mcp\n");
    }

    #[tokio::test]
    async fn signal_termination_counts_as_process_failure() {
        let runner = ScriptedRunner::exits(None, "{}", "");

        let reply = bridge(runner)
            .handle(br#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#)
            .await;

        assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(reply.body["error"]["message"], "Process failed");
    }

    #[tokio::test]
    async fn missing_inbound_id_is_echoed_as_null() {
        let runner = ScriptedRunner::exits(Some(3), "", "");

        let reply = bridge(runner)
            .handle(br#"{"jsonrpc":"2.0","method":"ping"}"#)
            .await;

        assert_eq!(reply.body.get("id"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn non_json_stdout_is_a_parse_error() {
        let runner = ScriptedRunner::exits(Some(0), "Starting server...\n", "");

        let reply = bridge(runner)
            .handle(br#"{"jsonrpc":"2.0","id":5,"method":"tools/list"}"#)
            .await;

        assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(reply.body["id"], 5);
        assert_eq!(reply.body["error"]["code"], -32700);
        let message = reply.body["error"]["message"].as_str().expect("message");
        assert!(message.starts_with("Parse error: "));
    }

    #[tokio::test]
    async fn malformed_inbound_json_never_spawns() {
        let runner = ScriptedRunner::exits(Some(0), "{}", "");

        let reply = bridge(runner.clone()).handle(b"{\"jsonrpc\":").await;

        assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(reply.body.get("id").is_none());
        assert_eq!(reply.body["error"]["code"], -32603);
        assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn spawn_failure_reports_error_description() {
        let runner = ScriptedRunner::fails(|| BridgeError::Spawn {
            command: "python".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        });

        let reply = bridge(runner)
            .handle(br#"{"jsonrpc":"2.0","id":11,"method":"initialize"}"#)
            .await;

        assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(reply.body["id"], 11);
        assert_eq!(reply.body["error"]["code"], -32603);
        assert_eq!(
            reply.body["error"]["message"],
            "failed to spawn backend `python`: not found"
        );
    }
}
