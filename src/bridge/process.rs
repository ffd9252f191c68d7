//! One-shot subprocess execution for stdio backends

use std::{io::ErrorKind, process::Stdio};

use async_trait::async_trait;
use tokio::{io::AsyncWriteExt, process::Command};
use tracing::debug;

use crate::{errors::BridgeError, registry::BackendDescriptor};

/// Exit status and captured output of one backend invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Spawns `backend`, writes `input` to its stdin, closes stdin and waits for exit.
    async fn run(
        &self,
        backend: &BackendDescriptor,
        input: Vec<u8>,
    ) -> Result<ProcessOutcome, BridgeError>;
}

#[derive(Debug, Default)]
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(
        &self,
        backend: &BackendDescriptor,
        input: Vec<u8>,
    ) -> Result<ProcessOutcome, BridgeError> {
        let mut command = Command::new(&backend.command);
        command
            .args(&backend.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &backend.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| BridgeError::Spawn {
            command: backend.command.clone(),
            source,
        })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| std::io::Error::new(ErrorKind::BrokenPipe, "backend stdin unavailable"))?;

        // stdin must be written concurrently with draining stdout/stderr.
        let feed = async move {
            stdin.write_all(&input).await?;
            stdin.shutdown().await?;
            Ok::<_, std::io::Error>(())
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());

        if let Err(err) = fed {
            if err.kind() != ErrorKind::BrokenPipe {
                return Err(BridgeError::Io(err));
            }
            debug!(backend = %backend.name, "backend closed stdin before reading the request");
        }

        let output = output?;
        Ok(ProcessOutcome {
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
