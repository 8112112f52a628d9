//! Desktop Core bridge
//!
//! [`NativeBridge`] implementation that talks to the `ekka-desktop-core`
//! child process over stdio (newline-delimited JSON).
//!
//! # Wire
//!
//! ```text
//! → {"id": <correlationId>, "op": "...", "v": 1, "payload": {...}}
//! ← {"id": <correlationId>, "ok": true, "result": ...}
//! ← {"id": <correlationId>, "ok": false, "error": {"code", "message", ...}}
//! ```
//!
//! # Lifecycle
//!
//! - Spawned lazily on first use (handshake or any forwarded request)
//! - A background task reads stdout and completes pending requests by `id`
//! - stderr is forwarded into tracing with ANSI codes stripped
//! - Per-request timeout; a request that times out is abandoned
//! - If the child dies it is respawned on the next request

use crate::bridge::NativeBridge;
use crate::error::BridgeError;
use crate::types::{present_value, EngineError, EngineRequest, EngineResponse};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::oneshot;

/// File name looked up next to the current executable
pub const CORE_BINARY_NAME: &str = "ekka-desktop-core";

/// Handshake op understood by Desktop Core (not part of the operation catalogue)
const HANDSHAKE_OP: &str = "engine.connect";
const GOODBYE_OP: &str = "engine.disconnect";

// =============================================================================
// Log Cleaning
// =============================================================================

/// Strip ANSI escape codes (colors, cursor movement)
fn strip_ansi_codes(s: &str) -> String {
    lazy_static::lazy_static! {
        static ref ANSI_RE: Regex = Regex::new(r"\x1b\[[0-9;]*[a-zA-Z]").unwrap();
    }
    ANSI_RE.replace_all(s, "").to_string()
}

/// Forward one line of core stderr into our own logs
fn log_core_output(line: &str) {
    let clean = strip_ansi_codes(line);
    let trimmed = clean.trim();

    if trimmed.is_empty() {
        return;
    }

    if trimmed.contains("ERROR") || trimmed.contains("error:") {
        tracing::error!(op = "core.stderr", "{}", trimmed);
    } else {
        tracing::info!(op = "core.stderr", "{}", trimmed);
    }
}

// =============================================================================
// Frames
// =============================================================================

#[derive(Debug, Serialize)]
struct CoreRequest<'a> {
    id: &'a str,
    op: &'a str,
    v: u32,
    payload: &'a Value,
}

#[derive(Debug, Deserialize)]
struct CoreResponse {
    id: String,
    ok: bool,
    #[serde(default, deserialize_with = "present_value")]
    result: Option<Value>,
    #[serde(default)]
    error: Option<EngineError>,
}

impl CoreResponse {
    fn into_envelope(self) -> EngineResponse {
        EngineResponse {
            ok: self.ok,
            result: self.result,
            error: self.error,
        }
    }
}

type Pending = Arc<Mutex<HashMap<String, oneshot::Sender<CoreResponse>>>>;

// =============================================================================
// Command
// =============================================================================

/// How to launch Desktop Core
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl CoreCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Find the Desktop Core binary
    ///
    /// Search order:
    /// 1. Explicit override (`EKKA_DESKTOP_CORE_BIN`)
    /// 2. Same directory as the current executable
    pub fn discover(override_path: Option<&Path>) -> Result<Self, BridgeError> {
        if let Some(path) = override_path {
            if path.exists() {
                return Ok(Self::new(path));
            }
            tracing::warn!(
                op = "core.binary.override_not_found",
                path = %path.display(),
                "EKKA_DESKTOP_CORE_BIN set but binary not found"
            );
        }

        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let candidate = dir.join(CORE_BINARY_NAME);
                if candidate.exists() {
                    return Ok(Self::new(candidate));
                }
            }
        }

        Err(BridgeError::Unavailable(format!(
            "{} binary not found. Install it next to this executable or set EKKA_DESKTOP_CORE_BIN.",
            CORE_BINARY_NAME
        )))
    }
}

// =============================================================================
// Process
// =============================================================================

struct CoreProcess {
    child: Child,
    stdin: ChildStdin,
    pending: Pending,
    /// Set by the reader task once stdout hits EOF
    closed: Arc<AtomicBool>,
}

impl CoreProcess {
    fn spawn(command: &CoreCommand) -> Result<Self, BridgeError> {
        tracing::info!(
            op = "core.process.spawn",
            binary = %command.program.display(),
            "Spawning Desktop Core process"
        );

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| BridgeError::Spawn(e.to_string()))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| BridgeError::Spawn("Failed to capture Core stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BridgeError::Spawn("Failed to capture Core stdout".into()))?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_stderr(stderr));
        }

        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let closed = Arc::new(AtomicBool::new(false));
        tokio::spawn(read_responses(stdout, pending.clone(), closed.clone()));

        tracing::info!(
            op = "core.process.spawned",
            pid = child.id(),
            "Desktop Core process spawned"
        );

        Ok(Self {
            child,
            stdin,
            pending,
            closed,
        })
    }

    fn is_alive(&mut self) -> bool {
        if self.closed.load(Ordering::SeqCst) {
            return false;
        }
        match self.child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                tracing::warn!(
                    op = "core.process.died",
                    status = %status,
                    "Desktop Core process died, will restart"
                );
                false
            }
            Err(_) => false,
        }
    }

    fn forget(&self, id: &str) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
    }
}

/// Reads response lines until EOF. Dropping the pending senders on exit wakes
/// every waiter with a closed channel.
async fn read_responses(stdout: ChildStdout, pending: Pending, closed: Arc<AtomicBool>) {
    let mut lines = BufReader::new(stdout).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                match serde_json::from_str::<CoreResponse>(trimmed) {
                    Ok(resp) => {
                        let waiter = pending
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .remove(&resp.id);
                        match waiter {
                            Some(tx) => {
                                let _ = tx.send(resp);
                            }
                            None => tracing::debug!(
                                op = "core.stdout.orphan",
                                id = %resp.id,
                                "Response for unknown or abandoned request"
                            ),
                        }
                    }
                    Err(e) => {
                        tracing::warn!(
                            op = "core.stdout.parse_error",
                            error = %e,
                            "Failed to parse Core response"
                        );
                    }
                }
            }
            Ok(None) => {
                tracing::warn!(op = "core.stdout.closed", "Desktop Core stdout closed");
                break;
            }
            Err(e) => {
                tracing::warn!(
                    op = "core.stdout.closed",
                    error = %e,
                    "Desktop Core stdout read failed"
                );
                break;
            }
        }
    }

    closed.store(true, Ordering::SeqCst);
    pending
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clear();
}

async fn forward_stderr(stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        log_core_output(&line);
    }
}

// =============================================================================
// Bridge
// =============================================================================

/// Native bridge backed by a Desktop Core child process
pub struct CoreProcessBridge {
    command: CoreCommand,
    timeout: Duration,
    inner: tokio::sync::Mutex<Option<CoreProcess>>,
}

impl CoreProcessBridge {
    pub fn new(command: CoreCommand, timeout: Duration) -> Self {
        Self {
            command,
            timeout,
            inner: tokio::sync::Mutex::new(None),
        }
    }

    /// Kill the child process, if any. The next request respawns it.
    pub async fn shutdown(&self) {
        let mut guard = self.inner.lock().await;
        if let Some(mut proc) = guard.take() {
            if let Err(e) = proc.child.kill().await {
                tracing::debug!(op = "core.process.kill_failed", error = %e, "Kill failed");
            }
            tracing::info!(op = "core.process.stopped", "Desktop Core process stopped");
        }
    }

    async fn send(&self, req: &EngineRequest) -> Result<EngineResponse, BridgeError> {
        let frame = CoreRequest {
            id: &req.correlation_id,
            op: &req.op,
            v: req.v,
            payload: &req.payload,
        };
        let mut line =
            serde_json::to_string(&frame).map_err(|e| BridgeError::Protocol(e.to_string()))?;
        line.push('\n');

        let (tx, rx) = oneshot::channel();

        let pending = {
            let mut guard = self.inner.lock().await;

            let alive = match guard.as_mut() {
                Some(proc) => proc.is_alive(),
                None => false,
            };
            if !alive {
                *guard = Some(CoreProcess::spawn(&self.command)?);
            }
            let proc = guard.as_mut().ok_or(BridgeError::Closed)?;

            proc.pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(req.correlation_id.clone(), tx);

            let written = async {
                proc.stdin.write_all(line.as_bytes()).await?;
                proc.stdin.flush().await
            }
            .await;
            if let Err(e) = written {
                tracing::error!(op = "core.stdin.error", error = %e, "Failed to write to Core stdin");
                proc.forget(&req.correlation_id);
                // Drop the handle; respawned on next request
                *guard = None;
                return Err(BridgeError::Io(e));
            }

            proc.pending.clone()
        };

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(resp)) => Ok(resp.into_envelope()),
            Ok(Err(_)) => Err(BridgeError::Closed),
            Err(_) => {
                pending
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(&req.correlation_id);
                tracing::error!(
                    op = "core.timeout",
                    id = %req.correlation_id,
                    op_name = %req.op,
                    secs = self.timeout.as_secs(),
                    "Desktop Core request timed out"
                );
                Err(BridgeError::Timeout {
                    op: req.op.clone(),
                    secs: self.timeout.as_secs(),
                })
            }
        }
    }
}

#[async_trait]
impl NativeBridge for CoreProcessBridge {
    async fn connect(&self) -> Result<(), BridgeError> {
        let hello = EngineRequest::new(
            HANDSHAKE_OP,
            json!({ "client": env!("CARGO_PKG_NAME"), "version": env!("CARGO_PKG_VERSION") }),
        );
        let resp = self.send(&hello).await?;
        if resp.ok {
            tracing::info!(op = "core.handshake.ok", "Desktop Core accepted handshake");
            Ok(())
        } else {
            let message = resp
                .error
                .map(|e| format!("{}: {}", e.code, e.message))
                .unwrap_or_else(|| "handshake rejected".to_string());
            Err(BridgeError::Unavailable(message))
        }
    }

    async fn request(&self, req: &EngineRequest) -> Result<EngineResponse, BridgeError> {
        self.send(req).await
    }

    async fn disconnect(&self) -> Result<(), BridgeError> {
        // Nothing to say goodbye to; never respawn just for this
        let alive = match self.inner.lock().await.as_mut() {
            Some(proc) => proc.is_alive(),
            None => false,
        };
        if !alive {
            return Ok(());
        }
        self.send(&EngineRequest::new(GOODBYE_OP, json!({}))).await?;
        Ok(())
    }
}
