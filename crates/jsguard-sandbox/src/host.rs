//! NodeExecutor: runs clean snippets in a `node` child process.
//!
//! The snippet is written to the child's stdin and evaluated by a small
//! wrapper script, which prints a per-run marker followed by the JSON result.
//! Everything the snippet prints before the marker is console output and is
//! forwarded to `tracing`.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};

use crate::error::SandboxError;
use crate::executor::{SandboxConfig, ScriptExecutor};

#[cfg(windows)]
const NODE_BINARY_NAME: &str = "node.exe";
#[cfg(not(windows))]
const NODE_BINARY_NAME: &str = "node";

/// Target under which script console output is logged.
pub const SCRIPT_LOG_TARGET: &str = "jsguard::sandbox::script";

const MARKER_PLACEHOLDER: &str = "__JSGUARD_MARKER__";

/// Reads the snippet from stdin, evaluates it in global scope, awaits a
/// returned promise and reports `{ok}` or `{error}` after the marker.
const WRAPPER: &str = r#"'use strict';
const marker = '__JSGUARD_MARKER__';
const chunks = [];
const describe = (e) => String(e && e.message !== undefined ? e.message : e);
const finish = (out) => {
  let json;
  try {
    json = JSON.stringify(out);
  } catch (e) {
    json = JSON.stringify({ error: 'result is not serializable: ' + describe(e) });
  }
  process.stdout.write('\n' + marker + json + '\n', () => process.exit(0));
};
process.stdin.on('data', (chunk) => chunks.push(chunk));
process.stdin.on('end', () => {
  const source = Buffer.concat(chunks).toString('utf8');
  let value;
  try {
    value = (0, eval)(source);
  } catch (e) {
    finish({ error: describe(e) });
    return;
  }
  Promise.resolve(value).then(
    (v) => finish({ ok: v === undefined ? null : v }),
    (e) => finish({ error: describe(e) }),
  );
});
"#;

#[derive(Debug, Deserialize)]
struct WrapperOutput {
    #[serde(default)]
    ok: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

struct RawOutput {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

/// Executes snippets with a `node` binary resolved once at construction.
#[derive(Debug, Clone)]
pub struct NodeExecutor {
    binary: PathBuf,
    timeout: Duration,
    max_heap_mb: usize,
    max_output_size: usize,
}

impl NodeExecutor {
    /// Resolve the node binary and capture the execution limits.
    ///
    /// The binary is either `config.node_binary` (must be absolute) or the
    /// first `node` found in an absolute `PATH` entry. World-writable
    /// binaries are refused on Unix.
    pub fn new(config: &SandboxConfig) -> Result<Self, SandboxError> {
        let binary = find_node_binary(config.node_binary.as_deref())?;
        tracing::info!(binary = %binary.display(), "node executor ready");
        Ok(Self {
            binary,
            timeout: config.timeout,
            max_heap_mb: config.max_heap_mb,
            max_output_size: config.max_output_size,
        })
    }

    /// The resolved node binary.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn spawn(&self, wrapper: &str) -> Result<Child, SandboxError> {
        Command::new(&self.binary)
            .arg(format!("--max-old-space-size={}", self.max_heap_mb))
            .arg("-e")
            .arg(wrapper)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .env_clear()
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                SandboxError::Execution(anyhow::anyhow!(
                    "failed to spawn node at {}: {}",
                    self.binary.display(),
                    e
                ))
            })
    }
}

#[async_trait::async_trait]
impl ScriptExecutor for NodeExecutor {
    async fn execute(&self, source: &str) -> Result<Value, SandboxError> {
        let marker = format!("__jsguard_result_{}__", uuid::Uuid::new_v4().simple());
        let mut child = self.spawn(&WRAPPER.replace(MARKER_PLACEHOLDER, &marker))?;

        let outcome = tokio::time::timeout(
            self.timeout,
            drive(&mut child, source, self.max_output_size),
        )
        .await;

        let raw = match outcome {
            Ok(inner) => inner?,
            Err(_elapsed) => {
                let _ = child.kill().await;
                return Err(SandboxError::Timeout {
                    timeout_ms: self.timeout.as_millis() as u64,
                });
            }
        };

        let stderr = String::from_utf8_lossy(&raw.stderr);
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            tracing::warn!(target: SCRIPT_LOG_TARGET, "{}", line);
        }

        let stdout = String::from_utf8_lossy(&raw.stdout);
        interpret_output(&stdout, &marker).unwrap_or_else(|| {
            Err(SandboxError::JsError {
                message: crash_message(raw.status, &stderr),
            })
        })
    }
}

/// Feed the snippet, collect bounded output and wait for exit.
async fn drive(child: &mut Child, source: &str, limit: usize) -> Result<RawOutput, SandboxError> {
    let io_error = |what: &str, e: std::io::Error| {
        SandboxError::Execution(anyhow::anyhow!("{what}: {e}"))
    };

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| SandboxError::Execution(anyhow::anyhow!("no stdin on child")))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| SandboxError::Execution(anyhow::anyhow!("no stdout on child")))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| SandboxError::Execution(anyhow::anyhow!("no stderr on child")))?;

    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        let _ = stderr.take(limit as u64).read_to_end(&mut buf).await;
        buf
    });

    stdin
        .write_all(source.as_bytes())
        .await
        .map_err(|e| io_error("failed to send script to node", e))?;
    drop(stdin);

    let mut out = Vec::new();
    stdout
        .take(limit as u64 + 1)
        .read_to_end(&mut out)
        .await
        .map_err(|e| io_error("failed to read node output", e))?;
    if out.len() > limit {
        let _ = child.kill().await;
        return Err(SandboxError::OutputTooLarge { max: limit });
    }

    let status = child
        .wait()
        .await
        .map_err(|e| io_error("failed to wait for node", e))?;
    let err = stderr_task.await.unwrap_or_default();

    Ok(RawOutput {
        status,
        stdout: out,
        stderr: err,
    })
}

/// Split console output from the marked result. `None` when the wrapper
/// never reported.
fn interpret_output(stdout: &str, marker: &str) -> Option<Result<Value, SandboxError>> {
    let at = stdout.rfind(marker)?;
    let (console, tail) = stdout.split_at(at);

    for line in console.lines().filter(|l| !l.trim().is_empty()) {
        tracing::info!(target: SCRIPT_LOG_TARGET, "{}", line);
    }

    let json = tail[marker.len()..].lines().next().unwrap_or_default();
    let parsed: WrapperOutput = match serde_json::from_str(json) {
        Ok(parsed) => parsed,
        Err(e) => return Some(Err(SandboxError::Serialization(e))),
    };
    Some(match parsed.error {
        Some(message) => Err(SandboxError::JsError { message }),
        None => Ok(parsed.ok.unwrap_or(Value::Null)),
    })
}

fn crash_message(status: ExitStatus, stderr: &str) -> String {
    if stderr.contains("heap out of memory") {
        return "JavaScript heap out of memory".into();
    }
    match stderr.lines().rev().find(|l| !l.trim().is_empty()) {
        Some(line) => format!("node exited with {status}: {}", line.trim()),
        None => format!("node exited with {status} without a result"),
    }
}

/// Locate the node binary.
///
/// Search order:
/// 1. The configured path (must be absolute)
/// 2. Absolute entries of `PATH`, in order
fn find_node_binary(explicit: Option<&Path>) -> Result<PathBuf, SandboxError> {
    if let Some(path) = explicit {
        if !path.is_absolute() {
            return Err(SandboxError::Execution(anyhow::anyhow!(
                "node binary must be an absolute path, got: {}",
                path.display()
            )));
        }
        if !path.is_file() {
            return Err(SandboxError::Execution(anyhow::anyhow!(
                "node binary not found at {}",
                path.display()
            )));
        }
        validate_binary_permissions(path)?;
        return Ok(path.to_path_buf());
    }

    let search = std::env::var_os("PATH").unwrap_or_default();
    for dir in std::env::split_paths(&search).filter(|d| d.is_absolute()) {
        let candidate = dir.join(NODE_BINARY_NAME);
        if candidate.is_file() {
            validate_binary_permissions(&candidate)?;
            return Ok(candidate);
        }
    }

    Err(SandboxError::Execution(anyhow::anyhow!(
        "node binary not found on PATH. Install node or set [executor] node_binary"
    )))
}

/// Rejects world-writable binaries (Unix only).
fn validate_binary_permissions(_path: &Path) -> Result<(), SandboxError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let metadata = std::fs::metadata(_path).map_err(|e| {
            SandboxError::Execution(anyhow::anyhow!(
                "cannot read metadata for {}: {}",
                _path.display(),
                e
            ))
        })?;
        let mode = metadata.permissions().mode();
        if mode & 0o002 != 0 {
            return Err(SandboxError::Execution(anyhow::anyhow!(
                "insecure permissions on node binary {}: mode {:o} is world-writable",
                _path.display(),
                mode,
            )));
        }
    }
    Ok(())
}
