//! Execution collaborator interface and its settings.

use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;

use crate::error::SandboxError;
use crate::validator::DEFAULT_MAX_CODE_SIZE;

/// Configuration for gating and executing snippets.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Maximum execution time before the script process is killed.
    pub timeout: Duration,
    /// Maximum size of a submitted snippet in bytes.
    pub max_code_size: usize,
    /// Maximum size of the script's output in bytes.
    pub max_output_size: usize,
    /// Heap cap handed to node, in megabytes.
    pub max_heap_mb: usize,
    /// Explicit node binary. Must be absolute; `None` searches `PATH`.
    pub node_binary: Option<PathBuf>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            max_code_size: DEFAULT_MAX_CODE_SIZE,
            max_output_size: 1024 * 1024, // 1 MB
            max_heap_mb: 64,
            node_binary: None,
        }
    }
}

/// Evaluates a snippet that has already been judged clean.
///
/// The value is the snippet's completion value as JSON.
#[async_trait::async_trait]
pub trait ScriptExecutor: Send + Sync {
    /// Run `source` to completion.
    async fn execute(&self, source: &str) -> Result<Value, SandboxError>;
}
