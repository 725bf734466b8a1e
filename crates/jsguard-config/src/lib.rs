#![warn(missing_docs)]

//! # jsguard-config
//!
//! Configuration loading for jsguard.
//!
//! Supports TOML configuration files with environment variable expansion.
//! Every setting is optional; absent values fall back to the library
//! defaults.
//!
//! ## Example
//!
//! ```toml
//! [analyzer]
//! max_eval_depth = 16
//! max_code_size = 65536
//! extra_denied_modules = ["worker_threads", "node:worker_threads"]
//!
//! [executor]
//! node_binary = "${HOME}/.local/bin/node"
//! timeout_secs = 5
//! max_heap_mb = 64
//! max_output_size_kb = 1024
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Why a configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read jsguard config: {0}")]
    Io(#[from] std::io::Error),

    /// The text is not TOML of the expected shape.
    #[error("malformed jsguard config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid jsguard config: {0}")]
    Invalid(String),
}

/// Top-level jsguard configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsguardConfig {
    /// Static analysis settings.
    #[serde(default)]
    pub analyzer: AnalyzerOverrides,

    /// Script execution settings.
    #[serde(default)]
    pub executor: ExecutorOverrides,
}

/// Analyzer configuration overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzerOverrides {
    /// How many levels of nested `eval` strings are analyzed.
    #[serde(default)]
    pub max_eval_depth: Option<usize>,

    /// Maximum snippet size in bytes.
    #[serde(default)]
    pub max_code_size: Option<usize>,

    /// Module names denied on top of the built-in list.
    #[serde(default)]
    pub extra_denied_modules: Vec<String>,
}

/// Executor configuration overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecutorOverrides {
    /// Absolute path of the node binary. Searched on `PATH` when absent.
    #[serde(default)]
    pub node_binary: Option<PathBuf>,

    /// Execution timeout in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Heap cap for the script process, in megabytes.
    #[serde(default)]
    pub max_heap_mb: Option<usize>,

    /// Maximum script output, in kilobytes.
    #[serde(default)]
    pub max_output_size_kb: Option<usize>,
}

impl JsguardConfig {
    /// Parse and validate TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate().map(|()| config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml(&std::fs::read_to_string(path)?)
    }

    /// Like [`from_toml`](Self::from_toml), after substituting `${VAR}`
    /// with the environment.
    pub fn from_toml_with_env(text: &str) -> Result<Self, ConfigError> {
        Self::from_toml(&expand_env_vars(text))
    }

    /// Like [`from_file`](Self::from_file), after substituting `${VAR}`.
    pub fn from_file_with_env(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml_with_env(&std::fs::read_to_string(path)?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("analyzer.max_code_size", self.analyzer.max_code_size),
            ("executor.max_heap_mb", self.executor.max_heap_mb),
            ("executor.max_output_size_kb", self.executor.max_output_size_kb),
        ];
        for (key, value) in positive {
            if value == Some(0) {
                return Err(ConfigError::Invalid(format!("{key} must be greater than 0")));
            }
        }
        if self.executor.timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "executor.timeout_secs must be greater than 0".into(),
            ));
        }

        if let Some(binary) = &self.executor.node_binary {
            if !binary.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "executor.node_binary must be an absolute path, got '{}'",
                    binary.display()
                )));
            }
        }

        if let Some(name) = self
            .analyzer
            .extra_denied_modules
            .iter()
            .find(|name| name.trim().is_empty() || name.trim() != name.as_str())
        {
            return Err(ConfigError::Invalid(format!(
                "analyzer.extra_denied_modules: '{name}' is not a module name"
            )));
        }
        Ok(())
    }
}

/// Replace each `${NAME}` with the value of environment variable `NAME`.
/// Unset variables and an unterminated `${` are left as written.
fn expand_env_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pieces = input.split("${");
    out.push_str(pieces.next().unwrap_or_default());

    for piece in pieces {
        let Some((name, tail)) = piece.split_once('}') else {
            out.push_str("${");
            out.push_str(piece);
            continue;
        };
        match std::env::var(name) {
            Ok(value) => out.push_str(&value),
            Err(_) => {
                out.push_str("${");
                out.push_str(name);
                out.push('}');
            }
        }
        out.push_str(tail);
    }
    out
}
