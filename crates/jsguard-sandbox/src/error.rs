//! Error types for the jsguard sandbox.

use jsguard_analyzer::{AnalyzeError, Verdict};
use thiserror::Error;

/// Errors that can occur while gating or executing a snippet.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SandboxError {
    /// The snippet imports denied modules.
    #[error("{}", forbidden_message(.modules))]
    ForbiddenModule {
        /// Denied module names, in discovery order.
        modules: Vec<String>,
    },

    /// The snippet contains a loop that provably never terminates.
    #[error("Infinite loop detected")]
    InfiniteLoop,

    /// The snippet, or a string it evaluates, does not parse.
    #[error("syntax error: {message}")]
    Syntax {
        /// The parser's diagnostic.
        message: String,
    },

    /// The analyzer could not reach a verdict.
    #[error("analysis failed: {0}")]
    Analysis(#[from] AnalyzeError),

    /// Code failed validation checks.
    #[error("code validation failed: {reason}")]
    ValidationFailed {
        /// What went wrong.
        reason: String,
    },

    /// Code exceeds the configured maximum size.
    #[error("code exceeds maximum size of {max} bytes (got {actual})")]
    CodeTooLarge {
        /// Maximum allowed size.
        max: usize,
        /// Actual size.
        actual: usize,
    },

    /// Execution output exceeds the configured maximum size.
    #[error("output exceeds maximum size of {max} bytes")]
    OutputTooLarge {
        /// Maximum allowed size.
        max: usize,
    },

    /// Execution timed out.
    #[error("execution timed out after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout in milliseconds.
        timeout_ms: u64,
    },

    /// A JavaScript error was thrown during execution.
    #[error("javascript error: {message}")]
    JsError {
        /// The error message from JavaScript.
        message: String,
    },

    /// Result serialization failed.
    #[error("result serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic execution failure.
    #[error("sandbox execution failed: {0}")]
    Execution(#[from] anyhow::Error),
}

impl SandboxError {
    /// The error a non-clean verdict maps to. `None` for [`Verdict::Clean`].
    pub fn from_verdict(verdict: Verdict) -> Option<Self> {
        match verdict {
            Verdict::Clean => None,
            Verdict::ForbiddenImports(modules) => Some(Self::ForbiddenModule { modules }),
            Verdict::NonTerminatingLoop => Some(Self::InfiniteLoop),
            Verdict::SyntaxError(message) => Some(Self::Syntax { message }),
        }
    }

    /// Whether the snippet was refused before it ever ran.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::ForbiddenModule { .. }
                | Self::InfiniteLoop
                | Self::Syntax { .. }
                | Self::Analysis(_)
                | Self::ValidationFailed { .. }
                | Self::CodeTooLarge { .. }
        )
    }
}

fn forbidden_message(modules: &[String]) -> String {
    match modules {
        [single] => format!("Forbidden module: {single}"),
        _ => format!("Forbidden modules: {}", modules.join(", ")),
    }
}
