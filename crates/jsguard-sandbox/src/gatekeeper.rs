//! The policy orchestrator: validate, analyze, then execute.

use std::sync::Arc;

use jsguard_analyzer::{Analyzer, Verdict};
use serde_json::Value;

use crate::audit::{AuditLogger, NoopAuditLogger, RunAudit};
use crate::env::EnvScope;
use crate::error::SandboxError;
use crate::executor::{SandboxConfig, ScriptExecutor};
use crate::host::NodeExecutor;
use crate::validator::validate_code;

/// Runs a snippet only when the analyzer judges it clean.
pub struct Gatekeeper {
    analyzer: Analyzer,
    executor: Arc<dyn ScriptExecutor>,
    max_code_size: usize,
    audit_logger: Arc<dyn AuditLogger>,
}

impl Gatekeeper {
    /// Create a gatekeeper around any executor.
    pub fn new(analyzer: Analyzer, executor: Arc<dyn ScriptExecutor>, max_code_size: usize) -> Self {
        Self {
            analyzer,
            executor,
            max_code_size,
            audit_logger: Arc::new(NoopAuditLogger),
        }
    }

    /// Create a gatekeeper backed by a [`NodeExecutor`].
    pub fn with_node(analyzer: Analyzer, config: &SandboxConfig) -> Result<Self, SandboxError> {
        let executor = NodeExecutor::new(config)?;
        Ok(Self::new(analyzer, Arc::new(executor), config.max_code_size))
    }

    /// Replace the audit logger.
    pub fn with_audit_logger(mut self, logger: Arc<dyn AuditLogger>) -> Self {
        self.audit_logger = logger;
        self
    }

    /// Validate and analyze `code` without running it.
    pub fn check(&self, code: &str) -> Result<Verdict, SandboxError> {
        validate_code(code, self.max_code_size)?;
        Ok(self.analyzer.analyze(code)?)
    }

    /// Validate, analyze and, if clean, execute `code`.
    ///
    /// A policy violation surfaces as [`SandboxError::ForbiddenModule`],
    /// [`SandboxError::InfiniteLoop`] or [`SandboxError::Syntax`]; the snippet
    /// is never executed in those cases. Execution happens with the host
    /// environment cleared.
    pub async fn run(&self, code: &str) -> Result<Value, SandboxError> {
        tracing::info!(code_len = code.len(), "run: starting");

        let mut audit = RunAudit::start(code);
        let result = self.gate_and_execute(code, &mut audit).await;

        let entry = audit.finish(&result);
        self.audit_logger.log(&entry).await;

        match &result {
            Ok(_) => tracing::info!(total_ms = entry.total_ms, "run: complete"),
            Err(e) if e.is_rejection() => tracing::warn!(reason = %e, "run: rejected"),
            Err(e) => tracing::warn!(error = %e, "run: failed"),
        }

        result
    }

    async fn gate_and_execute(
        &self,
        code: &str,
        audit: &mut RunAudit,
    ) -> Result<Value, SandboxError> {
        let verdict = self.check(code)?;
        audit.gated(&verdict);
        if let Some(rejection) = SandboxError::from_verdict(verdict) {
            return Err(rejection);
        }

        let _env = EnvScope::enter().await;
        self.executor.execute(code).await
    }
}
