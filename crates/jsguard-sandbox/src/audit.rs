//! Audit trail for gated runs.
//!
//! [`Gatekeeper::run`](crate::Gatekeeper::run) produces one [`AuditEntry`]
//! per snippet, whether it was executed or refused. An entry identifies the
//! code by fingerprint, records what the gate decided and how the run ended.
//! Backends implement [`AuditLogger`]; [`JsonLinesAuditLogger`] appends one
//! JSON object per line to any `AsyncWrite`.

use std::time::Instant;

use chrono::{DateTime, Utc};
use jsguard_analyzer::Verdict;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::SandboxError;

/// Characters of source kept in [`CodeFingerprint::preview`].
const PREVIEW_CHARS: usize = 500;

/// One gated run.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    /// Random per-run identifier.
    pub run_id: Uuid,
    /// Wall-clock start of the run.
    pub started_at: DateTime<Utc>,
    /// Which snippet was submitted.
    pub code: CodeFingerprint,
    /// The analyzer's decision. Absent when validation or analysis failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gate: Option<GateRecord>,
    /// Milliseconds from submission to completion.
    pub total_ms: u64,
    /// Bytes of the serialized result, zero unless the run succeeded.
    pub result_bytes: usize,
    /// How the run ended.
    pub outcome: AuditOutcome,
}

/// Identifies submitted code without storing all of it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CodeFingerprint {
    /// Hex SHA-256 of the source.
    pub sha256: String,
    /// Source length in bytes.
    pub bytes: usize,
    /// Leading characters, for human review.
    pub preview: String,
}

impl CodeFingerprint {
    /// Fingerprint `code`.
    pub fn of(code: &str) -> Self {
        Self {
            sha256: sha256_hex(code),
            bytes: code.len(),
            preview: preview(code),
        }
    }
}

/// What the static gate decided.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GateRecord {
    /// [`Verdict::label`] of the decision.
    pub verdict: &'static str,
    /// Denied names found, in report order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub forbidden_modules: Vec<String>,
    /// Milliseconds spent validating and analyzing.
    pub analysis_ms: u64,
}

/// How a gated run ended.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum AuditOutcome {
    /// Executed; a result was returned.
    Success,
    /// Refused before execution.
    Rejected {
        /// Display form of the refusal.
        reason: String,
    },
    /// Execution failed, or the host could not run the snippet.
    Error {
        /// Display form of the failure.
        message: String,
    },
    /// Killed at the deadline.
    Timeout,
}

impl AuditOutcome {
    fn from_result(result: &Result<Value, SandboxError>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(SandboxError::Timeout { .. }) => Self::Timeout,
            Err(e) if e.is_rejection() => Self::Rejected {
                reason: e.to_string(),
            },
            Err(e) => Self::Error {
                message: e.to_string(),
            },
        }
    }

    /// Stable lowercase name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Rejected { .. } => "rejected",
            Self::Error { .. } => "error",
            Self::Timeout => "timeout",
        }
    }
}

/// Destination for audit entries.
#[async_trait::async_trait]
pub trait AuditLogger: Send + Sync {
    /// Record `entry`. Failures are logged, never returned.
    async fn log(&self, entry: &AuditEntry);
}

/// Appends entries as JSON lines.
pub struct JsonLinesAuditLogger<W> {
    sink: Mutex<W>,
}

impl<W: AsyncWrite + Unpin + Send> JsonLinesAuditLogger<W> {
    /// Log to `sink`.
    pub fn new(sink: W) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }

    /// Give back the sink.
    pub fn into_inner(self) -> W {
        self.sink.into_inner()
    }
}

#[async_trait::async_trait]
impl<W: AsyncWrite + Unpin + Send + 'static> AuditLogger for JsonLinesAuditLogger<W> {
    async fn log(&self, entry: &AuditEntry) {
        let mut bytes = match serde_json::to_vec(entry) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, run_id = %entry.run_id, "audit entry not serializable");
                return;
            }
        };
        bytes.push(b'\n');

        let mut sink = self.sink.lock().await;
        let written = async {
            sink.write_all(&bytes).await?;
            sink.flush().await
        };
        if let Err(e) = written.await {
            tracing::warn!(error = %e, run_id = %entry.run_id, "audit entry not written");
        }
    }
}

/// Discards entries.
pub struct NoopAuditLogger;

#[async_trait::async_trait]
impl AuditLogger for NoopAuditLogger {
    async fn log(&self, _entry: &AuditEntry) {}
}

/// Emits each entry as an `INFO` event tagged `audit = true`.
pub struct TracingAuditLogger;

#[async_trait::async_trait]
impl AuditLogger for TracingAuditLogger {
    async fn log(&self, entry: &AuditEntry) {
        let gate = entry.gate.as_ref();
        tracing::info!(
            audit = true,
            run_id = %entry.run_id,
            sha256 = %entry.code.sha256,
            code_bytes = entry.code.bytes,
            verdict = gate.map_or("none", |g| g.verdict),
            forbidden = ?gate.map(|g| &g.forbidden_modules),
            total_ms = entry.total_ms,
            outcome = entry.outcome.label(),
            "gated run"
        );
    }
}

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &str) -> String {
    format!("{:x}", Sha256::digest(data.as_bytes()))
}

fn preview(code: &str) -> String {
    match code.char_indices().nth(PREVIEW_CHARS) {
        None => code.to_string(),
        Some((cut, _)) => format!("{}…", &code[..cut]),
    }
}

fn millis_since(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Collects an [`AuditEntry`] while a run is in flight.
pub struct RunAudit {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    started: Instant,
    code: CodeFingerprint,
    gate: Option<GateRecord>,
}

impl RunAudit {
    /// Begin auditing a run of `code`.
    pub fn start(code: &str) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            started: Instant::now(),
            code: CodeFingerprint::of(code),
            gate: None,
        }
    }

    /// Note the gate's decision.
    pub fn gated(&mut self, verdict: &Verdict) {
        self.gate = Some(GateRecord {
            verdict: verdict.label(),
            forbidden_modules: verdict.forbidden_modules().map(<[_]>::to_vec).unwrap_or_default(),
            analysis_ms: millis_since(self.started),
        });
    }

    /// Close the entry with the run's result.
    pub fn finish(self, result: &Result<Value, SandboxError>) -> AuditEntry {
        let result_bytes = match result {
            Ok(value) => serde_json::to_vec(value).map_or(0, |v| v.len()),
            Err(_) => 0,
        };
        AuditEntry {
            run_id: self.run_id,
            started_at: self.started_at,
            total_ms: millis_since(self.started),
            code: self.code,
            gate: self.gate,
            result_bytes,
            outcome: AuditOutcome::from_result(result),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(outcome: AuditOutcome) -> AuditEntry {
        AuditEntry {
            run_id: Uuid::nil(),
            started_at: Utc::now(),
            code: CodeFingerprint::of("1 + 1"),
            gate: Some(GateRecord {
                verdict: "clean",
                forbidden_modules: Vec::new(),
                analysis_ms: 1,
            }),
            total_ms: 42,
            result_bytes: 1,
            outcome,
        }
    }

    #[test]
    fn fingerprint_hashes_and_measures() {
        let fp = CodeFingerprint::of("hello");
        assert_eq!(
            fp.sha256,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(fp.bytes, 5);
        assert_eq!(fp.preview, "hello");
    }

    #[test]
    fn preview_counts_characters() {
        let exact = "é".repeat(PREVIEW_CHARS);
        assert_eq!(preview(&exact), exact);

        let long = format!("{}{}", "é".repeat(PREVIEW_CHARS), "tail");
        let cut = preview(&long);
        assert_eq!(cut.chars().count(), PREVIEW_CHARS + 1);
        assert!(cut.ends_with("é…"));
    }

    #[test]
    fn success_records_result_size() {
        let mut audit = RunAudit::start("[1]");
        audit.gated(&Verdict::Clean);
        let entry = audit.finish(&Ok(serde_json::json!([1])));

        assert_eq!(entry.result_bytes, 3);
        assert_eq!(entry.gate.as_ref().map(|g| g.verdict), Some("clean"));
        assert!(matches!(entry.outcome, AuditOutcome::Success));
        assert_ne!(entry.run_id, Uuid::nil());
    }

    #[test]
    fn rejection_keeps_forbidden_modules() {
        let verdict = Verdict::ForbiddenImports(vec!["fs".into(), "unknown".into()]);
        let mut audit = RunAudit::start("require('fs'); require(x())");
        audit.gated(&verdict);
        let err = SandboxError::from_verdict(verdict).unwrap();
        let entry = audit.finish(&Err(err));

        let gate = entry.gate.unwrap();
        assert_eq!(gate.verdict, "forbidden_imports");
        assert_eq!(gate.forbidden_modules, vec!["fs", "unknown"]);
        assert_eq!(entry.result_bytes, 0);
        assert!(matches!(
            &entry.outcome,
            AuditOutcome::Rejected { reason } if reason == "Forbidden modules: fs, unknown"
        ));
    }

    #[test]
    fn failures_without_a_gate_record() {
        let entry = RunAudit::start("x").finish(&Err(SandboxError::Timeout { timeout_ms: 5 }));
        assert!(entry.gate.is_none());
        assert_eq!(entry.outcome.label(), "timeout");

        let entry = RunAudit::start("x").finish(&Err(SandboxError::JsError {
            message: "x is not defined".into(),
        }));
        assert!(
            matches!(&entry.outcome, AuditOutcome::Error { message } if message.contains("x is not defined"))
        );
    }

    #[tokio::test]
    async fn json_lines_one_object_per_entry() {
        let logger = JsonLinesAuditLogger::new(Vec::<u8>::new());
        logger.log(&entry(AuditOutcome::Success)).await;
        logger
            .log(&entry(AuditOutcome::Rejected {
                reason: "Infinite loop detected".into(),
            }))
            .await;

        let output = String::from_utf8(logger.into_inner()).unwrap();
        let lines: Vec<Value> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["run_id"], Uuid::nil().to_string());
        assert_eq!(lines[0]["code"]["bytes"], 5);
        assert_eq!(lines[0]["gate"]["verdict"], "clean");
        assert!(lines[0]["gate"].get("forbidden_modules").is_none());
        assert_eq!(lines[0]["outcome"], "success");
        assert_eq!(lines[1]["outcome"]["rejected"]["reason"], "Infinite loop detected");
    }

    #[tokio::test]
    async fn tracing_and_noop_loggers_accept_entries() {
        let mut timed_out = entry(AuditOutcome::Timeout);
        timed_out.gate = None;
        TracingAuditLogger.log(&timed_out).await;
        NoopAuditLogger.log(&timed_out).await;
    }
}
