#![warn(missing_docs)]

//! # jsguard-analyzer
//!
//! Static pre-execution safety analysis for untrusted JavaScript snippets.
//!
//! A snippet is judged against two policies before a host evaluates it:
//!
//! - it must not import a denied capability module (`fs`, `child_process`,
//!   `net`, ...), even when the module name or the `require` function is
//!   obfuscated through aliases, concatenation or computed member access;
//! - it must not contain a loop that provably never terminates.
//!
//! Strings the snippet passes to `eval` are parsed and judged as nested
//! units under the same policies.
//!
//! ```
//! use jsguard_analyzer::{analyze, Verdict};
//!
//! assert_eq!(analyze("1 + 1").unwrap(), Verdict::Clean);
//! assert_eq!(
//!     analyze("let m = 'f' + 's'; require(m)").unwrap(),
//!     Verdict::ForbiddenImports(vec!["fs".into()])
//! );
//! assert_eq!(analyze("while (1) {}").unwrap(), Verdict::NonTerminatingLoop);
//! ```
//!
//! The analysis is conservative in one direction only: a `Clean` verdict
//! means nothing the analyzer understands is violated. Bindings are flat per
//! unit (no scopes) and nothing is tracked across function boundaries.

mod bindings;
mod classify;
pub mod error;
mod imports;
mod loops;
pub mod ops;
mod parse;
mod resolve;
mod unit;
pub mod value;
mod verdict;
mod walk;

pub use classify::{EVAL_PRIMITIVE, IMPORT_PRIMITIVE};
pub use error::AnalyzeError;
pub use imports::{DenyList, BASE_DENIED_MODULES, UNKNOWN_MODULE};
pub use parse::{check_nesting_depth, MAX_NESTING_DEPTH};
pub use value::{Resolved, Value};
pub use verdict::Verdict;

use unit::{analyze_unit, Halt};

/// Default limit on `eval` nesting.
pub const DEFAULT_MAX_EVAL_DEPTH: usize = 16;

/// Analyzer settings.
#[derive(Debug, Clone)]
pub struct AnalyzerOptions {
    /// How many levels of `eval` strings are analyzed. A snippet nesting
    /// deeper is reported as [`Verdict::NonTerminatingLoop`].
    pub max_eval_depth: usize,
    /// Module names that may not be imported.
    pub deny_list: DenyList,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            max_eval_depth: DEFAULT_MAX_EVAL_DEPTH,
            deny_list: DenyList::default(),
        }
    }
}

/// Judges snippets under a fixed set of options.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    options: AnalyzerOptions,
}

impl Analyzer {
    /// Create an analyzer.
    pub fn new(options: AnalyzerOptions) -> Self {
        Self { options }
    }

    /// The options in use.
    pub fn options(&self) -> &AnalyzerOptions {
        &self.options
    }

    /// Analyze `source` and every string it evaluates.
    ///
    /// Loop findings take precedence over import findings. An error means
    /// no verdict could be reached; the snippet must not be executed.
    pub fn analyze(&self, source: &str) -> Result<Verdict, AnalyzeError> {
        let verdict = match analyze_unit(source, 0, &self.options) {
            Ok(findings) if findings.non_terminating => Verdict::NonTerminatingLoop,
            Ok(findings) if !findings.forbidden.is_empty() => {
                Verdict::ForbiddenImports(findings.forbidden)
            }
            Ok(_) => Verdict::Clean,
            Err(Halt::Syntax(message)) => Verdict::SyntaxError(message),
            Err(Halt::Error(err)) => {
                tracing::debug!(error = %err, code_len = source.len(), "analysis failed");
                return Err(err);
            }
        };
        tracing::debug!(
            verdict = verdict.label(),
            code_len = source.len(),
            "analysis complete"
        );
        Ok(verdict)
    }
}

/// Analyze `source` with default options.
pub fn analyze(source: &str) -> Result<Verdict, AnalyzeError> {
    Analyzer::default().analyze(source)
}
