//! Error types for the analyzer.

use thiserror::Error;

/// Errors that prevent the analyzer from reaching a verdict.
///
/// Policy violations are not errors; they are reported through
/// [`Verdict`](crate::Verdict). An `AnalyzeError` means the snippet could not
/// be judged at all and must never be executed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum AnalyzeError {
    /// The operator evaluator has no entry for this operator symbol.
    #[error("unsupported operator: `{operator}`")]
    UnsupportedOperator {
        /// The operator symbol as written in source.
        operator: String,
    },

    /// Source nesting exceeds what the analyzer is willing to walk.
    #[error("nesting depth {actual} exceeds maximum {max}")]
    NestingTooDeep {
        /// Maximum allowed nesting depth.
        max: usize,
        /// Depth at which the analyzer gave up.
        actual: usize,
    },
}
