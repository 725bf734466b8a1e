//! Analysis outcome.

use std::fmt;

/// The outcome of analyzing a snippet, including every nested `eval` unit.
///
/// Only [`Verdict::Clean`] allows execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Neither policy is violated.
    Clean,
    /// Denied modules are imported, in discovery order. May hold duplicates.
    ForbiddenImports(Vec<String>),
    /// A loop provably never terminates, or `eval` nesting is too deep to
    /// decide.
    NonTerminatingLoop,
    /// The snippet, or a string it evaluates, does not parse.
    SyntaxError(String),
}

impl Verdict {
    /// Whether execution may proceed.
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Clean)
    }

    /// The forbidden module names, for [`Verdict::ForbiddenImports`].
    pub fn forbidden_modules(&self) -> Option<&[String]> {
        match self {
            Self::ForbiddenImports(names) => Some(names),
            _ => None,
        }
    }

    /// Stable short label, for logs and audit records.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::ForbiddenImports(_) => "forbidden_imports",
            Self::NonTerminatingLoop => "non_terminating_loop",
            Self::SyntaxError(_) => "syntax_error",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clean => f.write_str("clean"),
            Self::ForbiddenImports(names) => {
                write!(f, "forbidden imports: {}", names.join(", "))
            }
            Self::NonTerminatingLoop => f.write_str("non-terminating loop"),
            Self::SyntaxError(msg) => write!(f, "syntax error: {msg}"),
        }
    }
}
