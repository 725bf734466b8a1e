//! Parsing of analysis units.
//!
//! Snippets are parsed as classic scripts, the same way the host later
//! evaluates them. Any diagnostic makes the unit unparseable: a partial AST
//! is never analyzed.

use oxc_allocator::Allocator;
use oxc_ast::ast::Program;
use oxc_parser::Parser;
use oxc_span::SourceType;

use crate::error::AnalyzeError;

/// Maximum bracket nesting depth before we refuse to parse.
/// Prevents parser stack overflow on deeply nested input.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Check nesting depth of brackets/braces/parens BEFORE parsing.
pub fn check_nesting_depth(code: &str) -> Result<(), AnalyzeError> {
    let mut depth: usize = 0;
    let mut max_depth: usize = 0;
    for ch in code.chars() {
        match ch {
            '{' | '[' | '(' => {
                depth += 1;
                max_depth = max_depth.max(depth);
            }
            '}' | ']' | ')' => {
                depth = depth.saturating_sub(1);
            }
            _ => {}
        }
    }
    if max_depth > MAX_NESTING_DEPTH {
        return Err(AnalyzeError::NestingTooDeep {
            max: MAX_NESTING_DEPTH,
            actual: max_depth,
        });
    }
    Ok(())
}

/// Parse `source` as a script. The error is the first diagnostic's message.
pub(crate) fn parse_script<'a>(
    allocator: &'a Allocator,
    source: &'a str,
) -> Result<Program<'a>, String> {
    let source_type = SourceType::default().with_script(true);
    let ret = Parser::new(allocator, source, source_type).parse();

    if ret.panicked {
        return Err("parser panicked on malformed input".into());
    }
    if let Some(first) = ret.errors.first() {
        return Err(first.to_string());
    }
    Ok(ret.program)
}
