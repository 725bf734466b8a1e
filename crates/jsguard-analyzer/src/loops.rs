//! Loop-termination analysis.
//!
//! A loop is reported when its test is truthy under the unit's binding
//! table, or when the test is a call whose result cannot be bounded. Names
//! the table does not know are `undefined`. Loop bodies are never inspected
//! for `break`, and iterations are never simulated.

use oxc_ast::ast::*;

use crate::error::AnalyzeError;
use crate::resolve::{strip_parens, Resolver};
use crate::value::Resolved;
use crate::walk::Node;

/// Whether any loop in the unit provably never terminates.
pub(crate) fn has_non_terminating_loop(
    nodes: &[Node<'_, '_>],
    resolver: &Resolver<'_, '_, '_>,
) -> Result<bool, AnalyzeError> {
    for node in nodes {
        let never_ends = match node {
            Node::While(stmt) => test_never_ends(&stmt.test, resolver)?,
            Node::DoWhile(stmt) => test_never_ends(&stmt.test, resolver)?,
            Node::For(stmt) => match &stmt.test {
                None => true,
                Some(test) => test_never_ends(test, resolver)?,
            },
            _ => false,
        };
        if never_ends {
            tracing::trace!("non-terminating loop");
            return Ok(true);
        }
    }
    Ok(false)
}

fn test_never_ends(
    test: &Expression<'_>,
    resolver: &Resolver<'_, '_, '_>,
) -> Result<bool, AnalyzeError> {
    match strip_parens(test) {
        Expression::CallExpression(_) | Expression::NewExpression(_) => Ok(true),
        Expression::ChainExpression(chain)
            if matches!(chain.expression, ChainElement::CallExpression(_)) =>
        {
            Ok(true)
        }
        other => Ok(matches!(resolver.resolve_loop_test(other)?, Resolved::Known(v) if v.truthy())),
    }
}
