//! Call-site classifiers.

use oxc_ast::ast::*;

use crate::error::AnalyzeError;
use crate::resolve::{strip_parens, Resolver};
use crate::value::{Resolved, Value};

/// The module-loading primitive.
pub const IMPORT_PRIMITIVE: &str = "require";

/// The dynamic-evaluation primitive.
pub const EVAL_PRIMITIVE: &str = "eval";

/// The callee of a call, reduced to the shapes the classifiers distinguish.
#[derive(Debug)]
enum CalleeShape<'t, 'a> {
    /// `f(...)`
    Name(&'t str),
    /// `x.f(...)`
    Property(&'t str),
    /// `x[expr](...)`
    Computed(&'t Expression<'a>),
    Other,
}

impl<'t, 'a> CalleeShape<'t, 'a> {
    fn of(callee: &'t Expression<'a>) -> Self {
        match strip_parens(callee) {
            Expression::Identifier(ident) => Self::Name(ident.name.as_str()),
            Expression::StaticMemberExpression(member) => {
                Self::Property(member.property.name.as_str())
            }
            Expression::ComputedMemberExpression(member) => Self::Computed(&member.expression),
            _ => Self::Other,
        }
    }
}

/// Whether `call` loads a module: the callee, a property name, or a
/// computed property that resolves to a string, leads to `require` through
/// the alias chain.
pub(crate) fn is_import_call(
    call: &CallExpression<'_>,
    resolver: &Resolver<'_, '_, '_>,
) -> Result<bool, AnalyzeError> {
    let bindings = resolver.bindings();
    let matched = match CalleeShape::of(&call.callee) {
        CalleeShape::Name(name) | CalleeShape::Property(name) => {
            bindings.reaches(name, IMPORT_PRIMITIVE)
        }
        CalleeShape::Computed(property) => match resolver.resolve(property)? {
            Resolved::Known(Value::String(name)) => bindings.reaches(&name, IMPORT_PRIMITIVE),
            _ => false,
        },
        CalleeShape::Other => false,
    };
    Ok(matched)
}

/// Whether `call` is a literal `eval(...)`. Aliases of `eval` are not
/// followed.
pub(crate) fn is_eval_call(call: &CallExpression<'_>) -> bool {
    matches!(CalleeShape::of(&call.callee), CalleeShape::Name(EVAL_PRIMITIVE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::BindingTable;
    use crate::testing::parse;
    use crate::walk::{collect_nodes, Node};
    use oxc_allocator::Allocator;

    /// Classify every call in `code`, in source order.
    fn classify(code: &str) -> Vec<(bool, bool)> {
        let allocator = Allocator::default();
        let program = parse(&allocator, code);
        let nodes = collect_nodes(&program).unwrap();
        let bindings = BindingTable::collect(&nodes);
        let resolver = Resolver::new(&bindings);
        nodes
            .iter()
            .filter_map(|node| match node {
                Node::Call(call) => Some((
                    is_import_call(call, &resolver).unwrap(),
                    is_eval_call(call),
                )),
                _ => None,
            })
            .collect()
    }

    fn imports(code: &str) -> bool {
        classify(code).iter().any(|(import, _)| *import)
    }

    #[test]
    fn direct_require() {
        assert!(imports("require('fs');"));
        assert!(imports("(require)('fs');"));
        assert!(imports("require?.('fs');"));
    }

    #[test]
    fn aliased_require() {
        assert!(imports("let x = require; x('fs');"));
        assert!(imports("let x = require; let y = x; y('fs');"));
        assert!(imports("let x = { y: require }; x.y('fs');"));
        assert!(imports("let x = { y: require }; x['y']('fs');"));
        assert!(imports("let x = { y: require }; let k = 'y'; x[k]('fs');"));
        assert!(imports("module.require('fs');"));
    }

    #[test]
    fn unrelated_calls() {
        assert!(!imports("console.log('fs');"));
        assert!(!imports("let x = { y: f }; x.y('fs');"));
        assert!(!imports("x[f()]('fs');"));
        assert!(!imports("requireSomething('fs');"));
    }

    #[test]
    fn eval_is_literal_only() {
        assert_eq!(classify("eval('1');"), vec![(false, true)]);
        assert_eq!(classify("let e = eval; e('1');"), vec![(false, false)]);
        assert_eq!(classify("window.eval('1');"), vec![(false, false)]);
    }
}
