//! Conservative value resolution.
//!
//! The resolver answers "what primitive does this expression evaluate to,
//! if that can be known without running anything?". Anything it cannot
//! prove becomes [`Resolved::Unknown`]; it never guesses.

use oxc_ast::ast::*;

use crate::bindings::{Binding, BindingTable};
use crate::error::AnalyzeError;
use crate::ops::{evaluate_unary, BinaryOp};
use crate::value::{Resolved, Value};

/// Past this many nested resolution steps the value is `Unknown`.
const MAX_RESOLVE_DEPTH: usize = 256;

/// Peel any number of redundant parentheses.
pub(crate) fn strip_parens<'t, 'a>(mut expr: &'t Expression<'a>) -> &'t Expression<'a> {
    while let Expression::ParenthesizedExpression(paren) = expr {
        expr = &paren.expression;
    }
    expr
}

/// The value of a plain literal. Template, BigInt and RegExp literals are
/// not plain.
pub(crate) fn literal_value(expr: &Expression<'_>) -> Option<Value> {
    match expr {
        Expression::StringLiteral(lit) => Some(Value::String(lit.value.to_string())),
        Expression::NumericLiteral(lit) => Some(Value::Number(lit.value)),
        Expression::BooleanLiteral(lit) => Some(Value::Bool(lit.value)),
        Expression::NullLiteral(_) => Some(Value::Null),
        _ => None,
    }
}

fn global_value(name: &str) -> Resolved {
    match name {
        "undefined" => Value::Undefined.into(),
        "NaN" => Resolved::number(f64::NAN),
        "Infinity" => Resolved::number(f64::INFINITY),
        _ => Resolved::Unknown,
    }
}

/// Resolves expressions of one unit against its binding table.
pub(crate) struct Resolver<'b, 't, 'a> {
    bindings: &'b BindingTable<'t, 'a>,
}

struct Trail<'b> {
    depth: usize,
    names: Vec<&'b str>,
    loop_test: bool,
}

impl<'b, 't, 'a> Resolver<'b, 't, 'a> {
    pub(crate) fn new(bindings: &'b BindingTable<'t, 'a>) -> Self {
        Self { bindings }
    }

    pub(crate) fn bindings(&self) -> &'b BindingTable<'t, 'a> {
        self.bindings
    }

    pub(crate) fn resolve(&self, expr: &Expression<'_>) -> Result<Resolved, AnalyzeError> {
        self.resolve_with(expr, false)
    }

    /// Resolve a loop test, where names with no binding take table values
    /// instead of `Unknown`.
    ///
    /// A name reached through an alias whose chain ends unbound stands for
    /// the last alias name itself (`let x = y; while (x)` tests `"y"`). A
    /// name with no binding at all is `undefined`.
    pub(crate) fn resolve_loop_test(
        &self,
        expr: &Expression<'_>,
    ) -> Result<Resolved, AnalyzeError> {
        self.resolve_with(expr, true)
    }

    fn resolve_with(&self, expr: &Expression<'_>, loop_test: bool) -> Result<Resolved, AnalyzeError> {
        let mut trail = Trail {
            depth: 0,
            names: Vec::new(),
            loop_test,
        };
        self.resolve_in(expr, &mut trail)
    }

    /// Resolve a call's first argument. `None` when the call has none.
    pub(crate) fn resolve_argument(
        &self,
        arg: Option<&Argument<'_>>,
    ) -> Result<Option<Resolved>, AnalyzeError> {
        let Some(arg) = arg else {
            return Ok(None);
        };
        match arg.as_expression() {
            Some(expr) => self.resolve(expr).map(Some),
            // Spread
            None => Ok(Some(Resolved::Unknown)),
        }
    }

    fn resolve_in(
        &self,
        expr: &Expression<'_>,
        trail: &mut Trail<'b>,
    ) -> Result<Resolved, AnalyzeError> {
        if trail.depth >= MAX_RESOLVE_DEPTH {
            return Ok(Resolved::Unknown);
        }
        trail.depth += 1;
        let result = self.resolve_shape(strip_parens(expr), trail);
        trail.depth -= 1;
        result
    }

    fn resolve_shape(
        &self,
        expr: &Expression<'_>,
        trail: &mut Trail<'b>,
    ) -> Result<Resolved, AnalyzeError> {
        if let Some(value) = literal_value(expr) {
            return Ok(value.into());
        }
        match expr {
            Expression::Identifier(ident) => self.resolve_name(ident.name.as_str(), false, trail),
            Expression::TemplateLiteral(template) => self.resolve_template(template, trail),
            Expression::BinaryExpression(bin) => {
                let op = BinaryOp::from_symbol(bin.operator.as_str())?;
                let left = self.resolve_in(&bin.left, trail)?;
                let right = self.resolve_in(&bin.right, trail)?;
                Ok(match (left, right) {
                    (Resolved::Known(l), Resolved::Known(r)) => op.apply(&l, &r),
                    _ => Resolved::Unknown,
                })
            }
            Expression::LogicalExpression(logical) => {
                let op = BinaryOp::from_symbol(logical.operator.as_str())?;
                let Resolved::Known(left) = self.resolve_in(&logical.left, trail)? else {
                    return Ok(Resolved::Unknown);
                };
                if let Some(decided) = op.short_circuit(&left) {
                    return Ok(decided.into());
                }
                self.resolve_in(&logical.right, trail)
            }
            Expression::UnaryExpression(unary) => {
                let operator = unary.operator.as_str();
                match self.resolve_in(&unary.argument, trail)? {
                    Resolved::Known(v) => evaluate_unary(operator, &v),
                    Resolved::Unknown => Ok(Resolved::Unknown),
                }
            }
            _ => Ok(Resolved::Unknown),
        }
    }

    fn resolve_name(
        &self,
        name: &str,
        aliased: bool,
        trail: &mut Trail<'b>,
    ) -> Result<Resolved, AnalyzeError> {
        let Some((key, binding)) = self.bindings.entry(name) else {
            return Ok(match global_value(name) {
                Resolved::Unknown if trail.loop_test && aliased => Resolved::string(name),
                Resolved::Unknown if trail.loop_test => Value::Undefined.into(),
                known => known,
            });
        };
        if trail.names.contains(&key) {
            return Ok(Resolved::Unknown);
        }
        trail.names.push(key);
        let result = match binding {
            Binding::Value(v) => Ok(v.clone().into()),
            Binding::Alias(target) => self.resolve_name(target, true, trail),
            Binding::Deferred(expr) => self.resolve_in(expr, trail),
        };
        trail.names.pop();
        result
    }

    fn resolve_template(
        &self,
        template: &TemplateLiteral<'_>,
        trail: &mut Trail<'b>,
    ) -> Result<Resolved, AnalyzeError> {
        let mut out = String::new();
        for (i, quasi) in template.quasis.iter().enumerate() {
            let Some(cooked) = &quasi.value.cooked else {
                return Ok(Resolved::Unknown);
            };
            out.push_str(cooked.as_str());
            if let Some(expr) = template.expressions.get(i) {
                match self.resolve_in(expr, trail)? {
                    Resolved::Known(v) => out.push_str(&v.to_js_string()),
                    Resolved::Unknown => return Ok(Resolved::Unknown),
                }
            }
        }
        Ok(Resolved::string(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::parse;
    use crate::walk::collect_nodes;
    use oxc_allocator::Allocator;

    /// Resolve the expression of the last statement in `code`.
    fn resolve_last(code: &str) -> Result<Resolved, AnalyzeError> {
        let allocator = Allocator::default();
        let program = parse(&allocator, code);
        let nodes = collect_nodes(&program).unwrap();
        let bindings = BindingTable::collect(&nodes);
        let resolver = Resolver::new(&bindings);
        let Some(Statement::ExpressionStatement(last)) = program.body.last() else {
            panic!("last statement of {code:?} is not an expression");
        };
        resolver.resolve(&last.expression)
    }

    fn known(code: &str) -> Value {
        match resolve_last(code).unwrap() {
            Resolved::Known(v) => v,
            Resolved::Unknown => panic!("{code:?} resolved to Unknown"),
        }
    }

    fn s(v: &str) -> Value {
        Value::String(v.into())
    }

    #[test]
    fn resolves_literals() {
        assert_eq!(known("'fs';"), s("fs"));
        assert_eq!(known("42;"), Value::Number(42.0));
        assert_eq!(known("true;"), Value::Bool(true));
        assert_eq!(known("null;"), Value::Null);
        assert_eq!(known("((('x')));"), s("x"));
    }

    #[test]
    fn resolves_concatenation_through_bindings() {
        assert_eq!(known("'f' + 's';"), s("fs"));
        assert_eq!(known("'p' + 'at' + 'h';"), s("path"));
        assert_eq!(known("let x = 'f'; let y = 's'; x + y;"), s("fs"));
        assert_eq!(known("let x = 'f' + 's'; let y = x; y;"), s("fs"));
    }

    #[test]
    fn resolves_templates() {
        assert_eq!(known("let m = 'fs'; `node:${m}`;"), s("node:fs"));
        assert_eq!(known("`a${1 + 1}b`;"), s("a2b"));
        assert_eq!(resolve_last("`${f()}`;").unwrap(), Resolved::Unknown);
    }

    #[test]
    fn resolves_logical_and_unary() {
        assert_eq!(known("'' || 'os';"), s("os"));
        assert_eq!(known("0 && f();"), Value::Number(0.0));
        assert_eq!(known("!0;"), Value::Bool(true));
        assert_eq!(known("typeof 'x';"), s("string"));
        assert_eq!(known("void 0;"), Value::Undefined);
    }

    #[test]
    fn logical_with_unknown_left_is_unknown() {
        assert_eq!(resolve_last("f() || 'os';").unwrap(), Resolved::Unknown);
    }

    #[test]
    fn resolves_globals_unless_shadowed() {
        assert_eq!(known("undefined;"), Value::Undefined);
        assert!(matches!(known("NaN;"), Value::Number(n) if n.is_nan()));
        assert_eq!(known("function f() { var undefined = 'x'; } undefined;"), s("x"));
        assert_eq!(resolve_last("process;").unwrap(), Resolved::Unknown);
    }

    #[test]
    fn calls_and_other_shapes_are_unknown() {
        assert_eq!(resolve_last("f();").unwrap(), Resolved::Unknown);
        assert_eq!(resolve_last("'FS'.toLowerCase();").unwrap(), Resolved::Unknown);
        assert_eq!(resolve_last("a.b;").unwrap(), Resolved::Unknown);
        assert_eq!(resolve_last("1n;").unwrap(), Resolved::Unknown);
        assert_eq!(resolve_last("x + 'y';").unwrap(), Resolved::Unknown);
    }

    #[test]
    fn cyclic_bindings_are_unknown() {
        assert_eq!(resolve_last("let a = b + 1; let b = a + 1; a;").unwrap(), Resolved::Unknown);
        assert_eq!(resolve_last("let a = b; let b = a; a;").unwrap(), Resolved::Unknown);
    }

    #[test]
    fn argument_resolution() {
        let allocator = Allocator::default();
        let program = parse(&allocator, "g('a'); g(...xs); g();");
        let nodes = collect_nodes(&program).unwrap();
        let bindings = BindingTable::collect(&nodes);
        let resolver = Resolver::new(&bindings);
        let firsts: Vec<_> = nodes
            .iter()
            .filter_map(|node| match node {
                crate::walk::Node::Call(call) => Some(call),
                _ => None,
            })
            .map(|call| resolver.resolve_argument(call.arguments.first()).unwrap())
            .collect();
        assert_eq!(
            firsts,
            vec![Some(Resolved::string("a")), Some(Resolved::Unknown), None]
        );
    }
}
