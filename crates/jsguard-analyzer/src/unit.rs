//! Per-unit analysis and recursion into evaluated strings.
//!
//! A unit is the top-level snippet or one string it passes to `eval`. Each
//! unit gets its own allocator, AST and binding table; nothing from an outer
//! unit is visible inside a nested one.

use oxc_allocator::Allocator;

use crate::bindings::BindingTable;
use crate::classify::is_eval_call;
use crate::error::AnalyzeError;
use crate::imports::{forbidden_imports, UNKNOWN_MODULE};
use crate::loops::has_non_terminating_loop;
use crate::parse::{check_nesting_depth, parse_script};
use crate::resolve::Resolver;
use crate::value::{Resolved, Value};
use crate::walk::{collect_nodes, Node};
use crate::AnalyzerOptions;

/// Policy findings of a unit and everything nested inside it.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Findings {
    pub(crate) non_terminating: bool,
    pub(crate) forbidden: Vec<String>,
}

impl Findings {
    fn non_terminating() -> Self {
        Self {
            non_terminating: true,
            forbidden: Vec::new(),
        }
    }

    fn merge(&mut self, nested: Findings) {
        self.non_terminating |= nested.non_terminating;
        self.forbidden.extend(nested.forbidden);
    }
}

/// Why a unit produced no findings.
#[derive(Debug)]
pub(crate) enum Halt {
    /// The unit or a nested unit does not parse.
    Syntax(String),
    Error(AnalyzeError),
}

impl From<AnalyzeError> for Halt {
    fn from(err: AnalyzeError) -> Self {
        Self::Error(err)
    }
}

/// What an `eval` call would evaluate.
enum EvalSource {
    Code(String),
    /// Not statically known; treated as importing an unknown module.
    Opaque,
}

pub(crate) fn analyze_unit(
    source: &str,
    depth: usize,
    options: &AnalyzerOptions,
) -> Result<Findings, Halt> {
    check_nesting_depth(source)?;

    let allocator = Allocator::default();
    let program = parse_script(&allocator, source).map_err(Halt::Syntax)?;
    let nodes = collect_nodes(&program)?;
    let bindings = BindingTable::collect(&nodes);
    let resolver = Resolver::new(&bindings);

    if has_non_terminating_loop(&nodes, &resolver)? {
        return Ok(Findings::non_terminating());
    }

    let mut findings = Findings {
        non_terminating: false,
        forbidden: forbidden_imports(&nodes, &resolver, &options.deny_list)?,
    };

    for eval in eval_sources(&nodes, &resolver)? {
        match eval {
            EvalSource::Opaque => findings.forbidden.push(UNKNOWN_MODULE.to_string()),
            EvalSource::Code(_) if depth >= options.max_eval_depth => {
                tracing::debug!(depth, max = options.max_eval_depth, "eval nesting too deep");
                return Ok(Findings::non_terminating());
            }
            EvalSource::Code(code) => {
                let nested = analyze_unit(&code, depth + 1, options).map_err(|halt| match halt {
                    Halt::Syntax(msg) => Halt::Syntax(format!("in eval'd string: {msg}")),
                    other => other,
                })?;
                findings.merge(nested);
                if findings.non_terminating {
                    return Ok(findings);
                }
            }
        }
    }

    Ok(findings)
}

fn eval_sources(
    nodes: &[Node<'_, '_>],
    resolver: &Resolver<'_, '_, '_>,
) -> Result<Vec<EvalSource>, AnalyzeError> {
    let mut sources = Vec::new();
    for node in nodes {
        let Node::Call(call) = node else {
            continue;
        };
        if !is_eval_call(call) {
            continue;
        }
        match resolver.resolve_argument(call.arguments.first())? {
            Some(Resolved::Known(Value::String(code))) => sources.push(EvalSource::Code(code)),
            Some(Resolved::Unknown) => sources.push(EvalSource::Opaque),
            // eval of a non-string returns it unchanged
            Some(Resolved::Known(_)) | None => {}
        }
    }
    Ok(sources)
}
