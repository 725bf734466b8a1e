//! Forbidden-import detection.

use std::collections::BTreeSet;

use crate::classify::is_import_call;
use crate::error::AnalyzeError;
use crate::resolve::Resolver;
use crate::value::Resolved;
use crate::walk::Node;

/// Reported for an import whose module name cannot be decided statically.
/// Always denied.
pub const UNKNOWN_MODULE: &str = "unknown";

/// Capability modules denied under every spelling.
pub const BASE_DENIED_MODULES: [&str; 12] = [
    "fs",
    "child_process",
    "path",
    "os",
    "http",
    "https",
    "net",
    "tls",
    "dns",
    "url",
    "util",
    "vm",
];

/// Set of module names a snippet may not import. Matching is exact and
/// case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenyList {
    names: BTreeSet<String>,
}

impl Default for DenyList {
    /// Every base module as `x`, `x/promises`, `node:x` and
    /// `node:x/promises`, plus [`UNKNOWN_MODULE`].
    fn default() -> Self {
        let mut names = BTreeSet::new();
        for base in BASE_DENIED_MODULES {
            names.insert(base.to_string());
            names.insert(format!("{base}/promises"));
            names.insert(format!("node:{base}"));
            names.insert(format!("node:{base}/promises"));
        }
        names.insert(UNKNOWN_MODULE.to_string());
        Self { names }
    }
}

impl DenyList {
    /// Add names on top of the current list. Names can never be removed.
    pub fn with_extra<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(extra.into_iter().map(Into::into));
        self
    }

    /// Whether importing `name` is forbidden.
    pub fn is_denied(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of denied names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false: the sentinel is always present.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Denied names in lexical order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Names of denied modules imported by the unit, in source order.
pub(crate) fn forbidden_imports(
    nodes: &[Node<'_, '_>],
    resolver: &Resolver<'_, '_, '_>,
    deny: &DenyList,
) -> Result<Vec<String>, AnalyzeError> {
    let mut forbidden = Vec::new();
    for node in nodes {
        let requested = match node {
            Node::Call(call) if is_import_call(call, resolver)? => {
                resolver.resolve_argument(call.arguments.first())?
            }
            Node::Import(import) => Some(resolver.resolve(&import.source)?),
            _ => None,
        };
        let Some(requested) = requested else {
            continue;
        };
        let name = match requested {
            Resolved::Known(value) => value.to_js_string(),
            Resolved::Unknown => UNKNOWN_MODULE.to_string(),
        };
        if deny.is_denied(&name) {
            tracing::trace!(module = %name, "denied import");
            forbidden.push(name);
        }
    }
    Ok(forbidden)
}
