//! Flat binding collection.
//!
//! One forward pass records, for every declared name, what it was bound to.
//! There is no scoping: a name declared anywhere in the unit is visible
//! everywhere, and a later declaration overwrites an earlier one.

use std::collections::HashMap;

use oxc_ast::ast::*;

use crate::resolve::{literal_value, strip_parens};
use crate::value::Value;
use crate::walk::Node;

/// Upper bound on alias hops followed before a chain is considered cyclic.
const MAX_ALIAS_HOPS: usize = 64;

/// What a name was bound to.
#[derive(Debug, Clone)]
pub(crate) enum Binding<'t, 'a> {
    /// A literal initializer.
    Value(Value),
    /// Another identifier (`let x = require`, `{ y: require }`).
    Alias(String),
    /// Any other initializer, resolved on demand.
    Deferred(&'t Expression<'a>),
}

/// Name → binding, last write wins.
#[derive(Debug, Default)]
pub(crate) struct BindingTable<'t, 'a> {
    entries: HashMap<String, Binding<'t, 'a>>,
}

impl<'t, 'a> BindingTable<'t, 'a> {
    /// Build the table from a unit's flattened nodes.
    pub(crate) fn collect(nodes: &[Node<'t, 'a>]) -> Self {
        let mut table = Self::default();
        for node in nodes {
            match node {
                Node::Declarator(declarator) => table.record_declarator(declarator),
                Node::Object(object) => table.record_object(object),
                _ => {}
            }
        }
        table
    }

    fn record_declarator(&mut self, declarator: &'t VariableDeclarator<'a>) {
        let BindingPatternKind::BindingIdentifier(ident) = &declarator.id.kind else {
            return;
        };
        let binding = match &declarator.init {
            Some(init) => initializer_binding(init),
            // `var x;` never resets an existing value.
            None if matches!(declarator.kind, VariableDeclarationKind::Var) => return,
            None => Binding::Value(Value::Undefined),
        };
        self.entries.insert(ident.name.to_string(), binding);
    }

    fn record_object(&mut self, object: &'t ObjectExpression<'a>) {
        for prop in &object.properties {
            let ObjectPropertyKind::ObjectProperty(prop) = prop else {
                continue;
            };
            if prop.computed {
                continue;
            }
            let key = match &prop.key {
                PropertyKey::StaticIdentifier(id) => id.name.as_str(),
                PropertyKey::StringLiteral(lit) => lit.value.as_str(),
                _ => continue,
            };
            if let Expression::Identifier(value) = strip_parens(&prop.value) {
                self.entries
                    .insert(key.to_string(), Binding::Alias(value.name.to_string()));
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn get(&self, name: &str) -> Option<&Binding<'t, 'a>> {
        self.entries.get(name)
    }

    /// Like [`get`](Self::get), also lending the stored key.
    pub(crate) fn entry(&self, name: &str) -> Option<(&str, &Binding<'t, 'a>)> {
        self.entries
            .get_key_value(name)
            .map(|(key, binding)| (key.as_str(), binding))
    }

    /// Whether following `name`'s alias chain meets `target`. The chain
    /// starts at `name` itself, so `reaches("require", "require")` holds.
    pub(crate) fn reaches(&self, name: &str, target: &str) -> bool {
        let mut current = name;
        for _ in 0..MAX_ALIAS_HOPS {
            if current == target {
                return true;
            }
            match self.entries.get(current) {
                Some(Binding::Alias(next)) => current = next,
                _ => return false,
            }
        }
        false
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

fn initializer_binding<'t, 'a>(init: &'t Expression<'a>) -> Binding<'t, 'a> {
    let init = strip_parens(init);
    if let Some(value) = literal_value(init) {
        return Binding::Value(value);
    }
    match init {
        Expression::Identifier(ident) => Binding::Alias(ident.name.to_string()),
        other => Binding::Deferred(other),
    }
}
