use crate::{
    binder::{Binding, Bindings},
    front_end::Path,
};

#[derive(Clone, Debug, PartialEq)]
pub enum Object {
    Bound(Binding),
    /// `prefix:Class` of a type assertion.
    Class(String),
    /// The field's own value, at a literal terminal.
    Value,
}

/// One edge of a bound path, independent of the output syntax.
#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    pub subject: Binding,
    /// `prefix:name`, or `a` for type assertions.
    pub predicate: String,
    pub object: Object,
}

impl Statement {
    pub fn is_type_assertion(&self) -> bool {
        self.predicate == "a"
    }
}

/// Walks the path from token `start`, in token order: a relation links the
/// entities around it, and every entity that is neither literal nor
/// constant gets its type.
pub fn statements(path: &Path, bindings: &Bindings, start: usize) -> Vec<Statement> {
    let mut out = vec![];
    for (idx, token) in path.tokens().iter().enumerate().skip(start) {
        let position = idx as i32;
        if idx % 2 == 0 {
            let object = match path.get(idx + 1) {
                Some(next) if next.is_literal() => Object::Value,
                _ => Object::Bound(bindings.at(position + 1).clone()),
            };
            out.push(Statement {
                subject: bindings.at(position - 1).clone(),
                predicate: token.qname(),
                object,
            });
        } else {
            let binding = bindings.at(position);
            if token.is_literal() || binding.is_constant() {
                continue;
            }
            out.push(Statement {
                subject: binding.clone(),
                predicate: String::from("a"),
                object: Object::Class(token.qname()),
            });
        }
    }
    out
}
