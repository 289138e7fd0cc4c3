use super::{Namespaces, CRM, RDF};
use crate::{
    binder::{Binding, Bindings},
    front_end::Path,
    pattern::{statements, Object},
    tools::file_stem,
};
use itertools::Itertools;
use std::{collections::BTreeSet, fmt};

pub const DEFAULT_BASE: &str = "https://linked.art/example/";

/// Example instance data for a field: every variable becomes an IRI under
/// `base`, and a literal terminal becomes `"<System_Name>_value"`.
#[derive(Clone, Debug, PartialEq)]
pub struct Turtle {
    prefixes: Namespaces,
    /// `(subject, predicate, object)` in emission order.
    triples: Vec<(String, String, String)>,
}

impl Turtle {
    pub fn new(
        path: &Path,
        bindings: &Bindings,
        system_name: &str,
        namespaces: &Namespaces,
        base: &str,
    ) -> Self {
        let mut prefixes = namespaces.clone();
        prefixes.add("crm", CRM);
        prefixes.add("rdf", RDF);
        let node = |binding: &Binding| match binding {
            Binding::Constant(iri) => format!("<{}>", iri),
            other => format!("<{}{}>", base, other),
        };
        let triples = statements(path, bindings, 0)
            .into_iter()
            .map(|statement| {
                let object = match &statement.object {
                    Object::Bound(binding) => node(binding),
                    Object::Class(class) => class.clone(),
                    Object::Value => format!("\"{}_value\"", file_stem(system_name)),
                };
                (node(&statement.subject), statement.predicate, object)
            })
            .collect();
        Self { prefixes, triples }
    }

    pub fn triples(&self) -> &[(String, String, String)] {
        &self.triples
    }

    /// IRIs used as subject or object.
    pub fn nodes(&self) -> BTreeSet<&str> {
        self.triples
            .iter()
            .flat_map(|(s, _, o)| vec![s.as_str(), o.as_str()])
            .filter(|n| n.starts_with('<'))
            .collect()
    }
}

impl fmt::Display for Turtle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (prefix, namespace) in self.prefixes.iter() {
            writeln!(f, "@prefix {}: <{}> .", prefix, namespace)?;
        }
        let subjects = self.triples.iter().map(|(s, _, _)| s).unique();
        for subject in subjects {
            writeln!(f)?;
            let predicates = self
                .triples
                .iter()
                .filter(|(s, _, _)| s == subject)
                .map(|(_, p, _)| p)
                .unique()
                .sorted_by_key(|p| *p != "a")
                .map(|predicate| {
                    let objects = self
                        .triples
                        .iter()
                        .filter(|(s, p, _)| s == subject && p == predicate)
                        .map(|(_, _, o)| o.as_str())
                        .unique()
                        .join(",\n        ");
                    format!("{} {}", predicate, objects)
                })
                .join(" ;\n    ");
            writeln!(f, "{} {} .", subject, predicates)?;
        }
        Ok(())
    }
}
